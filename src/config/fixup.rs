//! `[fixup]` section configuration.
//!
//! Controls how the clone fix-up reacts when the templates found in a source
//! subtree and in its native copy do not line up.

use educe::Educe;
use serde::{Deserialize, Serialize};

/// What to do when source and clone template lists differ in length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MismatchPolicy {
    /// Repair the pairs both lists share and log the rest.
    #[default]
    BestEffort,
    /// Fail the clone with `TemplateError::CloneMismatch`.
    Strict,
}

/// `[fixup]` section in inert.toml.
///
/// # Example
/// ```toml
/// [fixup]
/// on_mismatch = "strict"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct FixupConfig {
    #[serde(default)]
    pub on_mismatch: MismatchPolicy,
}

#[cfg(test)]
mod tests {
    use super::super::InertConfig;
    use super::MismatchPolicy;

    #[test]
    fn test_fixup_config() {
        let config = r#"
            [fixup]
            on_mismatch = "strict"
        "#;
        let config: InertConfig = toml::from_str(config).unwrap();
        assert_eq!(config.fixup.on_mismatch, MismatchPolicy::Strict);
    }

    #[test]
    fn test_fixup_config_defaults() {
        let config: InertConfig = toml::from_str("[fixup]").unwrap();
        assert_eq!(config.fixup.on_mismatch, MismatchPolicy::BestEffort);
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let config = r#"
            [fixup]
            on_mismatch = "ignore"
        "#;
        assert!(toml::from_str::<InertConfig>(config).is_err());
    }
}
