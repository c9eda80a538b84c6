//! `[log]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[log]` section in inert.toml - diagnostic output.
///
/// # Example
/// ```toml
/// [log]
/// enable = true
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Print decoration and fix-up diagnostics to stderr.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub enable: bool,
}

#[cfg(test)]
mod tests {
    use super::super::InertConfig;

    #[test]
    fn test_log_config() {
        let config: InertConfig = toml::from_str("[log]\nenable = true").unwrap();
        assert!(config.log.enable);

        let config: InertConfig = toml::from_str("").unwrap();
        assert!(!config.log.enable);
    }

    #[test]
    fn test_unknown_field_rejection() {
        let config = r#"
            [log]
            enable = true
            level = "debug"
        "#;
        assert!(toml::from_str::<InertConfig>(config).is_err());
    }
}
