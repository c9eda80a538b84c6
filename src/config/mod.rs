//! Configuration for the template layer, usually kept in `inert.toml`.
//!
//! # Sections
//!
//! | Key / Section | Purpose                                          |
//! |---------------|--------------------------------------------------|
//! | `tag`         | Element name that carries inert content          |
//! | `[fixup]`     | Clone fix-up policy for mismatched template lists |
//! | `[log]`       | Diagnostic output                                |
//!
//! # Example
//!
//! ```toml
//! tag = "template"
//!
//! [fixup]
//! on_mismatch = "best-effort"
//!
//! [log]
//! enable = false
//! ```

pub mod defaults;
mod error;
mod fixup;
mod log;

pub use error::ConfigError;
pub use fixup::{FixupConfig, MismatchPolicy};
pub use log::LogConfig;

use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing inert.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct InertConfig {
    /// Lowercase element name treated as an isolated-content instance.
    #[serde(default = "defaults::tag")]
    #[educe(Default = defaults::tag())]
    pub tag: String,

    /// Clone fix-up settings
    #[serde(default)]
    pub fixup: FixupConfig,

    /// Diagnostic output settings
    #[serde(default)]
    pub log: LogConfig,
}

impl InertConfig {
    /// Parse configuration from TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: InertConfig = toml::from_str(content).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.tag.is_empty() {
            bail!(ConfigError::Validation("`tag` must not be empty".into()));
        }

        if !is_valid_tag(&self.tag) {
            bail!(ConfigError::Validation(format!(
                "`tag` must be a lowercase element name, got `{}`",
                self.tag
            )));
        }

        Ok(())
    }
}

/// `[a-z][a-z0-9-]*`
fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = InertConfig::default();
        assert_eq!(config.tag, "template");
        assert_eq!(config.fixup.on_mismatch, MismatchPolicy::BestEffort);
        assert!(!config.log.enable);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_string_is_default() {
        let config = InertConfig::from_str("").unwrap();
        assert_eq!(config.tag, "template");
    }

    #[test]
    fn test_full_config() {
        let config = InertConfig::from_str(
            r#"
            tag = "x-inert"

            [fixup]
            on_mismatch = "strict"

            [log]
            enable = true
        "#,
        )
        .unwrap();
        assert_eq!(config.tag, "x-inert");
        assert_eq!(config.fixup.on_mismatch, MismatchPolicy::Strict);
        assert!(config.log.enable);
    }

    #[test]
    fn test_is_valid_tag() {
        assert!(is_valid_tag("template"));
        assert!(is_valid_tag("x-inert2"));
        assert!(!is_valid_tag(""));
        assert!(!is_valid_tag("Template"));
        assert!(!is_valid_tag("2col"));
        assert!(!is_valid_tag("my tag"));
    }

    #[test]
    fn test_invalid_tag_rejected() {
        let err = InertConfig::from_str("tag = \"Bad Tag\"").unwrap_err();
        let err = err.downcast::<ConfigError>().unwrap();
        assert!(matches!(err, ConfigError::Validation(_)));

        assert!(InertConfig::from_str("tag = \"\"").is_err());
    }

    #[test]
    fn test_unknown_top_level_key_rejected() {
        let err = InertConfig::from_str("tags = \"template\"").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[fixup]\non_mismatch = \"strict\"").unwrap();

        let config = InertConfig::from_path(file.path()).unwrap();
        assert_eq!(config.fixup.on_mismatch, MismatchPolicy::Strict);
    }

    #[test]
    fn test_from_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = InertConfig::from_path(&dir.path().join("inert.toml")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Io(..))
        ));
    }
}
