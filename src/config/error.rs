//! Errors raised while loading `inert.toml`.

use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read `{path}`: {1}", path = .0.display())]
    Io(PathBuf, #[source] io::Error),

    /// Syntax errors, unknown keys and wrongly typed values, with the TOML
    /// diagnostic (line, column, snippet) kept in the message.
    #[error("invalid inert.toml: {0}")]
    Toml(#[from] toml::de::Error),

    /// Well-formed TOML carrying an unusable value.
    #[error("invalid inert.toml: {0}")]
    Validation(String),
}
