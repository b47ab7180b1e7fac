use std::path::PathBuf;
use thiserror::Error;

use super::convert::ConversionKind;

/// Boxed error produced by conversion handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse JSON config file '{path}': {source}")]
    JsonError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to parse TOML config file '{path}': {source}")]
    TomlError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("config document root is not an object: {0}")]
    RootNotMapping(PathBuf),

    #[error("no conversion handler registered for kind '{0}'")]
    UnknownConversionKind(ConversionKind),

    #[error("failed to convert value to '{kind}': {source}")]
    ConversionTypeError {
        kind: ConversionKind,
        source: BoxError,
    },

    #[error("failed to deserialize value at '{path}': {source}")]
    DeserializeError {
        path: String,
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// Returns `true` if the error was raised while obtaining the document.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound(_)
                | Self::ReadError { .. }
                | Self::JsonError { .. }
                | Self::TomlError { .. }
                | Self::RootNotMapping(_)
        )
    }
}
