//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while assembling a [`HermesConfig`](crate::HermesConfig).
///
/// Every variant is a boot-time failure: a service that cannot load its
/// configuration never starts serving calls.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required configuration file does not exist.
    #[error("no configuration at {}", path.display())]
    Missing {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The configuration file exists but could not be read.
    #[error("cannot read configuration at {}", path.display())]
    Unreadable {
        /// Path of the file.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Neither TOML nor JSON.
    #[error("unsupported configuration format `{0}` (expected toml or json)")]
    UnsupportedFormat(String),

    /// Malformed TOML, including unknown keys.
    #[error("malformed TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed JSON, including unknown keys.
    #[error("malformed JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A `.env` file is present but unparsable.
    #[error("unusable .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),

    /// A loaded value is out of range.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted path of the offending key, e.g. `dispatch.retry.multiplier`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An environment override could not be applied.
    #[error("environment override {var} rejected: {reason}")]
    EnvOverride {
        /// Variable name.
        var: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn missing(path: impl Into<PathBuf>) -> Self {
        Self::Missing { path: path.into() }
    }

    pub(crate) fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Unreadable {
            path: path.into(),
            source,
        }
    }

    /// Creates an [`InvalidValue`](Self::InvalidValue) error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn env_override(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvOverride {
            var: var.into(),
            reason: reason.into(),
        }
    }
}
