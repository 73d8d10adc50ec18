//! Gateway table errors.

use thiserror::Error;

/// Errors raised while exporting or loading a route table.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The table is not valid JSON of the expected shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A route prefix is not an absolute path.
    #[error("invalid route prefix '{prefix}': must start with '/'")]
    InvalidPrefix {
        /// The offending prefix.
        prefix: String,
    },
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
