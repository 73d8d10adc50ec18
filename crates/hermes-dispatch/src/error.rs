//! Error types for the event log and dispatch setup.

use thiserror::Error;

/// Result type for event log operations.
pub type LogResult<T> = Result<T, LogError>;

/// Errors reported by an [`EventLog`](crate::EventLog).
#[derive(Debug, Error)]
pub enum LogError {
    /// The log could not be reached or did not acknowledge in time.
    #[error("event log unavailable: {0}")]
    Unavailable(String),

    /// The log refused the event (e.g. payload too large).
    #[error("event rejected by log: {0}")]
    Rejected(String),

    /// Any other backend failure.
    #[error("event log backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl LogError {
    /// Create an unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }

    /// Create a rejected error.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }

    /// Check if another attempt could succeed.
    pub fn should_retry(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Backend(_))
    }
}

/// A call's dispatch mode and the handler supplied at registration disagree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    /// `SyncOnly` and `SyncAndLog` calls need a handler.
    #[error("call '{call}' invokes a handler but none was registered")]
    MissingHandler {
        /// Full call name.
        call: String,
    },

    /// `LogOnly` calls are applied by consumers, not by a handler.
    #[error("call '{call}' is log-only and must be registered without a handler")]
    UnexpectedHandler {
        /// Full call name.
        call: String,
    },
}

/// Errors raised while draining a topic with an
/// [`EventConsumer`](crate::EventConsumer).
#[derive(Debug, Error)]
pub enum ConsumeError {
    /// Reading from the log failed.
    #[error(transparent)]
    Log(#[from] LogError),

    /// The materializer failed on an event; the cursor stays before it.
    #[error("failed to apply event {sequence} of topic '{topic}'")]
    Apply {
        /// Topic of the event.
        topic: String,
        /// Sequence of the event.
        sequence: u64,
        /// What the materializer reported.
        #[source]
        source: anyhow::Error,
    },
}
