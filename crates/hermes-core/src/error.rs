//! Error types for Hermes.
//!
//! [`CallError`] is the single taxonomy every stage of request handling
//! reports into:
//!
//! | Variant | Raised by | Status |
//! |---|---|---|
//! | `RouteNotFound` | router | 404 |
//! | `MethodNotAllowed` | router | 405 |
//! | `Decode` | binding resolver | 400 |
//! | `AuthDenied` | auth gate | 401 / 403 |
//! | `Dispatch(PublishFailed)` | dispatcher | 503 |
//! | `Dispatch(HandlerFailed)` | handler | handler-chosen |
//! | `Dispatch(TimedOut)` | dispatcher | 504 |
//! | `Internal` | anything else | 500 |
//!
//! Everything up to and including `AuthDenied` is detected before any handler
//! runs or any event is published. `HandlerFailed` is the only variant whose
//! body is the call's declared error shape rather than the framework
//! envelope.

use std::fmt;

use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`CallError`].
pub type CallResult<T> = Result<T, CallError>;

/// Categories of errors for classification and status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Request could not be decoded.
    Validation,
    /// Caller is not authenticated.
    Authentication,
    /// Caller lacks the required right or context.
    Authorization,
    /// No call is bound to the path.
    NotFound,
    /// The path exists, the method does not.
    MethodNotAllowed,
    /// The event log could not accept the request.
    Unavailable,
    /// The request deadline elapsed.
    Timeout,
    /// The handler reported a declared error.
    Handler,
    /// Anything else.
    Internal,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Authorization => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Handler | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Why a request could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecodeReason {
    /// A value could not be coerced into the field's kind.
    TypeMismatch,
    /// A required field is absent.
    Missing,
    /// The body (or the merged request) does not parse.
    Malformed,
}

impl fmt::Display for DecodeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TypeMismatch => "type mismatch",
            Self::Missing => "missing",
            Self::Malformed => "malformed",
        })
    }
}

/// A request that failed to decode against its call description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeError {
    /// The request field at fault, when one can be named.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Failure class.
    pub reason: DecodeReason,
    /// Human-readable detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl DecodeError {
    /// A required field is absent.
    #[must_use]
    pub fn missing(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            reason: DecodeReason::Missing,
            detail: None,
        }
    }

    /// A value does not coerce into the field's kind.
    #[must_use]
    pub fn type_mismatch(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            reason: DecodeReason::TypeMismatch,
            detail: Some(detail.into()),
        }
    }

    /// The request does not parse.
    #[must_use]
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self {
            field: None,
            reason: DecodeReason::Malformed,
            detail: Some(detail.into()),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bad request")?;
        if let Some(field) = &self.field {
            write!(f, ": field '{field}' is {}", self.reason)?;
        } else {
            write!(f, ": body is {}", self.reason)?;
        }
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

impl std::error::Error for DecodeError {}

/// Why the auth gate denied a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenyReason {
    /// No principal was resolved for a non-public call.
    #[error("Unauthorized")]
    Unauthenticated,
    /// The principal lacks the right, role or scope the call needs.
    #[error("Forbidden")]
    InsufficientRight,
    /// The call needs a project and none was resolved.
    #[error("Forbidden: missing project")]
    MissingProject,
}

impl DenyReason {
    /// Returns the HTTP status code for this denial.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::InsufficientRight | Self::MissingProject => StatusCode::FORBIDDEN,
        }
    }
}

/// Failures of the dispatch stage.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchFailure {
    /// The event could not be appended to the log. The operation is not committed.
    #[error("publish to topic '{topic}' failed after {attempts} attempt(s): {reason}")]
    PublishFailed {
        /// Target topic.
        topic: String,
        /// Attempts made, including the first.
        attempts: u32,
        /// Last error reported by the log.
        reason: String,
    },

    /// The handler reported an error in the call's declared shape.
    #[error("handler reported {status}")]
    HandlerFailed {
        /// Status chosen by the handler.
        status: StatusCode,
        /// The declared error instance, serialized.
        body: serde_json::Value,
    },

    /// The deadline elapsed before the handler finished.
    ///
    /// When `committed_sequence` is set, the event was durably published and
    /// will still be applied by consumers.
    #[error("request deadline elapsed")]
    TimedOut {
        /// Sequence of the committed event, if one was published.
        committed_sequence: Option<u64>,
    },
}

/// Standard error type for Hermes.
///
/// # Example
///
/// ```
/// use hermes_core::{CallError, DecodeError, ErrorCategory};
/// use http::StatusCode;
///
/// let error = CallError::from(DecodeError::missing("path"));
/// assert_eq!(error.category(), ErrorCategory::Validation);
/// assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
/// ```
#[derive(Debug, Error)]
pub enum CallError {
    /// No call is bound to the path.
    #[error("Not found: {path}")]
    RouteNotFound {
        /// Request path.
        path: String,
    },

    /// A call is bound to the path, but not for this method.
    #[error("Method {method} not allowed for {path}")]
    MethodNotAllowed {
        /// Request method.
        method: Method,
        /// Request path.
        path: String,
        /// Methods the path accepts.
        allowed: Vec<Method>,
    },

    /// The request failed to decode.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The auth gate denied the request.
    #[error(transparent)]
    AuthDenied(#[from] DenyReason),

    /// Publishing or handling failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchFailure),

    /// Internal server error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl CallError {
    /// Creates a route-not-found error.
    #[must_use]
    pub fn route_not_found(path: impl Into<String>) -> Self {
        Self::RouteNotFound { path: path.into() }
    }

    /// Creates a method-not-allowed error.
    #[must_use]
    pub fn method_not_allowed(method: Method, path: impl Into<String>, allowed: Vec<Method>) -> Self {
        Self::MethodNotAllowed {
            method,
            path: path.into(),
            allowed,
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::RouteNotFound { .. } => ErrorCategory::NotFound,
            Self::MethodNotAllowed { .. } => ErrorCategory::MethodNotAllowed,
            Self::Decode(_) => ErrorCategory::Validation,
            Self::AuthDenied(DenyReason::Unauthenticated) => ErrorCategory::Authentication,
            Self::AuthDenied(_) => ErrorCategory::Authorization,
            Self::Dispatch(DispatchFailure::PublishFailed { .. }) => ErrorCategory::Unavailable,
            Self::Dispatch(DispatchFailure::HandlerFailed { .. }) => ErrorCategory::Handler,
            Self::Dispatch(DispatchFailure::TimedOut { .. }) => ErrorCategory::Timeout,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Dispatch(DispatchFailure::HandlerFailed { status, .. }) => {
                crate::handler::declared_status(*status)
            }
            Self::AuthDenied(reason) => reason.status_code(),
            other => other.category().default_status_code(),
        }
    }

    /// Returns `true` for failures detected before any handler or publish ran.
    #[must_use]
    pub const fn is_rejected_before_dispatch(&self) -> bool {
        matches!(
            self,
            Self::RouteNotFound { .. }
                | Self::MethodNotAllowed { .. }
                | Self::Decode(_)
                | Self::AuthDenied(_)
        )
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::RouteNotFound { .. } => "ROUTE_NOT_FOUND",
            Self::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
            Self::Decode(_) => "DECODE_ERROR",
            Self::AuthDenied(DenyReason::Unauthenticated) => "UNAUTHENTICATED",
            Self::AuthDenied(DenyReason::InsufficientRight) => "INSUFFICIENT_RIGHT",
            Self::AuthDenied(DenyReason::MissingProject) => "MISSING_PROJECT",
            Self::Dispatch(DispatchFailure::PublishFailed { .. }) => "PUBLISH_FAILED",
            Self::Dispatch(DispatchFailure::HandlerFailed { .. }) => "HANDLER_FAILED",
            Self::Dispatch(DispatchFailure::TimedOut { .. }) => "TIMED_OUT",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Converts this error to a serializable error envelope.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&str>) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.client_message(),
                category: self.category(),
                details: self.error_details(),
            },
            request_id: request_id.map(ToString::to_string),
        }
    }

    /// Message safe to show to clients. Internal causes are not exposed.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Internal { .. } => "Internal Server Error".to_string(),
            Self::Dispatch(DispatchFailure::PublishFailed { .. }) => {
                "Service Unavailable".to_string()
            }
            other => other.to_string(),
        }
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            Self::MethodNotAllowed { allowed, .. } => Some(serde_json::json!({
                "allowed": allowed.iter().map(Method::as_str).collect::<Vec<_>>()
            })),
            Self::Decode(err) => serde_json::to_value(err).ok(),
            Self::Dispatch(DispatchFailure::HandlerFailed { body, .. }) => Some(body.clone()),
            Self::Dispatch(DispatchFailure::TimedOut {
                committed_sequence: Some(sequence),
            }) => Some(serde_json::json!({ "committed_sequence": sequence })),
            _ => None,
        }
    }
}

/// Serializable error envelope for HTTP responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
    /// The request ID for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Error category.
    pub category: ErrorCategory,
    /// Additional error details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
