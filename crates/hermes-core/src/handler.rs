//! Handler contract.
//!
//! A handler receives the [`RequestContext`] and the decoded request and
//! returns either the call's response type or a [`HandlerError`]. Handler
//! errors come in two flavours: a declared error (the call's error type plus
//! the status to send) that is passed to the caller verbatim, and an internal
//! failure that is logged and reported as a 500.

use std::fmt;
use std::future::Future;

use http::StatusCode;

use crate::RequestContext;

/// Status a declared error is sent with.
///
/// Declared errors are never reported as success: any status outside the
/// 4xx and 5xx ranges becomes `500 Internal Server Error`.
#[must_use]
pub fn declared_status(status: StatusCode) -> StatusCode {
    if status.is_client_error() || status.is_server_error() {
        status
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// An error returned by a handler.
pub enum HandlerError<E> {
    /// A failure in the call's declared error shape.
    Declared {
        /// Status to report.
        status: StatusCode,
        /// Error instance sent to the caller.
        error: E,
    },
    /// Anything the handler did not express in the declared shape.
    Internal(anyhow::Error),
}

impl<E> HandlerError<E> {
    /// Creates a declared error. A non-error `status` is replaced by 500,
    /// see [`declared_status`].
    pub fn declared(status: StatusCode, error: E) -> Self {
        Self::Declared {
            status: declared_status(status),
            error,
        }
    }

    /// Creates a declared `400 Bad Request`.
    pub fn bad_request(error: E) -> Self {
        Self::declared(StatusCode::BAD_REQUEST, error)
    }

    /// Creates a declared `404 Not Found`.
    pub fn not_found(error: E) -> Self {
        Self::declared(StatusCode::NOT_FOUND, error)
    }

    /// Creates a declared `409 Conflict`.
    pub fn conflict(error: E) -> Self {
        Self::declared(StatusCode::CONFLICT, error)
    }

    /// Wraps an internal failure.
    pub fn internal(source: impl Into<anyhow::Error>) -> Self {
        Self::Internal(source.into())
    }
}

impl<E> From<anyhow::Error> for HandlerError<E> {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl<E: fmt::Debug> fmt::Debug for HandlerError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declared { status, error } => f
                .debug_struct("Declared")
                .field("status", status)
                .field("error", error)
                .finish(),
            Self::Internal(err) => f.debug_tuple("Internal").field(err).finish(),
        }
    }
}

impl<E> fmt::Display for HandlerError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declared { status, .. } => write!(f, "Declared error: {status}"),
            Self::Internal(err) => write!(f, "Handler error: {err}"),
        }
    }
}

impl<E: fmt::Debug> std::error::Error for HandlerError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Internal(err) => Some(err.as_ref()),
            Self::Declared { .. } => None,
        }
    }
}

/// A trait for handling typed requests.
///
/// Any `async` closure or function taking `(RequestContext, Req)` implements
/// it.
///
/// # Example
///
/// ```rust
/// use hermes_core::{CommonErrorMessage, Handler, HandlerError, RequestContext};
///
/// async fn echo(_ctx: RequestContext, req: String) -> Result<String, HandlerError<CommonErrorMessage>> {
///     Ok(req)
/// }
///
/// fn assert_handler<H: Handler<String, String, CommonErrorMessage>>(_: H) {}
/// assert_handler(echo);
/// ```
pub trait Handler<Req, Res, Err>: Send + Sync + 'static {
    /// Handles a request and returns a response.
    fn handle(
        &self,
        ctx: RequestContext,
        request: Req,
    ) -> impl Future<Output = Result<Res, HandlerError<Err>>> + Send;
}

impl<F, Fut, Req, Res, Err> Handler<Req, Res, Err> for F
where
    F: Fn(RequestContext, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Res, HandlerError<Err>>> + Send,
{
    fn handle(
        &self,
        ctx: RequestContext,
        request: Req,
    ) -> impl Future<Output = Result<Res, HandlerError<Err>>> + Send {
        (self)(ctx, request)
    }
}
