//! Response encoding and client-side response decoding.
//!
//! | Status | Body | Client sees |
//! |---|---|---|
//! | 200 | response schema | [`Reply::Ok`] |
//! | 202 | [`Acknowledgement`] | [`Reply::Accepted`] |
//! | 4xx/5xx | [`ErrorEnvelope`] | [`ClientError::Framework`] |
//! | 4xx/5xx | error schema | [`ClientError::Declared`] |

use std::fmt;

use bytes::Bytes;
use hermes_core::{Acknowledgement, ErrorEnvelope, ErrorMessage, Message};
use http::{header, HeaderValue, Response, StatusCode};
use serde::Serialize;

const SERIALIZATION_FAILURE: &[u8] =
    br#"{"error":{"code":"INTERNAL_ERROR","message":"Internal Server Error","category":"internal"}}"#;

/// JSON response builder.
///
/// # Example
///
/// ```rust
/// use hermes_extract::JsonResponse;
/// use http::StatusCode;
///
/// let response = JsonResponse::new(serde_json::json!({"bytes": 42})).into_response();
/// assert_eq!(response.status(), StatusCode::OK);
/// assert_eq!(response.headers()["content-type"], "application/json");
/// ```
#[derive(Debug)]
pub struct JsonResponse<T> {
    data: T,
    status: StatusCode,
}

impl<T: Serialize> JsonResponse<T> {
    /// Creates a new JSON response with status 200 OK.
    #[must_use]
    pub fn new(data: T) -> Self {
        Self {
            data,
            status: StatusCode::OK,
        }
    }

    /// Creates a JSON response with status 202 Accepted.
    #[must_use]
    pub fn accepted(data: T) -> Self {
        Self {
            data,
            status: StatusCode::ACCEPTED,
        }
    }

    /// Sets a custom status code.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Builds the HTTP response.
    ///
    /// A body that fails to serialize becomes a 500 with the internal error
    /// envelope.
    #[must_use]
    pub fn into_response(self) -> Response<Bytes> {
        let (status, body) = match serde_json::to_vec(&self.data) {
            Ok(body) => (self.status, Bytes::from(body)),
            Err(e) => {
                tracing::error!(error = %e, "response serialization failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Bytes::from_static(SERIALIZATION_FAILURE),
                )
            }
        };

        let mut response = Response::new(body);
        *response.status_mut() = status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        response
    }
}

/// A successful reply to a call.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply<Res> {
    /// The handler's response.
    Ok(Res),
    /// The request was published; no handler ran synchronously.
    Accepted(Acknowledgement),
}

impl<Res> Reply<Res> {
    /// Returns the handler's response, if there was one.
    pub fn into_response(self) -> Option<Res> {
        match self {
            Self::Ok(res) => Some(res),
            Self::Accepted(_) => None,
        }
    }

    /// Returns the acknowledgement of a published request.
    pub fn acknowledgement(&self) -> Option<&Acknowledgement> {
        match self {
            Self::Ok(_) => None,
            Self::Accepted(ack) => Some(ack),
        }
    }
}

/// A failed call, as seen by a client.
pub enum ClientError<E> {
    /// The call's declared error shape.
    Declared {
        /// Response status.
        status: StatusCode,
        /// Declared error instance.
        error: E,
    },
    /// A framework error envelope.
    Framework {
        /// Response status.
        status: StatusCode,
        /// The envelope.
        envelope: ErrorEnvelope,
    },
    /// A body that matches neither the response nor an error shape.
    Unexpected {
        /// Response status.
        status: StatusCode,
        /// Parser message.
        detail: String,
    },
}

impl<E> ClientError<E> {
    /// Returns the response status.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Declared { status, .. }
            | Self::Framework { status, .. }
            | Self::Unexpected { status, .. } => *status,
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for ClientError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declared { status, error } => f
                .debug_struct("Declared")
                .field("status", status)
                .field("error", error)
                .finish(),
            Self::Framework { status, envelope } => f
                .debug_struct("Framework")
                .field("status", status)
                .field("envelope", envelope)
                .finish(),
            Self::Unexpected { status, detail } => f
                .debug_struct("Unexpected")
                .field("status", status)
                .field("detail", detail)
                .finish(),
        }
    }
}

impl<E> fmt::Display for ClientError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declared { status, .. } => write!(f, "call failed with {status}"),
            Self::Framework { status, envelope } => {
                write!(f, "{status}: {} ({})", envelope.error.message, envelope.error.code)
            }
            Self::Unexpected { status, detail } => write!(f, "unexpected {status} response: {detail}"),
        }
    }
}

impl<E: fmt::Debug> std::error::Error for ClientError<E> {}

/// Decodes a transport response into the call's typed outcome.
pub fn decode_response<Res, E>(response: &Response<Bytes>) -> Result<Reply<Res>, ClientError<E>>
where
    Res: Message,
    E: ErrorMessage,
{
    let status = response.status();
    let body = response.body();
    let unexpected = |e: serde_json::Error| ClientError::Unexpected {
        status,
        detail: e.to_string(),
    };

    if status == StatusCode::ACCEPTED {
        return serde_json::from_slice(body).map(Reply::Accepted).map_err(unexpected);
    }
    if status.is_success() {
        let body: &[u8] = if body.is_empty() { b"{}" } else { body };
        return serde_json::from_slice(body).map(Reply::Ok).map_err(unexpected);
    }

    if let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(body) {
        return Err(ClientError::Framework { status, envelope });
    }
    match serde_json::from_slice::<E>(body) {
        Ok(error) => Err(ClientError::Declared { status, error }),
        Err(e) => Err(unexpected(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::{CallError, CommonErrorMessage, DenyReason, Empty};

    fn response(status: StatusCode, body: &str) -> Response<Bytes> {
        JsonResponse::new(serde_json::from_str::<serde_json::Value>(body).unwrap())
            .with_status(status)
            .into_response()
    }

    #[test]
    fn test_ok_and_accepted() {
        let reply: Reply<CommonErrorMessage> =
            decode_response::<_, Empty>(&response(StatusCode::OK, r#"{"why":"fine"}"#)).unwrap();
        assert_eq!(reply.into_response().unwrap().why, "fine");

        let reply: Reply<Empty> = decode_response::<_, Empty>(&response(
            StatusCode::ACCEPTED,
            r#"{"topic":"projects","sequence":3}"#,
        ))
        .unwrap();
        assert_eq!(reply.acknowledgement().unwrap().sequence, 3);
    }

    #[test]
    fn test_declared_error() {
        let err = decode_response::<Empty, CommonErrorMessage>(&response(
            StatusCode::CONFLICT,
            r#"{"why":"exists"}"#,
        ))
        .unwrap_err();
        match err {
            ClientError::Declared { status, error } => {
                assert_eq!(status, StatusCode::CONFLICT);
                assert_eq!(error.why, "exists");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_framework_envelope_wins_over_declared_shape() {
        let envelope = CallError::from(DenyReason::Unauthenticated).to_envelope(Some("r-1"));
        let body = serde_json::to_string(&envelope).unwrap();
        let err = decode_response::<Empty, Empty>(&response(StatusCode::UNAUTHORIZED, &body)).unwrap_err();
        assert!(matches!(
            &err,
            ClientError::Framework { envelope, .. } if envelope.error.code == "UNAUTHENTICATED"
        ));
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_unexpected_body() {
        let err = decode_response::<CommonErrorMessage, CommonErrorMessage>(&response(
            StatusCode::OK,
            r#"{"bytes":1}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, ClientError::Unexpected { .. }));
    }
}
