//! Registration and client errors.

use std::fmt;

use hermes_dispatch::SetupError;
use hermes_extract::{ClientError, EncodeError};
use hermes_router::RouterError;
use thiserror::Error;

/// Errors raised while building a [`Registry`](crate::Registry).
///
/// All of them are boot-time failures: a service with an invalid call set
/// must not start.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two calls share a `(namespace, name)` identity.
    #[error("call '{call}' is registered twice")]
    DuplicateCall {
        /// Call identity.
        call: String,
    },

    /// The call's route could not be added.
    #[error("call '{call}' has an unroutable path: {source}")]
    Route {
        /// Call identity.
        call: String,
        /// Router failure.
        #[source]
        source: RouterError,
    },

    /// The handler does not fit the call's dispatch mode.
    #[error(transparent)]
    Setup(#[from] SetupError),
}

/// Failure of an [`InProcessClient`](crate::InProcessClient) call.
pub enum InvokeError<E> {
    /// The request could not be encoded for transport.
    Encode(EncodeError),
    /// The call failed on the server side.
    Call(ClientError<E>),
}

impl<E> InvokeError<E> {
    /// Returns the declared error instance, if the server returned one.
    pub fn declared(&self) -> Option<&E> {
        match self {
            Self::Call(ClientError::Declared { error, .. }) => Some(error),
            _ => None,
        }
    }

    /// Returns the response status, if the call reached the server.
    pub fn status(&self) -> Option<http::StatusCode> {
        match self {
            Self::Encode(_) => None,
            Self::Call(err) => Some(err.status()),
        }
    }
}

impl<E> From<EncodeError> for InvokeError<E> {
    fn from(err: EncodeError) -> Self {
        Self::Encode(err)
    }
}

impl<E> From<ClientError<E>> for InvokeError<E> {
    fn from(err: ClientError<E>) -> Self {
        Self::Call(err)
    }
}

impl<E: fmt::Debug> fmt::Debug for InvokeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(err) => f.debug_tuple("Encode").field(err).finish(),
            Self::Call(err) => f.debug_tuple("Call").field(err).finish(),
        }
    }
}

impl<E> fmt::Display for InvokeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "failed to encode request: {err}"),
            Self::Call(err) => err.fmt(f),
        }
    }
}

impl<E: fmt::Debug> std::error::Error for InvokeError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::Call(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_error_messages() {
        let err = RegistryError::DuplicateCall {
            call: "files.get".to_string(),
        };
        assert_eq!(err.to_string(), "call 'files.get' is registered twice");

        let err = RegistryError::from(SetupError::MissingHandler {
            call: "files.get".to_string(),
        });
        assert!(matches!(err, RegistryError::Setup(_)));
    }

    #[test]
    fn test_invoke_error_status() {
        let err: InvokeError<()> = InvokeError::Encode(EncodeError::MissingPathField {
            field: "id".to_string(),
        });
        assert!(err.status().is_none());
        assert!(err.declared().is_none());

        let err: InvokeError<&str> = InvokeError::Call(ClientError::Declared {
            status: http::StatusCode::CONFLICT,
            error: "exists",
        });
        assert_eq!(err.status(), Some(http::StatusCode::CONFLICT));
        assert_eq!(err.declared(), Some(&"exists"));
    }
}
