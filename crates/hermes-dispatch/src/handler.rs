//! Type-erased handlers.
//!
//! The registry stores handlers of many request/response types side by
//! side, so each typed [`Handler`] is wrapped into an [`ErasedHandler`] that
//! takes and returns JSON values. The decode stage has already checked the
//! value against the request type, so a conversion failure here is an
//! internal error, never a client error.

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use hermes_core::{declared_status, ErrorMessage, Handler, HandlerError, Message, RequestContext};
use http::StatusCode;
use serde_json::Value;

/// Failure of an erased handler.
#[derive(Debug)]
pub enum HandlerFailure {
    /// The handler returned its declared error shape.
    Declared {
        /// Status chosen by the handler.
        status: StatusCode,
        /// The serialized error instance.
        body: Value,
    },
    /// Anything else.
    Internal(anyhow::Error),
}

type BoxedHandlerFn =
    dyn Fn(RequestContext, Value) -> BoxFuture<'static, Result<Value, HandlerFailure>> + Send + Sync;

/// A handler working on JSON values.
#[derive(Clone)]
pub struct ErasedHandler {
    inner: Arc<BoxedHandlerFn>,
}

impl fmt::Debug for ErasedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedHandler").finish_non_exhaustive()
    }
}

impl ErasedHandler {
    /// Wraps a typed handler.
    pub fn new<Req, Res, Err, H>(handler: H) -> Self
    where
        Req: Message,
        Res: Message,
        Err: ErrorMessage,
        H: Handler<Req, Res, Err>,
    {
        let handler = Arc::new(handler);
        let inner = move |ctx: RequestContext, value: Value| {
            let handler = Arc::clone(&handler);
            let fut: BoxFuture<'static, Result<Value, HandlerFailure>> = Box::pin(async move {
                let request: Req = serde_json::from_value(value)
                    .map_err(|e| HandlerFailure::Internal(anyhow::Error::new(e)))?;

                match handler.handle(ctx, request).await {
                    Ok(response) => serde_json::to_value(response)
                        .map_err(|e| HandlerFailure::Internal(anyhow::Error::new(e))),
                    Err(HandlerError::Declared { status, error }) => {
                        let body = serde_json::to_value(error)
                            .map_err(|e| HandlerFailure::Internal(anyhow::Error::new(e)))?;
                        if declared_status(status) != status {
                            tracing::warn!(%status, "declared error with a non-error status, sent as 500");
                        }
                        Err(HandlerFailure::Declared {
                            status: declared_status(status),
                            body,
                        })
                    }
                    Err(HandlerError::Internal(err)) => Err(HandlerFailure::Internal(err)),
                }
            });
            fut
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Invokes the handler.
    pub fn call(
        &self,
        ctx: RequestContext,
        request: Value,
    ) -> BoxFuture<'static, Result<Value, HandlerFailure>> {
        (self.inner)(ctx, request)
    }
}

#[cfg(test)]
mod tests {
    use hermes_core::CommonErrorMessage;
    use serde_json::json;

    use super::*;

    #[derive(serde::Serialize, serde::Deserialize)]
    struct Count {
        n: u32,
    }

    impl Message for Count {
        fn descriptor() -> hermes_core::TypeDescriptor {
            hermes_core::TypeDescriptor::new(
                "Count",
                vec![hermes_core::FieldDescriptor::of::<u32>("n", false)],
            )
        }
    }

    fn doubler() -> ErasedHandler {
        ErasedHandler::new(
            |_ctx: RequestContext, req: Count| async move {
                match req.n {
                    0 => Err(HandlerError::bad_request(CommonErrorMessage::new("zero"))),
                    13 => Err(HandlerError::internal(anyhow::anyhow!("unlucky"))),
                    n => Ok(Count { n: n * 2 }),
                }
            },
        )
    }

    #[tokio::test]
    async fn test_success_is_serialized() {
        let out = doubler().call(RequestContext::new(), json!({"n": 4})).await.unwrap();
        assert_eq!(out, json!({"n": 8}));
    }

    #[tokio::test]
    async fn test_declared_error_keeps_status_and_shape() {
        match doubler().call(RequestContext::new(), json!({"n": 0})).await {
            Err(HandlerFailure::Declared { status, body }) => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(body, json!({"why": "zero"}));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_internal_failures() {
        assert!(matches!(
            doubler().call(RequestContext::new(), json!({"n": 13})).await,
            Err(HandlerFailure::Internal(_))
        ));
        assert!(matches!(
            doubler().call(RequestContext::new(), json!({"n": "four"})).await,
            Err(HandlerFailure::Internal(_))
        ));
    }
}
