//! The server-side router.
//!
//! [`CallRouter::handle`] runs one transport request through the pipeline
//!
//! ```text
//! resolve ─► context ─► auth gate ─► decode ─► dispatch ─► encode
//!  404/405               401/403      400      202/200 or error
//! ```
//!
//! and always answers: every failure becomes a response with the status of
//! its [`CallError`]. Failures after the call is known are rendered in the
//! call's declared error shape when that shape can carry a framework
//! message, else as the [`ErrorEnvelope`](hermes_core::ErrorEnvelope).

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use hermes_authz::AuthGate;
use hermes_config::HermesConfig;
use hermes_core::{CallDescription, CallError, DispatchFailure, RequestContext, RequestId};
use hermes_dispatch::Outcome;
use hermes_extract::{decode, JsonResponse, RawRequest};
use hermes_router::Params;
use hermes_telemetry::metrics::record_call;
use http::header::{HeaderName, ALLOW};
use http::{HeaderValue, Request, Response};
use tracing::{debug, field, info, instrument, warn, Span};

use crate::principal::{Anonymous, PrincipalResolver};
use crate::registry::{RegisteredCall, Registry, Resolved};

/// Header carrying the request ID, in both directions.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Header carrying the caller's project.
pub const PROJECT_HEADER: &str = "project";

/// Routes transport requests to registered calls.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use bytes::Bytes;
/// use hermes_dispatch::{Dispatcher, InMemoryEventLog};
/// use hermes_server::{CallRouter, RegistryBuilder};
/// use http::{Request, StatusCode};
///
/// let registry = RegistryBuilder::new(Dispatcher::new(Arc::new(InMemoryEventLog::new()))).build();
/// let router = CallRouter::new(registry);
///
/// let request = Request::get("/api/nothing").body(Bytes::new()).unwrap();
/// let response = tokio_test::block_on(router.handle(request));
/// assert_eq!(response.status(), StatusCode::NOT_FOUND);
/// ```
pub struct CallRouter {
    registry: Arc<Registry>,
    gate: AuthGate,
    principals: Arc<dyn PrincipalResolver>,
    request_timeout: Option<Duration>,
}

impl std::fmt::Debug for CallRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallRouter")
            .field("registry", &self.registry)
            .field("gate", &self.gate)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl CallRouter {
    /// Creates a router with the default gate, anonymous callers and no
    /// deadline.
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            gate: AuthGate::default(),
            principals: Arc::new(Anonymous),
            request_timeout: None,
        }
    }

    /// Creates a router whose requests get the configured deadline.
    #[must_use]
    pub fn from_config(registry: Arc<Registry>, config: &HermesConfig) -> Self {
        Self::new(registry).with_request_timeout(config.request_timeout())
    }

    /// Sets the auth gate.
    #[must_use]
    pub fn with_gate(mut self, gate: AuthGate) -> Self {
        self.gate = gate;
        self
    }

    /// Sets how callers are identified.
    #[must_use]
    pub fn with_principal_resolver(mut self, resolver: impl PrincipalResolver) -> Self {
        self.principals = Arc::new(resolver);
        self
    }

    /// Sets the deadline given to every request.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// The registry this router serves.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Handles one request.
    #[instrument(
        skip_all,
        fields(
            method = %request.method(),
            path = %request.uri().path(),
            request_id = field::Empty,
            call = field::Empty,
            principal = field::Empty,
        )
    )]
    pub async fn handle(&self, request: Request<Bytes>) -> Response<Bytes> {
        let started = Instant::now();
        let request_id = request_id(&request);
        let span = Span::current();
        span.record("request_id", field::display(request_id));

        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let (call, params) = match self.registry.resolve(&method, &path) {
            Resolved::Found { call, params } => (call, params),
            Resolved::MethodNotAllowed(allowed) => {
                debug!("method not allowed");
                let error = CallError::method_not_allowed(method, path, allowed);
                return error_response(None, &error, request_id);
            }
            Resolved::NotFound => {
                debug!("no call bound to path");
                return error_response(None, &CallError::route_not_found(path), request_id);
            }
        };

        let description = call.description();
        span.record("call", field::display(description.full_name()));

        let result = self.run(call, params, request, request_id).await;
        let response = match result {
            Ok(Outcome::Response(value)) => {
                with_request_id(JsonResponse::new(value).into_response(), request_id)
            }
            Ok(Outcome::Acknowledged(ack)) => {
                with_request_id(JsonResponse::accepted(ack).into_response(), request_id)
            }
            Err(error) => {
                if let CallError::Internal {
                    source: Some(source),
                    ..
                } = &error
                {
                    warn!(error = %error, cause = %source, "internal failure");
                }
                error_response(Some(description), &error, request_id)
            }
        };

        let status = response.status();
        let elapsed = started.elapsed();
        let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        record_call(
            description.namespace(),
            description.name(),
            status.as_u16(),
            elapsed,
        );
        if status.is_server_error() {
            warn!(status = status.as_u16(), duration_ms, "call failed");
        } else {
            info!(status = status.as_u16(), duration_ms, "call completed");
        }
        response
    }

    /// Gate, decode and dispatch. The gate runs before the body is read.
    async fn run(
        &self,
        call: &RegisteredCall,
        params: Params,
        request: Request<Bytes>,
        request_id: RequestId,
    ) -> Result<Outcome, CallError> {
        let description = call.description();
        let ctx = self.context(&request, request_id);

        self.gate.evaluate(&ctx, description).into_result()?;

        let raw = RawRequest::from_request(&request, params);
        let value = decode(description, &raw)?;

        self.registry
            .dispatcher()
            .dispatch(call.dispatch(), description, ctx, value)
            .await
    }

    fn context(&self, request: &Request<Bytes>, request_id: RequestId) -> RequestContext {
        let mut ctx = RequestContext::with_request_id(request_id);
        if let Some(principal) = self.principals.resolve(request.headers()) {
            Span::current().record("principal", field::display(principal.log_id()));
            ctx = ctx.with_principal(principal);
        }
        if let Some(project) = request
            .headers()
            .get(PROJECT_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|p| !p.is_empty())
        {
            ctx = ctx.with_project(project);
        }
        if let Some(timeout) = self.request_timeout {
            ctx = ctx.with_timeout(timeout);
        }
        ctx
    }
}

/// Reuses a well-formed incoming request ID, else mints one.
fn request_id(request: &Request<Bytes>) -> RequestId {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| RequestId::parse(v).ok())
        .unwrap_or_default()
}

fn error_response(
    description: Option<&CallDescription>,
    error: &CallError,
    request_id: RequestId,
) -> Response<Bytes> {
    let status = error.status_code();
    let mut response = match error {
        CallError::Dispatch(DispatchFailure::HandlerFailed { body, .. }) => {
            JsonResponse::new(body).with_status(status).into_response()
        }
        _ => match description.and_then(|d| d.framework_error_body(&error.client_message())) {
            Some(body) => JsonResponse::new(body).with_status(status).into_response(),
            None => JsonResponse::new(error.to_envelope(Some(&request_id.to_string())))
                .with_status(status)
                .into_response(),
        },
    };

    if let CallError::MethodNotAllowed { allowed, .. } = error {
        let allow = allowed
            .iter()
            .map(http::Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        if let Ok(value) = HeaderValue::from_str(&allow) {
            response.headers_mut().insert(ALLOW, value);
        }
    }
    with_request_id(response, request_id)
}

fn with_request_id(mut response: Response<Bytes>, request_id: RequestId) -> Response<Bytes> {
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}

#[cfg(test)]
mod tests {
    use hermes_core::{DecodeError, DenyReason};

    use super::*;

    #[test]
    fn test_request_id_is_reused_when_valid() {
        let id = RequestId::new();
        let request = Request::get("/")
            .header(REQUEST_ID_HEADER, id.to_string())
            .body(Bytes::new())
            .unwrap();
        assert_eq!(request_id(&request), id);

        let request = Request::get("/")
            .header(REQUEST_ID_HEADER, "not-a-uuid")
            .body(Bytes::new())
            .unwrap();
        assert_ne!(request_id(&request).to_string(), "not-a-uuid");
    }

    #[test]
    fn test_method_not_allowed_sets_allow() {
        let error = CallError::method_not_allowed(
            http::Method::DELETE,
            "/api/files/1",
            vec![http::Method::GET, http::Method::PUT],
        );
        let response = error_response(None, &error, RequestId::new());
        assert_eq!(response.status(), http::StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET, PUT");
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[test]
    fn test_framework_errors_use_envelope_without_description() {
        let response = error_response(
            None,
            &CallError::from(DenyReason::Unauthenticated),
            RequestId::new(),
        );
        assert_eq!(response.status(), http::StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["error"]["code"], "UNAUTHENTICATED");

        let response = error_response(
            None,
            &CallError::from(DecodeError::missing("path")),
            RequestId::new(),
        );
        assert_eq!(response.status(), http::StatusCode::BAD_REQUEST);
    }
}
