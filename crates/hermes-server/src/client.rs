//! In-process client.
//!
//! Services call each other through the same descriptions they serve: the
//! request is encoded with the binding resolver, sent through a
//! [`CallRouter`], and the response decoded back into the call's types. Auth,
//! decoding and dispatch run exactly as for a remote caller.

use std::sync::Arc;

use bytes::Bytes;
use hermes_core::{Call, ErrorMessage, Message, Principal};
use hermes_extract::{decode_response, encode_typed, Reply};
use http::header::HeaderName;
use http::{HeaderValue, Request, Response};

use crate::error::InvokeError;
use crate::principal::HeaderPrincipalResolver;
use crate::router::{CallRouter, PROJECT_HEADER};

/// Typed client over a [`CallRouter`].
///
/// The caller identity travels in the headers [`HeaderPrincipalResolver`]
/// reads, so the router must be configured with that resolver for
/// [`as_principal`](Self::as_principal) to take effect.
#[derive(Debug, Clone)]
pub struct InProcessClient {
    router: Arc<CallRouter>,
    principal: Option<Principal>,
    project: Option<String>,
}

impl InProcessClient {
    /// Creates an anonymous client.
    #[must_use]
    pub fn new(router: Arc<CallRouter>) -> Self {
        Self {
            router,
            principal: None,
            project: None,
        }
    }

    /// Sends requests as `principal`.
    #[must_use]
    pub fn as_principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    /// Sends requests in the context of `project`.
    #[must_use]
    pub fn in_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Invokes `call` with `request`.
    ///
    /// # Errors
    ///
    /// Returns `InvokeError::Encode` if the request cannot be encoded for the
    /// call's bindings, `InvokeError::Call` if the server answered with an
    /// error.
    pub async fn call<Req, Res, Err>(
        &self,
        call: &Call<Req, Res, Err>,
        request: &Req,
    ) -> Result<Reply<Res>, InvokeError<Err>>
    where
        Req: Message,
        Res: Message,
        Err: ErrorMessage,
    {
        let raw = encode_typed(call.description(), request)?;
        let response = self.send(raw).await;
        decode_response::<Res, Err>(&response).map_err(InvokeError::Call)
    }

    /// Sends a raw request with this client's identity headers.
    pub async fn send(&self, mut request: Request<Bytes>) -> Response<Bytes> {
        let headers = request.headers_mut();
        if let Some(principal) = &self.principal {
            HeaderPrincipalResolver::write(principal, headers);
        }
        if let Some(project) = &self.project {
            if let Ok(value) = HeaderValue::from_str(project) {
                headers.insert(HeaderName::from_static(PROJECT_HEADER), value);
            }
        }
        self.router.handle(request).await
    }
}
