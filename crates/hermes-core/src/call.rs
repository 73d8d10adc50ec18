//! Call descriptions.
//!
//! A [`CallDescription`] is the single source of truth for one operation of
//! a service: its request/response/error schemas, how request fields map onto
//! an HTTP request, who may call it, whether the gateway exposes it, and
//! whether it runs synchronously, goes through the ordered event log, or
//! both.
//!
//! Descriptions are built with [`Call::builder`], which checks every binding
//! invariant and fails at boot rather than at request time.
//!
//! # Example
//!
//! ```rust
//! use hermes_core::{AuthRequirement, Call, CommonErrorMessage, FieldDescriptor, Message, TypeDescriptor};
//! use http::Method;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct UsageRequest { path: Option<String> }
//!
//! impl Message for UsageRequest {
//!     fn descriptor() -> TypeDescriptor {
//!         TypeDescriptor::new("UsageRequest", vec![FieldDescriptor::of::<Option<String>>("path", false)])
//!     }
//! }
//!
//! #[derive(Serialize, Deserialize)]
//! struct UsageResponse { bytes: u64, path: String }
//!
//! impl Message for UsageResponse {
//!     fn descriptor() -> TypeDescriptor {
//!         TypeDescriptor::new("UsageResponse", vec![
//!             FieldDescriptor::of::<u64>("bytes", false),
//!             FieldDescriptor::of::<String>("path", false),
//!         ])
//!     }
//! }
//!
//! let usage = Call::<UsageRequest, UsageResponse, CommonErrorMessage>::builder("files.stats", "usage")
//!     .method(Method::GET)
//!     .path("/api/files/stats")
//!     .path("usage")
//!     .param("path")
//!     .auth(AuthRequirement::read())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(usage.description().template(), "/api/files/stats/usage");
//! assert_eq!(usage.description().required_scope().to_string(), "files.stats:READ");
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use http::Method;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::identity::{AccessRight, Role, SecurityScope};
use crate::schema::{ErrorMessage, Message, TypeDescriptor};
use crate::template::{parse_template, PathSegment, SUPPORTED_METHODS};

/// Where the request body comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyBinding {
    /// No body; every field is bound by path or query.
    None,
    /// The body is the whole request.
    EntireBody,
    /// The body carries the fields not bound by path or query.
    BoundFields,
}

/// How a call takes effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchMode {
    /// Invoke the handler and return its result.
    SyncOnly,
    /// Publish the request to the event log and acknowledge.
    LogOnly,
    /// Publish first, then invoke the handler.
    SyncAndLog,
}

impl DispatchMode {
    /// Returns `true` if the mode publishes to the log.
    #[must_use]
    pub const fn publishes(self) -> bool {
        matches!(self, Self::LogOnly | Self::SyncAndLog)
    }

    /// Returns `true` if the mode invokes a handler.
    #[must_use]
    pub const fn invokes_handler(self) -> bool {
        matches!(self, Self::SyncOnly | Self::SyncAndLog)
    }
}

/// Who may invoke a call.
///
/// There is no default: every call states `Public` or `Authenticated`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRequirement {
    /// Anyone, including anonymous callers.
    Public,
    /// An authenticated principal with the given right.
    Authenticated {
        /// Required right.
        access: AccessRight,
        /// Whether a resolved project context is required.
        requires_project: bool,
        /// Roles allowed to call.
        roles: Vec<Role>,
    },
}

impl AuthRequirement {
    /// Any authenticated principal, read access.
    #[must_use]
    pub fn read() -> Self {
        Self::Authenticated {
            access: AccessRight::Read,
            requires_project: false,
            roles: Role::AUTHENTICATED.to_vec(),
        }
    }

    /// Any authenticated principal, read/write access.
    #[must_use]
    pub fn read_write() -> Self {
        Self::Authenticated {
            access: AccessRight::ReadWrite,
            requires_project: false,
            roles: Role::AUTHENTICATED.to_vec(),
        }
    }

    /// Requires a resolved project context.
    #[must_use]
    pub fn in_project(self) -> Self {
        match self {
            Self::Authenticated { access, roles, .. } => Self::Authenticated {
                access,
                requires_project: true,
                roles,
            },
            Self::Public => Self::Public,
        }
    }

    /// Narrows the set of allowed roles.
    #[must_use]
    pub fn with_roles(self, allowed: &[Role]) -> Self {
        match self {
            Self::Authenticated {
                access,
                requires_project,
                ..
            } => Self::Authenticated {
                access,
                requires_project,
                roles: allowed.to_vec(),
            },
            Self::Public => Self::Public,
        }
    }

    /// The right required, or `None` for public calls.
    #[must_use]
    pub fn access(&self) -> Option<AccessRight> {
        match self {
            Self::Public => None,
            Self::Authenticated { access, .. } => Some(*access),
        }
    }
}

/// A query parameter bound to a request field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamBinding {
    /// Name in the query string.
    pub query_name: String,
    /// Request field it fills.
    pub field: String,
}

/// Normalizes a merged request value through the typed request.
pub type RequestNormalizer = fn(Value) -> Result<Value, serde_json::Error>;

/// Builds the declared error body from a framework message.
pub type FrameworkErrorBody = fn(&str) -> Option<Value>;

/// Errors raised when a call description violates a binding invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptionError {
    /// Namespace or name is not a valid identifier.
    #[error("{call}: invalid identifier '{value}'")]
    InvalidIdentifier {
        /// Call identity.
        call: String,
        /// The offending value.
        value: String,
    },
    /// The method is outside the supported verb set.
    #[error("{call}: unsupported method {method}")]
    UnsupportedMethod {
        /// Call identity.
        call: String,
        /// The method.
        method: Method,
    },
    /// The path template does not parse.
    #[error("{call}: invalid path: {reason}")]
    InvalidPath {
        /// Call identity.
        call: String,
        /// Parser message.
        reason: String,
    },
    /// A binding refers to a field the request does not have.
    #[error("{call}: request has no field '{field}'")]
    UnknownField {
        /// Call identity.
        call: String,
        /// Field name.
        field: String,
    },
    /// A structured field is bound to a path or query position.
    #[error("{call}: field '{field}' is structured and can only travel in the body")]
    NotScalar {
        /// Call identity.
        call: String,
        /// Field name.
        field: String,
    },
    /// A path placeholder targets a field that may be absent.
    #[error("{call}: path placeholder '{field}' must be a required field")]
    OptionalPlaceholder {
        /// Call identity.
        call: String,
        /// Field name.
        field: String,
    },
    /// A field has more than one binding.
    #[error("{call}: field '{field}' is bound more than once")]
    DoubleBinding {
        /// Call identity.
        call: String,
        /// Field name.
        field: String,
    },
    /// Two query parameters share a name.
    #[error("{call}: query parameter '{name}' is declared twice")]
    DuplicateParam {
        /// Call identity.
        call: String,
        /// Parameter name.
        name: String,
    },
    /// `EntireBody` combined with path or query bindings.
    #[error("{call}: the whole body is the request, so no field may be bound to the path or query")]
    EntireBodyWithBindings {
        /// Call identity.
        call: String,
    },
    /// A field is left without a binding.
    #[error("{call}: field '{field}' is not bound to the path, query or body")]
    UnboundField {
        /// Call identity.
        call: String,
        /// Field name.
        field: String,
    },
    /// No auth requirement was declared.
    #[error("{call}: no auth requirement declared (use AuthRequirement::Public explicitly)")]
    MissingAuth {
        /// Call identity.
        call: String,
    },
    /// An authenticated requirement with no allowed role.
    #[error("{call}: authenticated call allows no role")]
    NoRoles {
        /// Call identity.
        call: String,
    },
    /// A partition key that is not a scalar request field.
    #[error("{call}: partition key '{field}' must be a scalar request field")]
    InvalidPartitionKey {
        /// Call identity.
        call: String,
        /// Field name.
        field: String,
    },
    /// A per-call topic on a call that does not publish.
    #[error("{call}: topic declared on a call that never publishes")]
    TopicWithoutLog {
        /// Call identity.
        call: String,
    },
    /// A publishing call whose request drops fields when serialized.
    #[error("{call}: request field '{field}' is skipped by serde and would be lost from the event")]
    LossyEvent {
        /// Call identity.
        call: String,
        /// Rust name of the skipped field.
        field: String,
    },
}

/// The contract of one call.
#[derive(Clone)]
pub struct CallDescription {
    namespace: String,
    name: String,
    request: TypeDescriptor,
    response: TypeDescriptor,
    error: TypeDescriptor,
    method: Method,
    path: Vec<PathSegment>,
    params: Vec<ParamBinding>,
    body: BodyBinding,
    auth: AuthRequirement,
    proxy_to_gateway: bool,
    dispatch: DispatchMode,
    topic: Option<String>,
    partition_key: Option<String>,
    normalize: RequestNormalizer,
    framework_error: FrameworkErrorBody,
}

impl fmt::Debug for CallDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallDescription")
            .field("namespace", &self.namespace)
            .field("name", &self.name)
            .field("method", &self.method)
            .field("template", &self.template())
            .field("body", &self.body)
            .field("auth", &self.auth)
            .field("dispatch", &self.dispatch)
            .finish_non_exhaustive()
    }
}

impl CallDescription {
    /// Namespace of the call (e.g. `files.stats`).
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Name of the call within its namespace.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `namespace.name`, used in logs and metrics.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    /// Request schema.
    #[must_use]
    pub fn request_schema(&self) -> &TypeDescriptor {
        &self.request
    }

    /// Response schema.
    #[must_use]
    pub fn response_schema(&self) -> &TypeDescriptor {
        &self.response
    }

    /// Error schema.
    #[must_use]
    pub fn error_schema(&self) -> &TypeDescriptor {
        &self.error
    }

    /// Transport method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path template segments; placeholders name request fields.
    #[must_use]
    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    /// Path template rendered as `/a/{field}/b`.
    #[must_use]
    pub fn template(&self) -> String {
        render(&self.path, usize::MAX)
    }

    /// Literal prefix of the template: every segment before the first placeholder.
    #[must_use]
    pub fn literal_prefix(&self) -> String {
        let literals = self.path.iter().take_while(|s| !s.is_param()).count();
        render(&self.path, literals)
    }

    /// Query parameter bindings.
    #[must_use]
    pub fn params(&self) -> &[ParamBinding] {
        &self.params
    }

    /// Body binding mode.
    #[must_use]
    pub fn body(&self) -> BodyBinding {
        self.body
    }

    /// Access requirement.
    #[must_use]
    pub fn auth(&self) -> &AuthRequirement {
        &self.auth
    }

    /// Whether the gateway routes this call.
    #[must_use]
    pub fn proxy_to_gateway(&self) -> bool {
        self.proxy_to_gateway
    }

    /// Dispatch mode.
    #[must_use]
    pub fn dispatch(&self) -> DispatchMode {
        self.dispatch
    }

    /// Per-call topic override.
    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// Request field used as the event partition key.
    #[must_use]
    pub fn partition_key(&self) -> Option<&str> {
        self.partition_key.as_deref()
    }

    /// Scope a restricted principal must hold to invoke this call.
    #[must_use]
    pub fn required_scope(&self) -> SecurityScope {
        let access = self.auth.access().unwrap_or(AccessRight::Read);
        SecurityScope::for_namespace(&self.namespace, access)
    }

    /// Returns `true` if `field` is bound to the path.
    #[must_use]
    pub fn is_path_bound(&self, field: &str) -> bool {
        self.path
            .iter()
            .any(|s| matches!(s, PathSegment::Param(name) if name == field))
    }

    /// Returns `true` if `field` is bound to the query string.
    #[must_use]
    pub fn is_param_bound(&self, field: &str) -> bool {
        self.params.iter().any(|p| p.field == field)
    }

    /// Round-trips a merged request value through the typed request.
    ///
    /// Fails exactly when the value is not a valid instance of the request type.
    pub fn normalize_request(&self, value: Value) -> Result<Value, serde_json::Error> {
        (self.normalize)(value)
    }

    /// Builds the declared error body for a framework failure, if the error
    /// type can carry one.
    #[must_use]
    pub fn framework_error_body(&self, message: &str) -> Option<Value> {
        (self.framework_error)(message)
    }
}

fn render(path: &[PathSegment], take: usize) -> String {
    let mut out = String::new();
    for segment in path.iter().take(take) {
        out.push('/');
        match segment {
            PathSegment::Literal(literal) => out.push_str(literal),
            PathSegment::Param(field) => {
                out.push('{');
                out.push_str(field);
                out.push('}');
            }
        }
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Checks that `field` exists and is scalar; returns whether it is required.
fn scalar_field(request: &TypeDescriptor, call: &str, field: &str) -> Result<bool, DescriptionError> {
    let descriptor = request
        .field(field)
        .ok_or_else(|| DescriptionError::UnknownField {
            call: call.to_string(),
            field: field.to_string(),
        })?;
    if !descriptor.kind.is_scalar() {
        return Err(DescriptionError::NotScalar {
            call: call.to_string(),
            field: field.to_string(),
        });
    }
    Ok(descriptor.required)
}

fn normalize<Req: Message>(value: Value) -> Result<Value, serde_json::Error> {
    let typed: Req = serde_json::from_value(value)?;
    serde_json::to_value(typed)
}

fn framework_error<Err: ErrorMessage>(message: &str) -> Option<Value> {
    Err::from_framework_message(message).and_then(|e| serde_json::to_value(e).ok())
}

/// A typed handle on a [`CallDescription`].
///
/// Registration and in-process clients use the type parameters to check
/// handlers and requests at compile time; the router works on the erased
/// description.
pub struct Call<Req, Res, Err> {
    description: Arc<CallDescription>,
    _types: PhantomData<fn() -> (Req, Res, Err)>,
}

impl<Req, Res, Err> Clone for Call<Req, Res, Err> {
    fn clone(&self) -> Self {
        Self {
            description: Arc::clone(&self.description),
            _types: PhantomData,
        }
    }
}

impl<Req, Res, Err> fmt::Debug for Call<Req, Res, Err> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.description.fmt(f)
    }
}

impl<Req, Res, Err> Call<Req, Res, Err>
where
    Req: Message,
    Res: Message,
    Err: ErrorMessage,
{
    /// Starts describing a call.
    #[must_use]
    pub fn builder(namespace: impl Into<String>, name: impl Into<String>) -> CallBuilder<Req, Res, Err> {
        CallBuilder::new(namespace.into(), name.into())
    }
}

impl<Req, Res, Err> Call<Req, Res, Err> {
    /// The erased description.
    #[must_use]
    pub fn description(&self) -> &Arc<CallDescription> {
        &self.description
    }
}

/// Builder for [`Call`].
#[derive(Debug)]
#[must_use]
pub struct CallBuilder<Req, Res, Err> {
    namespace: String,
    name: String,
    method: Method,
    path: Vec<String>,
    params: Vec<ParamBinding>,
    body: BodyBinding,
    auth: Option<AuthRequirement>,
    proxy_to_gateway: bool,
    dispatch: DispatchMode,
    topic: Option<String>,
    partition_key: Option<String>,
    _types: PhantomData<fn() -> (Req, Res, Err)>,
}

impl<Req, Res, Err> CallBuilder<Req, Res, Err>
where
    Req: Message,
    Res: Message,
    Err: ErrorMessage,
{
    fn new(namespace: String, name: String) -> Self {
        Self {
            namespace,
            name,
            method: Method::GET,
            path: Vec::new(),
            params: Vec::new(),
            body: BodyBinding::None,
            auth: None,
            proxy_to_gateway: true,
            dispatch: DispatchMode::SyncOnly,
            topic: None,
            partition_key: None,
            _types: PhantomData,
        }
    }

    /// Sets the transport method (default `GET`).
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Appends segments to the path template.
    ///
    /// May be called repeatedly: `.path("/api/files").path("{id}")` yields
    /// `/api/files/{id}`. A placeholder names the request field it fills.
    pub fn path(mut self, segments: impl Into<String>) -> Self {
        self.path.push(segments.into());
        self
    }

    /// Appends a placeholder segment bound to `field`.
    pub fn bound(self, field: impl AsRef<str>) -> Self {
        let segment = format!("{{{}}}", field.as_ref());
        self.path(segment)
    }

    /// Binds the query parameter of the same name to a request field.
    pub fn param(self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.param_as(field.clone(), field)
    }

    /// Binds query parameter `query_name` to request field `field`.
    pub fn param_as(mut self, query_name: impl Into<String>, field: impl Into<String>) -> Self {
        self.params.push(ParamBinding {
            query_name: query_name.into(),
            field: field.into(),
        });
        self
    }

    /// Sets the body binding mode (default [`BodyBinding::None`]).
    pub fn body(mut self, body: BodyBinding) -> Self {
        self.body = body;
        self
    }

    /// Declares the access requirement.
    pub fn auth(mut self, auth: AuthRequirement) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Declares the call public.
    pub fn public(self) -> Self {
        self.auth(AuthRequirement::Public)
    }

    /// Whether the gateway routes this call (default `true`).
    pub fn proxy_to_gateway(mut self, proxy: bool) -> Self {
        self.proxy_to_gateway = proxy;
        self
    }

    /// Sets the dispatch mode (default [`DispatchMode::SyncOnly`]).
    pub fn dispatch(mut self, dispatch: DispatchMode) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Publishes to `topic` instead of the namespace topic.
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Uses a request field as the event partition key.
    pub fn partition_key(mut self, field: impl Into<String>) -> Self {
        self.partition_key = Some(field.into());
        self
    }

    /// Validates the description and seals it.
    pub fn build(self) -> Result<Call<Req, Res, Err>, DescriptionError> {
        let call = format!("{}.{}", self.namespace, self.name);
        let request = Req::descriptor();

        if !namespace_pattern().is_match(&self.namespace) {
            return Err(DescriptionError::InvalidIdentifier {
                call,
                value: self.namespace,
            });
        }
        if !name_pattern().is_match(&self.name) {
            return Err(DescriptionError::InvalidIdentifier {
                call,
                value: self.name,
            });
        }
        if !SUPPORTED_METHODS.contains(&self.method) {
            return Err(DescriptionError::UnsupportedMethod {
                call,
                method: self.method,
            });
        }

        let template = self.path.join("/");
        let path = parse_template(&template).map_err(|e| DescriptionError::InvalidPath {
            call: call.clone(),
            reason: e.to_string(),
        })?;

        let mut bound: Vec<&str> = Vec::new();

        for segment in &path {
            if let PathSegment::Param(field) = segment {
                if !scalar_field(&request, &call, field)? {
                    return Err(DescriptionError::OptionalPlaceholder {
                        call,
                        field: field.clone(),
                    });
                }
                bound.push(field);
            }
        }

        for (index, param) in self.params.iter().enumerate() {
            scalar_field(&request, &call, &param.field)?;
            if bound.contains(&param.field.as_str()) {
                return Err(DescriptionError::DoubleBinding {
                    call,
                    field: param.field.clone(),
                });
            }
            if self.params[..index]
                .iter()
                .any(|p| p.query_name == param.query_name)
            {
                return Err(DescriptionError::DuplicateParam {
                    call,
                    name: param.query_name.clone(),
                });
            }
            bound.push(&param.field);
        }

        match self.body {
            BodyBinding::EntireBody if !bound.is_empty() => {
                return Err(DescriptionError::EntireBodyWithBindings { call });
            }
            BodyBinding::None => {
                if let Some(unbound) = request.fields.iter().find(|f| !bound.contains(&f.name)) {
                    return Err(DescriptionError::UnboundField {
                        call,
                        field: unbound.name.to_string(),
                    });
                }
            }
            _ => {}
        }

        let auth = self
            .auth
            .ok_or_else(|| DescriptionError::MissingAuth { call: call.clone() })?;
        if matches!(&auth, AuthRequirement::Authenticated { roles, .. } if roles.is_empty()) {
            return Err(DescriptionError::NoRoles { call });
        }

        if let Some(key) = &self.partition_key {
            let scalar = request
                .field(key)
                .is_some_and(|f| f.kind.is_scalar());
            if !scalar {
                return Err(DescriptionError::InvalidPartitionKey {
                    call,
                    field: key.clone(),
                });
            }
        }
        if self.topic.is_some() && !self.dispatch.publishes() {
            return Err(DescriptionError::TopicWithoutLog { call });
        }
        if let Some(field) = request.skipped.first().filter(|_| self.dispatch.publishes()) {
            return Err(DescriptionError::LossyEvent {
                call,
                field: (*field).to_string(),
            });
        }

        let description = CallDescription {
            namespace: self.namespace,
            name: self.name,
            request,
            response: Res::descriptor(),
            error: Err::descriptor(),
            method: self.method,
            path,
            params: self.params,
            body: self.body,
            auth,
            proxy_to_gateway: self.proxy_to_gateway,
            dispatch: self.dispatch,
            topic: self.topic,
            partition_key: self.partition_key,
            normalize: normalize::<Req>,
            framework_error: framework_error::<Err>,
        };

        tracing::debug!(
            call = %description.full_name(),
            method = %description.method,
            template = %description.template(),
            "call description built"
        );

        Ok(Call {
            description: Arc::new(description),
            _types: PhantomData,
        })
    }
}

fn namespace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_-]*(\.[a-z][a-z0-9_-]*)*$").expect("valid regex"))
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").expect("valid regex"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CommonErrorMessage, Empty, FieldDescriptor};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct FileRequest {
        id: u64,
        path: Option<String>,
        tags: Vec<String>,
    }

    impl Message for FileRequest {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::new(
                "FileRequest",
                vec![
                    FieldDescriptor::of::<u64>("id", false),
                    FieldDescriptor::of::<Option<String>>("path", false),
                    FieldDescriptor::of::<Vec<String>>("tags", false),
                ],
            )
        }
    }

    type FileCall = Call<FileRequest, Empty, CommonErrorMessage>;

    fn base() -> CallBuilder<FileRequest, Empty, CommonErrorMessage> {
        FileCall::builder("files", "update")
            .method(Method::POST)
            .auth(AuthRequirement::read_write())
    }

    #[test]
    fn test_bound_fields_description() {
        let call = base()
            .path("/api/files")
            .bound("id")
            .param("path")
            .body(BodyBinding::BoundFields)
            .build()
            .unwrap();
        let description = call.description();

        assert_eq!(description.template(), "/api/files/{id}");
        assert_eq!(description.literal_prefix(), "/api/files");
        assert!(description.is_path_bound("id"));
        assert!(description.is_param_bound("path"));
        assert!(!description.is_param_bound("tags"));
        assert_eq!(description.full_name(), "files.update");
        assert!(description.proxy_to_gateway());
    }

    #[test]
    fn test_missing_auth_is_rejected() {
        let result = FileCall::builder("files", "update")
            .path("/api/files/{id}")
            .body(BodyBinding::BoundFields)
            .build();
        assert!(matches!(result, Err(DescriptionError::MissingAuth { .. })));
    }

    #[test]
    fn test_unknown_placeholder_field() {
        let result = base().path("/api/files/{fileId}").body(BodyBinding::BoundFields).build();
        assert!(matches!(
            result,
            Err(DescriptionError::UnknownField { field, .. }) if field == "fileId"
        ));
    }

    #[test]
    fn test_structured_field_cannot_be_a_param() {
        let result = base().path("/api/files/{id}").param("tags").body(BodyBinding::BoundFields).build();
        assert!(matches!(result, Err(DescriptionError::NotScalar { .. })));
    }

    #[test]
    fn test_optional_placeholder_is_rejected() {
        let result = base().path("/api/files/{path}").body(BodyBinding::BoundFields).build();
        assert!(matches!(result, Err(DescriptionError::OptionalPlaceholder { .. })));
    }

    #[test]
    fn test_field_bound_twice() {
        let result = base().path("/api/files/{id}").param("id").body(BodyBinding::BoundFields).build();
        assert!(matches!(result, Err(DescriptionError::DoubleBinding { .. })));
    }

    #[test]
    fn test_duplicate_query_name() {
        let result = base()
            .path("/api/files")
            .param_as("p", "id")
            .param_as("p", "path")
            .body(BodyBinding::BoundFields)
            .build();
        assert!(matches!(
            result,
            Err(DescriptionError::DuplicateParam { name, .. }) if name == "p"
        ));
    }

    #[test]
    fn test_entire_body_excludes_other_bindings() {
        let result = base().path("/api/files/{id}").body(BodyBinding::EntireBody).build();
        assert!(matches!(result, Err(DescriptionError::EntireBodyWithBindings { .. })));

        let ok = base().path("/api/files").body(BodyBinding::EntireBody).build();
        assert!(ok.is_ok());
    }

    #[test]
    fn test_no_body_requires_every_field_bound() {
        let result = base().path("/api/files/{id}").param("path").build();
        assert!(matches!(
            result,
            Err(DescriptionError::UnboundField { field, .. }) if field == "tags"
        ));
    }

    #[test]
    fn test_invalid_identifiers() {
        let result = FileCall::builder("Files", "update").public().build();
        assert!(matches!(result, Err(DescriptionError::InvalidIdentifier { .. })));
        let result = FileCall::builder("files", "").public().build();
        assert!(matches!(result, Err(DescriptionError::InvalidIdentifier { .. })));
    }

    #[test]
    fn test_unsupported_method() {
        let result = base().method(Method::TRACE).path("/api/files").body(BodyBinding::EntireBody).build();
        assert!(matches!(result, Err(DescriptionError::UnsupportedMethod { .. })));
    }

    #[test]
    fn test_partition_key_and_topic() {
        let call = base()
            .path("/api/files")
            .body(BodyBinding::EntireBody)
            .dispatch(DispatchMode::LogOnly)
            .topic("files.updates")
            .partition_key("id")
            .build()
            .unwrap();
        assert_eq!(call.description().topic(), Some("files.updates"));
        assert_eq!(call.description().partition_key(), Some("id"));

        let result = base()
            .path("/api/files")
            .body(BodyBinding::EntireBody)
            .dispatch(DispatchMode::LogOnly)
            .partition_key("tags")
            .build();
        assert!(matches!(result, Err(DescriptionError::InvalidPartitionKey { .. })));

        let result = base().path("/api/files").body(BodyBinding::EntireBody).topic("t").build();
        assert!(matches!(result, Err(DescriptionError::TopicWithoutLog { .. })));
    }

    #[test]
    fn test_required_scope_and_roles() {
        let call = base()
            .path("/api/files")
            .body(BodyBinding::EntireBody)
            .auth(AuthRequirement::read_write().in_project().with_roles(Role::PRIVILEGED))
            .build()
            .unwrap();
        let description = call.description();
        assert_eq!(description.required_scope().to_string(), "files:READ_WRITE");
        assert!(matches!(
            description.auth(),
            AuthRequirement::Authenticated { requires_project: true, roles, .. } if roles.len() == 2
        ));

        let result = base()
            .path("/api/files")
            .body(BodyBinding::EntireBody)
            .auth(AuthRequirement::read().with_roles(&[]))
            .build();
        assert!(matches!(result, Err(DescriptionError::NoRoles { .. })));
    }

    #[test]
    fn test_normalize_and_framework_error() {
        let call = base().path("/api/files").body(BodyBinding::EntireBody).build().unwrap();
        let description = call.description();

        let value = description
            .normalize_request(serde_json::json!({"id": 1, "tags": []}))
            .unwrap();
        assert_eq!(value, serde_json::json!({"id": 1, "path": null, "tags": []}));
        assert!(description
            .normalize_request(serde_json::json!({"id": "one", "tags": []}))
            .is_err());

        assert_eq!(
            description.framework_error_body("nope"),
            Some(serde_json::json!({"why": "nope"}))
        );
    }

    #[test]
    fn test_root_template() {
        let call = Call::<Empty, Empty, Empty>::builder("health", "ping").public().build().unwrap();
        assert_eq!(call.description().template(), "/");
        assert_eq!(call.description().literal_prefix(), "/");
    }
}
