//! The call registry.
//!
//! Services register their calls on a [`RegistryBuilder`] at boot. The
//! builder checks identities, plans each call's dispatch and inserts its
//! route; [`RegistryBuilder::build`] then seals everything into an immutable
//! [`Registry`] that the router and the gateway table builder share by `Arc`.
//!
//! Route conflicts are reported here, never at request time: when two
//! templates can serve the same path with the same method, the first
//! registered call wins and a [`RegistrationWarning`] is logged and kept.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use hermes_core::{Call, CallDescription, ErrorMessage, Handler, Message};
use hermes_dispatch::{Dispatch, Dispatcher, ErasedHandler};
use hermes_router::{InsertOutcome, Lookup, Params, Router};
use http::Method;
use tracing::{debug, info, warn};

use crate::error::RegistryError;

/// A registered call: its description and its planned dispatch.
#[derive(Debug, Clone)]
pub struct RegisteredCall {
    description: Arc<CallDescription>,
    dispatch: Dispatch,
}

impl RegisteredCall {
    /// The call's description.
    #[must_use]
    pub fn description(&self) -> &CallDescription {
        &self.description
    }

    /// How the call is dispatched.
    #[must_use]
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }
}

/// How a new route collides with an earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// Both templates can match some paths; the earlier one wins those.
    Ambiguous,
    /// The templates have the same shape; the new route is unreachable.
    Shadowed,
}

/// A route conflict found while registering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationWarning {
    /// Identity of the call registered last.
    pub call: String,
    /// Its method.
    pub method: Method,
    /// Its template.
    pub template: String,
    /// Identity of the earlier call that wins, when known.
    pub existing_call: Option<String>,
    /// Template of the earlier call.
    pub existing_template: String,
    /// Kind of collision.
    pub kind: ConflictKind,
}

impl fmt::Display for RegistrationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.kind {
            ConflictKind::Ambiguous => "overlaps",
            ConflictKind::Shadowed => "is shadowed by",
        };
        write!(
            f,
            "{} {} ({}) {} {}",
            self.method, self.template, self.call, verb, self.existing_template
        )?;
        if let Some(existing) = &self.existing_call {
            write!(f, " ({existing})")?;
        }
        Ok(())
    }
}

/// Result of [`Registry::resolve`].
#[derive(Debug)]
pub enum Resolved<'a> {
    /// A call serves the method and path.
    Found {
        /// The call.
        call: &'a RegisteredCall,
        /// Raw placeholder values captured from the path.
        params: Params,
    },
    /// Calls serve the path, but none for this method.
    MethodNotAllowed(Vec<Method>),
    /// No call serves the path.
    NotFound,
}

/// Collects calls at boot.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use hermes_dispatch::{Dispatcher, InMemoryEventLog};
/// use hermes_server::RegistryBuilder;
///
/// let registry = RegistryBuilder::new(Dispatcher::new(Arc::new(InMemoryEventLog::new()))).build();
/// assert!(registry.is_empty());
/// ```
pub struct RegistryBuilder {
    dispatcher: Arc<Dispatcher>,
    calls: Vec<RegisteredCall>,
    identities: HashSet<(String, String)>,
    router: Router<usize>,
    warnings: Vec<RegistrationWarning>,
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("calls", &self.calls.len())
            .field("warnings", &self.warnings)
            .finish_non_exhaustive()
    }
}

impl RegistryBuilder {
    /// Creates an empty builder whose calls are dispatched by `dispatcher`.
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            calls: Vec::new(),
            identities: HashSet::new(),
            router: Router::new(),
            warnings: Vec::new(),
        }
    }

    /// Registers a call served by `handler`.
    ///
    /// # Errors
    ///
    /// Fails on a duplicate identity, an unroutable path, or a log-only
    /// call (those are registered with [`register_command`](Self::register_command)).
    pub fn register<Req, Res, Err, H>(
        &mut self,
        call: &Call<Req, Res, Err>,
        handler: H,
    ) -> Result<&mut Self, RegistryError>
    where
        Req: Message,
        Res: Message,
        Err: ErrorMessage,
        H: Handler<Req, Res, Err>,
    {
        self.add(call.description(), Some(ErasedHandler::new(handler)))
    }

    /// Registers a log-only call: requests are published and acknowledged,
    /// and consumers apply them later.
    ///
    /// # Errors
    ///
    /// Fails on a duplicate identity, an unroutable path, or a call whose
    /// dispatch mode needs a handler.
    pub fn register_command<Req, Res, Err>(
        &mut self,
        call: &Call<Req, Res, Err>,
    ) -> Result<&mut Self, RegistryError>
    where
        Req: Message,
        Res: Message,
        Err: ErrorMessage,
    {
        self.add(call.description(), None)
    }

    fn add(
        &mut self,
        description: &Arc<CallDescription>,
        handler: Option<ErasedHandler>,
    ) -> Result<&mut Self, RegistryError> {
        let call = description.full_name();
        let identity = (
            description.namespace().to_string(),
            description.name().to_string(),
        );
        if self.identities.contains(&identity) {
            return Err(RegistryError::DuplicateCall { call });
        }

        let dispatch = self.dispatcher.plan(description, handler)?;

        let template = description.template();
        let outcome = self
            .router
            .insert(description.method(), &template, self.calls.len())
            .map_err(|source| RegistryError::Route {
                call: call.clone(),
                source,
            })?;

        let conflict = match outcome {
            InsertOutcome::Inserted => None,
            InsertOutcome::Ambiguous { existing } => Some((ConflictKind::Ambiguous, existing)),
            InsertOutcome::Shadowed { existing } => Some((ConflictKind::Shadowed, existing)),
        };
        if let Some((kind, existing_template)) = conflict {
            let existing_call = self
                .calls
                .iter()
                .map(RegisteredCall::description)
                .find(|d| d.method() == description.method() && d.template() == existing_template)
                .map(CallDescription::full_name);
            let warning = RegistrationWarning {
                call: call.clone(),
                method: description.method().clone(),
                template: template.clone(),
                existing_call,
                existing_template,
                kind,
            };
            warn!(warning = %warning, "route conflict, first registered call wins");
            self.warnings.push(warning);
        }

        debug!(
            call = %call,
            method = %description.method(),
            template = %template,
            topic = dispatch.topic().unwrap_or("-"),
            "call registered"
        );

        self.identities.insert(identity);
        self.calls.push(RegisteredCall {
            description: Arc::clone(description),
            dispatch,
        });
        Ok(self)
    }

    /// Route conflicts found so far.
    #[must_use]
    pub fn warnings(&self) -> &[RegistrationWarning] {
        &self.warnings
    }

    /// Seals the registry.
    #[must_use]
    pub fn build(self) -> Arc<Registry> {
        info!(
            calls = self.calls.len(),
            warnings = self.warnings.len(),
            "registry built"
        );
        Arc::new(Registry {
            dispatcher: self.dispatcher,
            calls: self.calls,
            router: self.router,
            warnings: self.warnings,
        })
    }
}

/// The immutable set of registered calls.
pub struct Registry {
    dispatcher: Arc<Dispatcher>,
    calls: Vec<RegisteredCall>,
    router: Router<usize>,
    warnings: Vec<RegistrationWarning>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("calls", &self.calls.len())
            .field("warnings", &self.warnings)
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Number of registered calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Returns `true` if no call is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Looks a call up by identity.
    #[must_use]
    pub fn get(&self, namespace: &str, name: &str) -> Option<&RegisteredCall> {
        self.calls.iter().find(|c| {
            c.description.namespace() == namespace && c.description.name() == name
        })
    }

    /// Descriptions in registration order.
    pub fn descriptions(&self) -> impl Iterator<Item = &CallDescription> + '_ {
        self.calls.iter().map(RegisteredCall::description)
    }

    /// Route conflicts found while building.
    #[must_use]
    pub fn warnings(&self) -> &[RegistrationWarning] {
        &self.warnings
    }

    /// The dispatcher shared by all calls.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Resolves a method and path (without query string) to a call.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Resolved<'_> {
        match self.router.lookup(method, path) {
            Lookup::Found(found) => match self.calls.get(*found.value) {
                Some(call) => Resolved::Found {
                    call,
                    params: found.params,
                },
                None => Resolved::NotFound,
            },
            Lookup::MethodNotAllowed(allowed) => Resolved::MethodNotAllowed(allowed),
            Lookup::NotFound => Resolved::NotFound,
        }
    }
}
