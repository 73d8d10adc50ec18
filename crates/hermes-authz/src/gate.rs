//! The auth gate.

use std::sync::Arc;

use hermes_core::{AccessRight, AuthRequirement, CallDescription, DenyReason, RequestContext};
use tracing::{debug, instrument};

use crate::access::{AccessStateResolver, AllowAll};

/// Outcome of evaluating a request against a call's requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The request may proceed.
    Allow,
    /// The request is rejected.
    Deny(DenyReason),
}

impl Decision {
    /// Returns `true` if the request may proceed.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Converts the decision into a result.
    pub fn into_result(self) -> Result<(), DenyReason> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(reason) => Err(reason),
        }
    }
}

/// Evaluates [`AuthRequirement`]s.
///
/// Checks run in a fixed order and the first failing check decides:
///
/// 1. `Public` calls are allowed.
/// 2. No principal: `Unauthenticated`.
/// 3. Role outside the allowed set: `InsufficientRight`.
/// 4. Restricted scope list that does not cover the call's required scope:
///    `InsufficientRight`.
/// 5. `READ_WRITE` call and the principal is read-only: `InsufficientRight`.
/// 6. Project required and none resolved: `MissingProject`.
///
/// # Example
///
/// ```rust
/// use hermes_authz::{AuthGate, Decision};
/// use hermes_core::{AuthRequirement, Call, CommonErrorMessage, DenyReason, Empty, Principal, RequestContext};
///
/// let call = Call::<Empty, Empty, CommonErrorMessage>::builder("projects", "list")
///     .path("/api/projects")
///     .auth(AuthRequirement::read().in_project())
///     .build()
///     .unwrap();
///
/// let gate = AuthGate::default();
/// let anonymous = RequestContext::new();
/// assert_eq!(gate.evaluate(&anonymous, call.description()), Decision::Deny(DenyReason::Unauthenticated));
///
/// let alice = RequestContext::new().with_principal(Principal::user("alice")).with_project("p-1");
/// assert!(gate.evaluate(&alice, call.description()).is_allowed());
/// ```
#[derive(Clone)]
pub struct AuthGate {
    access_state: Arc<dyn AccessStateResolver>,
}

impl Default for AuthGate {
    fn default() -> Self {
        Self::new(AllowAll)
    }
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate").finish_non_exhaustive()
    }
}

impl AuthGate {
    /// Creates a gate that consults `access_state` for read-only principals.
    #[must_use]
    pub fn new(access_state: impl AccessStateResolver) -> Self {
        Self::from_arc(Arc::new(access_state))
    }

    /// Creates a gate from a shared resolver.
    #[must_use]
    pub fn from_arc(access_state: Arc<dyn AccessStateResolver>) -> Self {
        Self { access_state }
    }

    /// Evaluates the request context against the call's requirement.
    #[instrument(skip_all, fields(call = %description.full_name()))]
    pub fn evaluate(&self, ctx: &RequestContext, description: &CallDescription) -> Decision {
        let decision = self.decide(ctx, description);
        if let Decision::Deny(reason) = decision {
            debug!(
                principal = ctx.principal().map(|p| p.log_id()).as_deref().unwrap_or("anonymous"),
                ?reason,
                "request denied"
            );
        }
        decision
    }

    fn decide(&self, ctx: &RequestContext, description: &CallDescription) -> Decision {
        let AuthRequirement::Authenticated {
            access,
            requires_project,
            roles,
        } = description.auth()
        else {
            return Decision::Allow;
        };

        let Some(principal) = ctx.principal() else {
            return Decision::Deny(DenyReason::Unauthenticated);
        };

        if !roles.contains(&principal.role) {
            return Decision::Deny(DenyReason::InsufficientRight);
        }

        if let Some(scopes) = &principal.scopes {
            let required = description.required_scope();
            if !scopes.iter().any(|scope| scope.covers(&required)) {
                return Decision::Deny(DenyReason::InsufficientRight);
            }
        }

        if *access == AccessRight::ReadWrite && self.access_state.is_restricted(principal) {
            return Decision::Deny(DenyReason::InsufficientRight);
        }

        if *requires_project && ctx.project().is_none() {
            return Decision::Deny(DenyReason::MissingProject);
        }

        Decision::Allow
    }
}
