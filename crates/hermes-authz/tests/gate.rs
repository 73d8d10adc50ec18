//! Tests for the auth gate.

use std::sync::Arc;

use hermes_authz::{AuthGate, Decision, ReadOnlyUsers};
use hermes_core::{
    AuthRequirement, BodyBinding, Call, CallDescription, CommonErrorMessage, DenyReason, Empty,
    Principal, RequestContext, Role, SecurityScope,
};
use hermes_macros::Message;
use http::Method;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Message)]
struct Favorite {
    id: u64,
}

fn call(namespace: &str, auth: AuthRequirement) -> Arc<CallDescription> {
    Call::<Favorite, Empty, CommonErrorMessage>::builder(namespace, "toggle")
        .method(Method::POST)
        .path("/api/favorites")
        .body(BodyBinding::EntireBody)
        .auth(auth)
        .build()
        .unwrap()
        .description()
        .clone()
}

fn alice() -> RequestContext {
    RequestContext::new().with_principal(Principal::user("alice"))
}

fn scoped(scopes: &[&str]) -> RequestContext {
    let scopes = scopes.iter().map(|s| s.parse::<SecurityScope>().unwrap()).collect();
    RequestContext::new().with_principal(Principal::user("bob").with_scopes(scopes))
}

#[test]
fn test_public_allows_anonymous() {
    let gate = AuthGate::default();
    let description = call("files", AuthRequirement::Public);
    assert_eq!(gate.evaluate(&RequestContext::new(), &description), Decision::Allow);
}

#[test]
fn test_anonymous_is_unauthenticated() {
    let gate = AuthGate::default();
    let description = call("files", AuthRequirement::read());
    let decision = gate.evaluate(&RequestContext::new(), &description);
    assert_eq!(decision, Decision::Deny(DenyReason::Unauthenticated));
    assert_eq!(decision.into_result(), Err(DenyReason::Unauthenticated));
}

#[test]
fn test_role_outside_allowed_set() {
    let gate = AuthGate::default();
    let description = call("admin", AuthRequirement::read().with_roles(Role::PRIVILEGED));
    assert_eq!(
        gate.evaluate(&alice(), &description),
        Decision::Deny(DenyReason::InsufficientRight)
    );

    let admin = RequestContext::new().with_principal(Principal::new("root", Role::Admin));
    assert!(gate.evaluate(&admin, &description).is_allowed());
}

#[test]
fn test_read_only_principal_can_read_but_not_write() {
    let users = Arc::new(ReadOnlyUsers::new());
    users.restrict("alice");
    let gate = AuthGate::from_arc(users.clone());

    assert!(gate.evaluate(&alice(), &call("files", AuthRequirement::read())).is_allowed());
    assert_eq!(
        gate.evaluate(&alice(), &call("files", AuthRequirement::read_write())),
        Decision::Deny(DenyReason::InsufficientRight)
    );

    assert!(users.lift("alice"));
    assert!(gate
        .evaluate(&alice(), &call("files", AuthRequirement::read_write()))
        .is_allowed());
}

#[test]
fn test_restricted_scopes() {
    let gate = AuthGate::default();
    let write = call("files.favorite", AuthRequirement::read_write());
    let read = call("files.favorite", AuthRequirement::read());

    assert!(gate.evaluate(&scoped(&["files:READ_WRITE"]), &write).is_allowed());
    assert!(gate.evaluate(&scoped(&["all:READ_WRITE"]), &write).is_allowed());
    assert!(gate.evaluate(&scoped(&["files.favorite:READ_WRITE"]), &read).is_allowed());
    assert_eq!(
        gate.evaluate(&scoped(&["files.favorite:READ"]), &write),
        Decision::Deny(DenyReason::InsufficientRight)
    );
    assert_eq!(
        gate.evaluate(&scoped(&["projects:READ_WRITE"]), &read),
        Decision::Deny(DenyReason::InsufficientRight)
    );
    assert_eq!(
        gate.evaluate(&scoped(&[]), &read),
        Decision::Deny(DenyReason::InsufficientRight)
    );
}

#[test]
fn test_project_requirement() {
    let gate = AuthGate::default();
    let description = call("projects", AuthRequirement::read_write().in_project());
    assert_eq!(
        gate.evaluate(&alice(), &description),
        Decision::Deny(DenyReason::MissingProject)
    );
    assert!(gate
        .evaluate(&alice().with_project("p-1"), &description)
        .is_allowed());
}

#[test]
fn test_unauthenticated_precedes_missing_project() {
    let gate = AuthGate::default();
    let description = call("projects", AuthRequirement::read().in_project());
    assert_eq!(
        gate.evaluate(&RequestContext::new(), &description),
        Decision::Deny(DenyReason::Unauthenticated)
    );
}
