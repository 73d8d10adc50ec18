//! Principal resolution.
//!
//! The router does not authenticate callers. A [`PrincipalResolver`] turns
//! the request headers into a [`Principal`] that an upstream component has
//! already verified, or `None` for anonymous callers.

use hermes_core::{Principal, Role, SecurityScope};
use http::{HeaderMap, HeaderValue};
use tracing::debug;

/// Resolves the caller of a request.
pub trait PrincipalResolver: Send + Sync + 'static {
    /// Returns the verified principal, or `None` for an anonymous caller.
    fn resolve(&self, headers: &HeaderMap) -> Option<Principal>;
}

impl<F> PrincipalResolver for F
where
    F: Fn(&HeaderMap) -> Option<Principal> + Send + Sync + 'static,
{
    fn resolve(&self, headers: &HeaderMap) -> Option<Principal> {
        self(headers)
    }
}

/// Treats every caller as anonymous.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl PrincipalResolver for Anonymous {
    fn resolve(&self, _headers: &HeaderMap) -> Option<Principal> {
        None
    }
}

/// Reads the principal from headers set by a trusted front proxy.
///
/// | Header | Content | Default |
/// |--------|---------|---------|
/// | `x-hermes-user` | username | required |
/// | `x-hermes-role` | `USER`, `ADMIN`, `SERVICE`, `PROJECT_PROXY` | `USER` |
/// | `x-hermes-scopes` | comma separated scopes (`files:READ, all:READ`) | unrestricted |
///
/// A malformed role or scope makes the caller anonymous.
///
/// # Example
///
/// ```
/// use hermes_core::Role;
/// use hermes_server::{HeaderPrincipalResolver, PrincipalResolver};
/// use http::HeaderMap;
///
/// let mut headers = HeaderMap::new();
/// headers.insert("x-hermes-user", "alice".parse().unwrap());
/// headers.insert("x-hermes-role", "ADMIN".parse().unwrap());
///
/// let principal = HeaderPrincipalResolver::default().resolve(&headers).unwrap();
/// assert_eq!(principal.username, "alice");
/// assert_eq!(principal.role, Role::Admin);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderPrincipalResolver;

impl HeaderPrincipalResolver {
    /// Username header.
    pub const USER: &'static str = "x-hermes-user";
    /// Role header.
    pub const ROLE: &'static str = "x-hermes-role";
    /// Scope list header.
    pub const SCOPES: &'static str = "x-hermes-scopes";

    /// Writes `principal` into `headers` in the form [`resolve`](PrincipalResolver::resolve) reads.
    ///
    /// Values that are not valid header text are skipped.
    pub fn write(principal: &Principal, headers: &mut HeaderMap) {
        if let Ok(value) = HeaderValue::from_str(&principal.username) {
            headers.insert(Self::USER, value);
        }
        headers.insert(Self::ROLE, HeaderValue::from_static(role_name(principal.role)));
        if let Some(scopes) = &principal.scopes {
            let joined = scopes
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            if let Ok(value) = HeaderValue::from_str(&joined) {
                headers.insert(Self::SCOPES, value);
            }
        }
    }
}

impl PrincipalResolver for HeaderPrincipalResolver {
    fn resolve(&self, headers: &HeaderMap) -> Option<Principal> {
        let username = header(headers, Self::USER).filter(|u| !u.is_empty())?;

        let role = match header(headers, Self::ROLE) {
            Some(role) => match role.parse::<Role>() {
                Ok(role) => role,
                Err(e) => {
                    debug!(error = %e, "ignoring principal with unknown role");
                    return None;
                }
            },
            None => Role::User,
        };

        let mut principal = Principal::new(username, role);
        if let Some(list) = header(headers, Self::SCOPES) {
            let scopes: Result<Vec<SecurityScope>, _> = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::parse)
                .collect();
            match scopes {
                Ok(scopes) => principal = principal.with_scopes(scopes),
                Err(e) => {
                    debug!(error = %e, "ignoring principal with malformed scopes");
                    return None;
                }
            }
        }
        Some(principal)
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

const fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "USER",
        Role::Admin => "ADMIN",
        Role::Service => "SERVICE",
        Role::ProjectProxy => "PROJECT_PROXY",
    }
}

#[cfg(test)]
mod tests {
    use hermes_core::AccessRight;

    use super::*;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, value.parse().unwrap());
        }
        map
    }

    #[test]
    fn test_missing_user_is_anonymous() {
        assert!(HeaderPrincipalResolver.resolve(&HeaderMap::new()).is_none());
        assert!(HeaderPrincipalResolver
            .resolve(&headers(&[("x-hermes-user", "")]))
            .is_none());
    }

    #[test]
    fn test_role_defaults_to_user() {
        let principal = HeaderPrincipalResolver
            .resolve(&headers(&[("x-hermes-user", "bob")]))
            .unwrap();
        assert_eq!(principal, Principal::user("bob"));
    }

    #[test]
    fn test_scopes_are_parsed() {
        let principal = HeaderPrincipalResolver
            .resolve(&headers(&[
                ("x-hermes-user", "ci"),
                ("x-hermes-role", "SERVICE"),
                ("x-hermes-scopes", "files:READ, projects.tasks:READ_WRITE"),
            ]))
            .unwrap();
        let scopes = principal.scopes.unwrap();
        assert_eq!(scopes.len(), 2);
        assert_eq!(scopes[1].access, AccessRight::ReadWrite);
    }

    #[test]
    fn test_malformed_values_are_anonymous() {
        assert!(HeaderPrincipalResolver
            .resolve(&headers(&[("x-hermes-user", "x"), ("x-hermes-role", "ROOT")]))
            .is_none());
        assert!(HeaderPrincipalResolver
            .resolve(&headers(&[("x-hermes-user", "x"), ("x-hermes-scopes", "files")]))
            .is_none());
    }

    #[test]
    fn test_write_then_resolve() {
        let principal = Principal::new("svc", Role::Service)
            .with_scopes(vec!["files:READ".parse().unwrap()]);
        let mut map = HeaderMap::new();
        HeaderPrincipalResolver::write(&principal, &mut map);
        assert_eq!(HeaderPrincipalResolver.resolve(&map), Some(principal));
    }

    #[test]
    fn test_closures_resolve() {
        let resolver = |_: &HeaderMap| Some(Principal::user("fixed"));
        assert_eq!(resolver.resolve(&HeaderMap::new()).unwrap().username, "fixed");
    }
}
