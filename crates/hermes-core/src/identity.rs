//! Caller identity types.
//!
//! Hermes does not authenticate anyone. A principal is resolved by an
//! external collaborator (token verifier, trusted proxy headers) and handed to
//! the router; the types here only describe what was resolved.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Access level a call requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessRight {
    /// Read-only access.
    Read,
    /// Read and mutate.
    ReadWrite,
}

impl AccessRight {
    /// Returns `true` if holding `self` grants `other`.
    #[must_use]
    pub const fn covers(self, other: Self) -> bool {
        matches!((self, other), (Self::ReadWrite, _) | (Self::Read, Self::Read))
    }

    /// Wire name of the right.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::ReadWrite => "READ_WRITE",
        }
    }
}

impl fmt::Display for AccessRight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform role of a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// An end user.
    User,
    /// A platform administrator.
    Admin,
    /// Another service of the platform.
    Service,
    /// A proxy acting on behalf of a project.
    ProjectProxy,
}

impl Role {
    /// Roles accepted by an authenticated call that does not narrow its role set.
    pub const AUTHENTICATED: &'static [Role] =
        &[Role::User, Role::Admin, Role::Service, Role::ProjectProxy];

    /// Roles of privileged callers.
    pub const PRIVILEGED: &'static [Role] = &[Role::Admin, Role::Service];
}

impl FromStr for Role {
    type Err = ScopeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Self::User),
            "ADMIN" => Ok(Self::Admin),
            "SERVICE" => Ok(Self::Service),
            "PROJECT_PROXY" => Ok(Self::ProjectProxy),
            other => Err(ScopeParseError::UnknownRole(other.to_string())),
        }
    }
}

/// A security scope such as `files.favorite:READ_WRITE`.
///
/// Every call has a required scope derived from its namespace. A principal
/// holding an extended (restricted) token carries an explicit scope list and
/// may only reach calls one of its scopes covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SecurityScope {
    /// Dotted namespace segments; `["all"]` is the universal scope.
    pub segments: Vec<String>,
    /// Access level.
    pub access: AccessRight,
}

/// The segment that grants every namespace.
pub const ALL_SCOPES: &str = "all";

impl SecurityScope {
    /// Builds the scope for a namespace.
    #[must_use]
    pub fn for_namespace(namespace: &str, access: AccessRight) -> Self {
        Self {
            segments: namespace.split('.').map(ToString::to_string).collect(),
            access,
        }
    }

    /// The universal scope.
    #[must_use]
    pub fn all(access: AccessRight) -> Self {
        Self {
            segments: vec![ALL_SCOPES.to_string()],
            access,
        }
    }

    /// Returns `true` if this scope grants `required`.
    ///
    /// `all` covers everything, a namespace covers its dotted children, and
    /// `READ_WRITE` covers `READ`.
    #[must_use]
    pub fn covers(&self, required: &SecurityScope) -> bool {
        if !self.access.covers(required.access) {
            return false;
        }
        if self.segments.len() == 1 && self.segments[0] == ALL_SCOPES {
            return true;
        }
        self.segments.len() <= required.segments.len()
            && self.segments.iter().zip(&required.segments).all(|(a, b)| a == b)
    }
}

impl fmt::Display for SecurityScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.segments.join("."), self.access)
    }
}

/// Errors parsing a scope or role from its wire form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeParseError {
    /// Missing `:` separator.
    #[error("scope '{0}' is missing an access right")]
    MissingAccess(String),
    /// Unknown access right.
    #[error("unknown access right '{0}'")]
    UnknownAccess(String),
    /// Empty namespace segment.
    #[error("scope '{0}' has an empty segment")]
    EmptySegment(String),
    /// Unknown role name.
    #[error("unknown role '{0}'")]
    UnknownRole(String),
}

impl FromStr for SecurityScope {
    type Err = ScopeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, access) = s
            .rsplit_once(':')
            .ok_or_else(|| ScopeParseError::MissingAccess(s.to_string()))?;
        let access = match access {
            "READ" => AccessRight::Read,
            "READ_WRITE" => AccessRight::ReadWrite,
            other => return Err(ScopeParseError::UnknownAccess(other.to_string())),
        };
        let segments: Vec<String> = namespace.split('.').map(ToString::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(ScopeParseError::EmptySegment(s.to_string()));
        }
        Ok(Self { segments, access })
    }
}

impl TryFrom<String> for SecurityScope {
    type Error = ScopeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SecurityScope> for String {
    fn from(scope: SecurityScope) -> Self {
        scope.to_string()
    }
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Unique username.
    pub username: String,
    /// Platform role.
    pub role: Role,
    /// Restricted scope list; `None` means the principal is not scope-limited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<SecurityScope>>,
}

impl Principal {
    /// Creates an unrestricted principal.
    #[must_use]
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
            scopes: None,
        }
    }

    /// Creates an end-user principal.
    #[must_use]
    pub fn user(username: impl Into<String>) -> Self {
        Self::new(username, Role::User)
    }

    /// Restricts the principal to the given scopes.
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<SecurityScope>) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Returns an identifier suitable for logging.
    #[must_use]
    pub fn log_id(&self) -> String {
        format!("{}:{}", self.role_name(), self.username)
    }

    fn role_name(&self) -> &'static str {
        match self.role {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Service => "service",
            Role::ProjectProxy => "project_proxy",
        }
    }
}
