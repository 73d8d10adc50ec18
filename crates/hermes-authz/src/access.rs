//! Read-only state of principals.
//!
//! Whether a principal may currently write (an account can be suspended or
//! put in read-only mode) is owned by the identity service, not by Hermes.
//! The gate asks an [`AccessStateResolver`] for it on every `READ_WRITE`
//! call.

use std::collections::HashSet;

use hermes_core::Principal;
use parking_lot::RwLock;

/// Resolves whether a principal is currently restricted to reads.
pub trait AccessStateResolver: Send + Sync + 'static {
    /// Returns `true` if `principal` may not invoke `READ_WRITE` calls.
    fn is_restricted(&self, principal: &Principal) -> bool;
}

/// Treats every principal as unrestricted.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessStateResolver for AllowAll {
    fn is_restricted(&self, _principal: &Principal) -> bool {
        false
    }
}

/// An in-memory set of read-only usernames that can change at runtime.
///
/// # Example
///
/// ```rust
/// use hermes_authz::{AccessStateResolver, ReadOnlyUsers};
/// use hermes_core::Principal;
///
/// let users = ReadOnlyUsers::new();
/// users.restrict("mallory");
///
/// assert!(users.is_restricted(&Principal::user("mallory")));
/// assert!(!users.is_restricted(&Principal::user("alice")));
/// ```
#[derive(Debug, Default)]
pub struct ReadOnlyUsers {
    usernames: RwLock<HashSet<String>>,
}

impl ReadOnlyUsers {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts `username` in read-only mode.
    pub fn restrict(&self, username: impl Into<String>) {
        self.usernames.write().insert(username.into());
    }

    /// Lifts the read-only mode of `username`.
    pub fn lift(&self, username: &str) -> bool {
        self.usernames.write().remove(username)
    }
}

impl AccessStateResolver for ReadOnlyUsers {
    fn is_restricted(&self, principal: &Principal) -> bool {
        self.usernames.read().contains(&principal.username)
    }
}
