//! Radix tree route matcher for Hermes.
//!
//! Every call description registers one `(method, path template)` pair. This
//! crate stores those pairs in a radix tree keyed by path segment and answers
//! "which registered route serves this request?" with a deterministic
//! specificity rule:
//!
//! 1. Only templates whose segments all match the path are candidates.
//! 2. Among candidates registered for the request method, the one with the
//!    **fewest placeholders** wins.
//! 3. Ties go to the route registered first.
//!
//! Ties are never silently resolved at request time: [`Router::insert`]
//! reports them as an [`InsertOutcome::Ambiguous`] (or, for an identical
//! template, [`InsertOutcome::Shadowed`]) so callers can log them at boot.
//!
//! # Example
//!
//! ```rust
//! use hermes_router::{Lookup, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.insert(&Method::GET, "/api/x/{id}", "byId").unwrap();
//! router.insert(&Method::GET, "/api/x/literal", "literal").unwrap();
//!
//! match router.lookup(&Method::GET, "/api/x/literal") {
//!     Lookup::Found(m) => assert_eq!(*m.value, "literal"),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//!                (root)
//!                  │
//!                "api"
//!                  │
//!                 "x"
//!            ┌─────┴─────┐
//!       "literal"      "{id}"
//!         [GET]         [GET]
//! ```

mod method_router;
mod node;
mod params;
mod router;
mod template;

pub use method_router::{Endpoint, MethodRouter};
pub use params::Params;
pub use router::{InsertOutcome, Lookup, Router};

use thiserror::Error;

/// A matched route with its registered value and extracted placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a, T> {
    /// The value registered for the route
    pub value: &'a T,
    /// The template the route was registered with
    pub template: &'a str,
    /// Raw (still percent-encoded) placeholder values
    pub params: Params,
}

/// Errors raised while registering a route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// The template could not be parsed.
    #[error(transparent)]
    InvalidTemplate(#[from] hermes_core::TemplateError),

    /// The method is outside the supported verb set.
    #[error("unsupported method: {0}")]
    UnsupportedMethod(http::Method),
}
