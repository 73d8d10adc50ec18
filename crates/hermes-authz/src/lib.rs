//! # Hermes Authz
//!
//! The auth gate every request passes before its body is decoded and before
//! any handler runs or any event is published.
//!
//! Hermes is not an identity provider. It receives an already resolved
//! [`Principal`](hermes_core::Principal) (username, role and an optional
//! restricted scope list) on the request context and asks an
//! [`AccessStateResolver`] whether that principal is currently read-only.
//!
//! # Architecture
//!
//! ```text
//!   RequestContext ──┐
//!                    ▼
//!   CallDescription ─► AuthGate ─► Decision (Allow | Deny(reason))
//!                    ▲
//!   AccessStateResolver (read-only principals)
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-authz/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod access;
mod gate;

pub use access::{AccessStateResolver, AllowAll, ReadOnlyUsers};
pub use gate::{AuthGate, Decision};
