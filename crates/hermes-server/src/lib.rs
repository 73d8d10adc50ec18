//! # Hermes Server
//!
//! The call registry and the server-side router.
//!
//! This crate wires the other Hermes stages together:
//!
//! - [`RegistryBuilder`] / [`Registry`]: calls registered at boot, sealed
//!   into an immutable table shared by `Arc`
//! - [`CallRouter`]: resolves, authorizes, decodes and dispatches each
//!   transport request
//! - [`PrincipalResolver`]: the collaborator that identifies callers
//! - [`InProcessClient`]: typed calls through a router without a network hop
//!
//! The transport loop itself is not part of Hermes: anything that can turn
//! a connection into `http::Request<Bytes>` and back can drive
//! [`CallRouter::handle`].
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut builder = RegistryBuilder::new(Dispatcher::from_config(log, &config.dispatch));
//! builder
//!     .register(&files::usage(), usage_handler)?
//!     .register_command(&projects::create())?;
//! let registry = builder.build();
//!
//! let router = CallRouter::from_config(Arc::clone(&registry), &config)
//!     .with_principal_resolver(HeaderPrincipalResolver);
//! let response = router.handle(request).await;
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod principal;
mod registry;
mod router;

pub use client::InProcessClient;
pub use error::{InvokeError, RegistryError};
pub use principal::{Anonymous, HeaderPrincipalResolver, PrincipalResolver};
pub use registry::{
    ConflictKind, RegisteredCall, RegistrationWarning, Registry, RegistryBuilder, Resolved,
};
pub use router::{CallRouter, PROJECT_HEADER, REQUEST_ID_HEADER};
