//! # Hermes
//!
//! **Declarative call descriptions with dual dispatch**
//!
//! Every operation of a service is declared once, as a call description that
//! binds a typed request, response and error to:
//!
//! - an HTTP route with structured field binding (path, query, body),
//! - and, for commands, an append-only ordered event log that consumers
//!   materialize from.
//!
//! The same description drives server-side decoding, the in-process client,
//! the auth gate and the gateway route table.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hermes::prelude::*;
//!
//! #[derive(Serialize, Deserialize, Message)]
//! #[message(crate = "hermes::core")]
//! struct UsageRequest { path: Option<String> }
//!
//! let usage = Call::<UsageRequest, Usage, CommonErrorMessage>::builder("files.stats", "usage")
//!     .method(Method::GET)
//!     .path("/api/files/stats/usage")
//!     .param("path")
//!     .auth(AuthRequirement::read())
//!     .build()?;
//!
//! let config = ConfigLoader::new().with_defaults().with_env_prefix("HERMES").load()?;
//! init_telemetry(&config.telemetry)?;
//!
//! let mut builder = RegistryBuilder::new(Dispatcher::from_config(log, &config.dispatch));
//! builder.register(&usage, usage_handler)?;
//! let registry = builder.build();
//!
//! let router = CallRouter::from_config(Arc::clone(&registry), &config);
//! let gateway = GatewayTableBuilder::from_config(&config.gateway)?.build(registry.descriptions());
//! ```
//!
//! ## Request pipeline
//!
//! ```text
//! Request → resolve → context → AuthGate → decode → Dispatcher ─┬─ handler ──────────► 200
//!                                                              ├─ EventLog ─────────► 202
//!                                                              └─ EventLog → handler ► 200
//! ```

#![doc(html_root_url = "https://docs.rs/hermes/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use hermes_core as core;

// Re-export the route matcher
pub use hermes_router as router;

// Re-export the binding resolver
pub use hermes_extract as extract;

// Re-export the auth gate
pub use hermes_authz as authz;

// Re-export the dual dispatcher
pub use hermes_dispatch as dispatch;

// Re-export the registry and server router
pub use hermes_server as server;

// Re-export the gateway table builder
pub use hermes_gateway as gateway;

// Re-export configuration
pub use hermes_config as config;

// Re-export logging and metrics
pub use hermes_telemetry as telemetry;

// Re-export derive macros
pub use hermes_macros::{FieldType, Message};

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use hermes::prelude::*;
/// ```
pub mod prelude {
    pub use hermes_core::{
        AccessRight, AuthRequirement, BodyBinding, Call, CallError, CommonErrorMessage,
        DispatchMode, Empty, ErrorMessage, EventEnvelope, FieldType, Handler, HandlerError,
        Message, Principal, RequestContext, Role,
    };

    // Derive macros share their traits' names
    pub use hermes_macros::{FieldType, Message};

    pub use hermes_extract::Reply;

    pub use hermes_authz::{AccessStateResolver, AuthGate};

    pub use hermes_dispatch::{
        Dispatcher, EventConsumer, EventLog, InMemoryEventLog, RetryPolicy,
    };

    pub use hermes_server::{
        CallRouter, HeaderPrincipalResolver, InProcessClient, PrincipalResolver, Registry,
        RegistryBuilder,
    };

    pub use hermes_gateway::{GatewayRouteTable, GatewayTableBuilder};

    pub use hermes_config::{ConfigLoader, HermesConfig};

    pub use hermes_telemetry::init_telemetry;
}
