//! Typed configuration for Hermes services.
//!
//! - TOML and JSON configuration files
//! - `.env` files and environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Sections
//!
//! - [`ServiceConfig`] - service name and environment
//! - [`DispatchConfig`] - publish retry policy, request deadline, topic
//!   strategy and ordering guarantee
//! - [`GatewayConfig`] - gateway route table publication
//! - [`TelemetryConfig`] - logging and metrics
//!
//! # Configuration File Format
//!
//! ```toml
//! [service]
//! name = "files"
//! environment = "production"
//!
//! [dispatch]
//! request_timeout_ms = 30000
//! topic_strategy = "per_namespace"   # or "per_call"
//! ordering = "per_topic"             # or "serialized_handlers"
//!
//! [dispatch.retry]
//! max_attempts = 5
//! initial_backoff_ms = 50
//! max_backoff_ms = 2000
//! multiplier = 2.0
//!
//! [gateway]
//! enabled = true
//! base_path = "/"
//!
//! [telemetry.logging]
//! level = "info"
//! format = "json"
//!
//! [telemetry.metrics]
//! enabled = true
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `HERMES__DISPATCH__RETRY__MAX_ATTEMPTS=3`
//! - `HERMES__DISPATCH__TOPIC_STRATEGY=per_call`
//! - `HERMES__TELEMETRY__LOGGING__LEVEL=debug`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::HermesConfig;
pub use error::ConfigError;
pub use hermes_telemetry::{LogConfig, LogFormat, MetricsConfig, TelemetryConfig};
pub use loader::ConfigLoader;
pub use schema::{
    DispatchConfig, GatewayConfig, OrderingGuarantee, RetryConfig, ServiceConfig, TopicStrategy,
};
