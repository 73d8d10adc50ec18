//! # Hermes Dispatch
//!
//! Dual dispatch of decoded requests: straight to the business handler, to
//! the ordered event log, or to both.
//!
//! ```text
//!                      ┌───────────────┐
//!   Sync ─────────────►│    handler    │──► Outcome::Response
//!                      └───────────────┘
//!                      ┌───────────────┐
//!   Log ──────────────►│   EventLog    │──► Outcome::Acknowledged (202)
//!                      └───────────────┘
//!                      ┌───────────────┐    ┌─────────┐
//!   SyncAndLog ───────►│   EventLog    │───►│ handler │──► Outcome::Response
//!                      └───────────────┘    └─────────┘
//!                       publish fails ⇒ handler never runs
//! ```
//!
//! | Type | Role |
//! |------|------|
//! | [`EventLog`] | Append/read contract of the external log |
//! | [`InMemoryEventLog`] | Reference log for tests and local runs |
//! | [`RetryPolicy`] | Bounded exponential backoff for appends |
//! | [`Dispatcher`] | Selects a [`Dispatch`] at registration and runs it per request |
//! | [`EventConsumer`] | Per-topic cursor that makes replays no-ops |
//!
//! Events of one topic are totally ordered by the sequence the log assigns.
//! With [`OrderingGuarantee::SerializedHandlers`] the synchronous handlers
//! of a topic also run one at a time, in that order.

#![doc(html_root_url = "https://docs.rs/hermes-dispatch/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod consumer;
mod dispatcher;
mod error;
mod handler;
mod log;
mod retry;

pub use consumer::EventConsumer;
pub use dispatcher::{Dispatch, Dispatcher, Outcome};
pub use error::{ConsumeError, LogError, LogResult, SetupError};
pub use handler::{ErasedHandler, HandlerFailure};
pub use hermes_config::{OrderingGuarantee, TopicStrategy};
pub use log::{EventLog, InMemoryEventLog};
pub use retry::{RetryExhausted, RetryPolicy};
