//! The dual dispatcher.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use hermes_config::{DispatchConfig, OrderingGuarantee, TopicStrategy};
use hermes_core::{
    Acknowledgement, CallDescription, CallError, DispatchFailure, DispatchMode, EventEnvelope,
    RequestContext,
};
use hermes_telemetry::metrics::{record_publish_attempt, record_publish_failure};
use serde_json::Value;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, instrument, warn};

use crate::error::SetupError;
use crate::handler::{ErasedHandler, HandlerFailure};
use crate::log::EventLog;
use crate::retry::RetryPolicy;

/// How one registered call is dispatched. Chosen once, at registration.
#[derive(Debug, Clone)]
pub enum Dispatch {
    /// Invoke the handler and return its response.
    Sync {
        /// The call's handler.
        handler: ErasedHandler,
    },
    /// Publish the request and acknowledge; consumers apply it later.
    Log {
        /// Topic the call publishes to.
        topic: String,
    },
    /// Publish the request, then invoke the handler.
    SyncAndLog {
        /// The call's handler.
        handler: ErasedHandler,
        /// Topic the call publishes to.
        topic: String,
    },
}

impl Dispatch {
    /// Topic the call publishes to, if it publishes.
    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        match self {
            Self::Sync { .. } => None,
            Self::Log { topic } | Self::SyncAndLog { topic, .. } => Some(topic),
        }
    }
}

/// Result of a successful dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The handler's response, serialized.
    Response(Value),
    /// The call was published and will be applied asynchronously.
    Acknowledged(Acknowledgement),
}

/// Routes decoded requests to handlers and to the event log.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use hermes_dispatch::{Dispatcher, InMemoryEventLog, RetryPolicy};
///
/// let dispatcher = Dispatcher::new(Arc::new(InMemoryEventLog::new()))
///     .with_retry(RetryPolicy::no_retry());
/// ```
pub struct Dispatcher {
    log: Arc<dyn EventLog>,
    retry: RetryPolicy,
    topic_strategy: TopicStrategy,
    ordering: OrderingGuarantee,
    topic_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("retry", &self.retry)
            .field("topic_strategy", &self.topic_strategy)
            .field("ordering", &self.ordering)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher with the default retry policy, per-namespace
    /// topics and per-topic ordering.
    #[must_use]
    pub fn new(log: Arc<dyn EventLog>) -> Self {
        Self {
            log,
            retry: RetryPolicy::default(),
            topic_strategy: TopicStrategy::default(),
            ordering: OrderingGuarantee::default(),
            topic_locks: DashMap::new(),
        }
    }

    /// Creates a dispatcher configured from the `dispatch` section.
    #[must_use]
    pub fn from_config(log: Arc<dyn EventLog>, config: &DispatchConfig) -> Self {
        Self::new(log)
            .with_retry(RetryPolicy::from(&config.retry))
            .with_topic_strategy(config.topic_strategy)
            .with_ordering(config.ordering)
    }

    /// Sets the publish retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets how topics are named.
    #[must_use]
    pub fn with_topic_strategy(mut self, strategy: TopicStrategy) -> Self {
        self.topic_strategy = strategy;
        self
    }

    /// Sets the ordering guarantee.
    #[must_use]
    pub fn with_ordering(mut self, ordering: OrderingGuarantee) -> Self {
        self.ordering = ordering;
        self
    }

    /// The event log this dispatcher publishes to.
    #[must_use]
    pub fn log(&self) -> &Arc<dyn EventLog> {
        &self.log
    }

    /// Topic a call publishes to: its override, else the strategy's choice.
    #[must_use]
    pub fn topic_for(&self, description: &CallDescription) -> String {
        if let Some(topic) = description.topic() {
            return topic.to_string();
        }
        match self.topic_strategy {
            TopicStrategy::PerNamespace => description.namespace().to_string(),
            TopicStrategy::PerCall => description.full_name(),
        }
    }

    /// Selects the dispatch variant for a call.
    ///
    /// # Errors
    ///
    /// Returns `SetupError` if a handler is missing for a call that invokes
    /// one, or present for a log-only call.
    pub fn plan(
        &self,
        description: &CallDescription,
        handler: Option<ErasedHandler>,
    ) -> Result<Dispatch, SetupError> {
        let call = description.full_name();
        match (description.dispatch(), handler) {
            (DispatchMode::SyncOnly, Some(handler)) => Ok(Dispatch::Sync { handler }),
            (DispatchMode::SyncAndLog, Some(handler)) => Ok(Dispatch::SyncAndLog {
                handler,
                topic: self.topic_for(description),
            }),
            (DispatchMode::LogOnly, None) => Ok(Dispatch::Log {
                topic: self.topic_for(description),
            }),
            (DispatchMode::LogOnly, Some(_)) => Err(SetupError::UnexpectedHandler { call }),
            (_, None) => Err(SetupError::MissingHandler { call }),
        }
    }

    /// Dispatches a decoded, authorized request.
    ///
    /// Publishing always happens before the handler runs; when it fails, the
    /// handler is not invoked. The request deadline bounds every step: work
    /// that has not committed an event (waiting for the topic's turn,
    /// publishing and its retries) is abandoned with
    /// `TimedOut { committed_sequence: None }`. Once an event is committed, a
    /// deadline expiry is reported as `TimedOut` carrying its sequence.
    ///
    /// # Errors
    ///
    /// Returns `CallError::Dispatch` for publish failures, declared handler
    /// errors and timeouts; `CallError::Internal` for anything else.
    #[instrument(
        skip_all,
        fields(call = %description.full_name(), request_id = %ctx.request_id())
    )]
    pub async fn dispatch(
        &self,
        dispatch: &Dispatch,
        description: &CallDescription,
        ctx: RequestContext,
        request: Value,
    ) -> Result<Outcome, CallError> {
        match dispatch {
            Dispatch::Sync { handler } => {
                let response = run_handler(handler, ctx, request, None).await?;
                Ok(Outcome::Response(response))
            }
            Dispatch::Log { topic } => {
                let envelope =
                    before_commit(&ctx, self.publish(description, topic, &request)).await??;
                Ok(Outcome::Acknowledged(Acknowledgement::from(&envelope)))
            }
            Dispatch::SyncAndLog { handler, topic } => {
                // held across publish and handler so handlers see sequence order
                let _turn = before_commit(&ctx, self.serialize_turn(topic)).await?;

                let envelope =
                    before_commit(&ctx, self.publish(description, topic, &request)).await??;
                let response = run_handler(handler, ctx, request, Some(envelope.sequence)).await?;
                Ok(Outcome::Response(response))
            }
        }
    }

    async fn serialize_turn(&self, topic: &str) -> Option<OwnedMutexGuard<()>> {
        if self.ordering != OrderingGuarantee::SerializedHandlers {
            return None;
        }
        let lock = Arc::clone(
            self.topic_locks
                .entry(topic.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        );
        Some(lock.lock_owned().await)
    }

    /// Encodes the request into an envelope and appends it, retrying per the
    /// policy.
    async fn publish(
        &self,
        description: &CallDescription,
        topic: &str,
        request: &Value,
    ) -> Result<EventEnvelope, CallError> {
        let payload = serde_json::to_vec(request)
            .map_err(|e| CallError::internal_with_source("failed to encode event payload", e))?;
        let key = description
            .partition_key()
            .and_then(|field| partition_key(request, field));
        let envelope = EventEnvelope::new(
            description.namespace(),
            description.name(),
            topic,
            Bytes::from(payload),
        )
        .with_key(key);

        let log: &dyn EventLog = self.log.as_ref();
        let result = self
            .retry
            .run(move |_| {
                record_publish_attempt(topic);
                log.append(envelope.clone())
            })
            .await;

        match result {
            Ok((committed, attempts)) => {
                debug!(
                    topic,
                    sequence = committed.sequence,
                    attempts,
                    "event published"
                );
                Ok(committed)
            }
            Err(exhausted) => {
                record_publish_failure(topic);
                warn!(
                    topic,
                    attempts = exhausted.attempts,
                    error = %exhausted.last_error,
                    "publish failed"
                );
                Err(DispatchFailure::PublishFailed {
                    topic: topic.to_string(),
                    attempts: exhausted.attempts,
                    reason: exhausted.last_error.to_string(),
                }
                .into())
            }
        }
    }
}

/// Runs work that precedes any commit under the request deadline.
///
/// An already expired deadline fails without polling `work`.
async fn before_commit<F: Future>(ctx: &RequestContext, work: F) -> Result<F::Output, CallError> {
    let abandoned = || -> CallError {
        warn!("deadline passed before the event was committed");
        DispatchFailure::TimedOut {
            committed_sequence: None,
        }
        .into()
    };
    match ctx.remaining() {
        None => Ok(work.await),
        Some(remaining) if remaining.is_zero() => Err(abandoned()),
        Some(remaining) => tokio::time::timeout(remaining, work)
            .await
            .map_err(|_| abandoned()),
    }
}

async fn run_handler(
    handler: &ErasedHandler,
    ctx: RequestContext,
    request: Value,
    committed_sequence: Option<u64>,
) -> Result<Value, CallError> {
    let remaining = ctx.remaining();
    let invocation = handler.call(ctx, request);

    let result = match remaining {
        Some(remaining) => tokio::time::timeout(remaining, invocation)
            .await
            .map_err(|_| {
                warn!(?committed_sequence, "handler did not finish before the deadline");
                DispatchFailure::TimedOut { committed_sequence }
            })?,
        None => invocation.await,
    };

    result.map_err(|failure| match failure {
        HandlerFailure::Declared { status, body } => {
            DispatchFailure::HandlerFailed { status, body }.into()
        }
        HandlerFailure::Internal(source) => {
            CallError::internal_with_source("handler failed", source)
        }
    })
}

fn partition_key(request: &Value, field: &str) -> Option<String> {
    match request.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
