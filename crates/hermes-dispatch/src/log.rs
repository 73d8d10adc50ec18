//! The ordered event log contract and its in-memory implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use hermes_core::EventEnvelope;
use parking_lot::RwLock;
use tracing::trace;

use crate::error::{LogError, LogResult};

/// An append-only log of [`EventEnvelope`]s, ordered per topic.
///
/// Implementations own sequence assignment: the first event appended to a
/// topic gets sequence 1 and every later one the next integer. An append
/// either commits the whole envelope or fails without leaving a trace.
#[async_trait]
pub trait EventLog: Send + Sync + 'static {
    /// Appends an envelope and returns it with its assigned sequence.
    async fn append(&self, envelope: EventEnvelope) -> LogResult<EventEnvelope>;

    /// Reads up to `limit` events of `topic` whose sequence is at least
    /// `from_sequence`, in sequence order.
    async fn read(&self, topic: &str, from_sequence: u64, limit: usize)
        -> LogResult<Vec<EventEnvelope>>;
}

/// An [`EventLog`] kept in process memory.
///
/// Used by tests and local development. Appends can be made to fail on
/// demand with [`fail_next`](Self::fail_next).
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use hermes_core::EventEnvelope;
/// use hermes_dispatch::{EventLog, InMemoryEventLog};
///
/// # tokio_test::block_on(async {
/// let log = InMemoryEventLog::new();
/// let first = log
///     .append(EventEnvelope::new("projects", "create", "projects", Bytes::from_static(b"{}")))
///     .await
///     .unwrap();
/// assert_eq!(first.sequence, 1);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    topics: RwLock<HashMap<String, Vec<EventEnvelope>>>,
    failures: AtomicU32,
}

impl InMemoryEventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` appends fail with [`LogError::Unavailable`].
    pub fn fail_next(&self, count: u32) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Number of events stored for `topic`.
    #[must_use]
    pub fn len(&self, topic: &str) -> usize {
        self.topics.read().get(topic).map_or(0, Vec::len)
    }

    /// Returns `true` if no event was ever appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topics.read().values().all(Vec::is_empty)
    }

    /// Snapshot of one topic.
    #[must_use]
    pub fn events(&self, topic: &str) -> Vec<EventEnvelope> {
        self.topics.read().get(topic).cloned().unwrap_or_default()
    }

    /// Names of the topics that hold at least one event, sorted.
    #[must_use]
    pub fn topics(&self) -> Vec<String> {
        let mut names: Vec<String> = self.topics.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn take_injected_failure(&self) -> bool {
        self.failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    async fn append(&self, mut envelope: EventEnvelope) -> LogResult<EventEnvelope> {
        if self.take_injected_failure() {
            return Err(LogError::unavailable("injected failure"));
        }

        let mut topics = self.topics.write();
        let events = topics.entry(envelope.topic.clone()).or_default();
        envelope.sequence = events.len() as u64 + 1;
        events.push(envelope.clone());

        trace!(topic = %envelope.topic, sequence = envelope.sequence, "event appended");
        Ok(envelope)
    }

    async fn read(
        &self,
        topic: &str,
        from_sequence: u64,
        limit: usize,
    ) -> LogResult<Vec<EventEnvelope>> {
        let topics = self.topics.read();
        let Some(events) = topics.get(topic) else {
            return Ok(Vec::new());
        };

        // sequences are dense and start at 1
        let start = usize::try_from(from_sequence.saturating_sub(1)).unwrap_or(usize::MAX);
        Ok(events.iter().skip(start).take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn envelope(topic: &str) -> EventEnvelope {
        EventEnvelope::new("projects", "create", topic, Bytes::from_static(b"{}"))
    }

    #[tokio::test]
    async fn test_sequences_are_per_topic() {
        let log = InMemoryEventLog::new();
        assert!(log.is_empty());

        assert_eq!(log.append(envelope("a")).await.unwrap().sequence, 1);
        assert_eq!(log.append(envelope("a")).await.unwrap().sequence, 2);
        assert_eq!(log.append(envelope("b")).await.unwrap().sequence, 1);

        assert_eq!(log.len("a"), 2);
        assert_eq!(log.topics(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_read_window() {
        let log = InMemoryEventLog::new();
        for _ in 0..5 {
            log.append(envelope("a")).await.unwrap();
        }

        let window = log.read("a", 2, 2).await.unwrap();
        let sequences: Vec<u64> = window.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![2, 3]);

        assert_eq!(log.read("a", 0, 10).await.unwrap().len(), 5);
        assert!(log.read("a", 6, 10).await.unwrap().is_empty());
        assert!(log.read("missing", 1, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_injected_failures_leave_no_trace() {
        let log = InMemoryEventLog::new();
        log.fail_next(2);

        assert!(matches!(
            log.append(envelope("a")).await,
            Err(LogError::Unavailable(_))
        ));
        assert!(log.append(envelope("a")).await.is_err());
        assert_eq!(log.append(envelope("a")).await.unwrap().sequence, 1);
        assert_eq!(log.len("a"), 1);
    }
}
