//! Idempotent consumption of a topic.
//!
//! Materializers that apply published calls must tolerate seeing an event
//! twice: a publisher may time out after commit and the caller may retry,
//! and a consumer restarted from an old checkpoint reads events again. Each
//! event is identified by `(namespace, name, sequence)`; since sequences are
//! unique within a topic, a per-topic cursor of the last applied sequence is
//! enough to make replays no-ops.

use std::future::Future;

use hermes_core::EventEnvelope;
use tracing::{debug, trace};

use crate::error::ConsumeError;
use crate::log::EventLog;

/// A cursor over one topic that applies each event at most once.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use hermes_core::EventEnvelope;
/// use hermes_dispatch::{EventConsumer, EventLog, InMemoryEventLog};
///
/// # tokio_test::block_on(async {
/// let log = InMemoryEventLog::new();
/// log.append(EventEnvelope::new("projects", "create", "projects", Bytes::from_static(b"{}")))
///     .await
///     .unwrap();
///
/// let mut consumer = EventConsumer::new("projects");
/// let applied = consumer.poll(&log, 100, |_event| async { Ok(()) }).await.unwrap();
/// assert_eq!(applied, 1);
///
/// // a second poll finds nothing new
/// assert_eq!(consumer.poll(&log, 100, |_event| async { Ok(()) }).await.unwrap(), 0);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct EventConsumer {
    topic: String,
    last_applied: u64,
}

impl EventConsumer {
    /// Creates a consumer that starts at the beginning of `topic`.
    #[must_use]
    pub fn new(topic: impl Into<String>) -> Self {
        Self::resume(topic, 0)
    }

    /// Creates a consumer from a checkpoint: every event up to and including
    /// `last_applied` counts as applied.
    #[must_use]
    pub fn resume(topic: impl Into<String>, last_applied: u64) -> Self {
        Self {
            topic: topic.into(),
            last_applied,
        }
    }

    /// The consumed topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Sequence of the last applied event (0 if none).
    #[must_use]
    pub const fn last_applied(&self) -> u64 {
        self.last_applied
    }

    /// Returns `true` if `envelope` belongs to this topic and was not applied yet.
    #[must_use]
    pub fn is_new(&self, envelope: &EventEnvelope) -> bool {
        envelope.topic == self.topic && envelope.sequence > self.last_applied
    }

    /// Applies `envelope` unless it was already applied.
    ///
    /// Returns whether `apply` ran. The cursor only advances when `apply`
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns `ConsumeError::Apply` if `apply` fails.
    pub async fn offer<F, Fut>(
        &mut self,
        envelope: EventEnvelope,
        apply: F,
    ) -> Result<bool, ConsumeError>
    where
        F: FnOnce(EventEnvelope) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        if !self.is_new(&envelope) {
            let (namespace, name, sequence) = envelope.dedup_key();
            trace!(namespace, name, sequence, "skipping already applied event");
            return Ok(false);
        }

        let sequence = envelope.sequence;
        apply(envelope).await.map_err(|source| ConsumeError::Apply {
            topic: self.topic.clone(),
            sequence,
            source,
        })?;
        self.last_applied = sequence;
        Ok(true)
    }

    /// Reads up to `limit` events after the cursor and applies them in order.
    ///
    /// Returns how many events were applied. On an apply failure the cursor
    /// stays on the last successful event, so the next poll retries the
    /// failed one.
    ///
    /// # Errors
    ///
    /// Returns `ConsumeError` if reading or applying fails.
    pub async fn poll<F, Fut>(
        &mut self,
        log: &dyn EventLog,
        limit: usize,
        mut apply: F,
    ) -> Result<usize, ConsumeError>
    where
        F: FnMut(EventEnvelope) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let batch = log.read(&self.topic, self.last_applied + 1, limit).await?;

        let mut applied = 0;
        for envelope in batch {
            if self.offer(envelope, &mut apply).await? {
                applied += 1;
            }
        }

        if applied > 0 {
            debug!(topic = %self.topic, applied, last_applied = self.last_applied, "events applied");
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn event(sequence: u64) -> EventEnvelope {
        let mut envelope =
            EventEnvelope::new("projects", "create", "projects", Bytes::from_static(b"{}"));
        envelope.sequence = sequence;
        envelope
    }

    #[tokio::test]
    async fn test_replay_is_a_no_op() {
        let mut consumer = EventConsumer::new("projects");
        let mut seen = Vec::new();
        let mut applied = Vec::new();

        for sequence in [1, 2, 2, 1, 3] {
            let ran = consumer
                .offer(event(sequence), |e| {
                    seen.push(e.sequence);
                    async { Ok(()) }
                })
                .await
                .unwrap();
            applied.push(ran);
        }

        assert_eq!(applied, vec![true, true, false, false, true]);
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(consumer.last_applied(), 3);
    }

    #[tokio::test]
    async fn test_failed_apply_keeps_cursor() {
        let mut consumer = EventConsumer::resume("projects", 4);
        let err = consumer
            .offer(event(5), |_| async { Err(anyhow::anyhow!("db down")) })
            .await
            .unwrap_err();

        assert!(matches!(err, ConsumeError::Apply { sequence: 5, .. }));
        assert_eq!(consumer.last_applied(), 4);
    }

    #[test]
    fn test_other_topics_are_not_new() {
        let consumer = EventConsumer::new("files");
        assert!(!consumer.is_new(&event(1)));
    }
}
