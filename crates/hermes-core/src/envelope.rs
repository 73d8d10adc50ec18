//! Event envelopes.
//!
//! An [`EventEnvelope`] is the durable record of a published call. The
//! dispatcher fills in everything except `sequence`, which the event log
//! assigns on append; nothing changes an envelope after that.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A published call, as stored in the ordered event log.
///
/// The JSON form carries the payload base64-encoded:
///
/// ```json
/// {"namespace":"projects","name":"create","topic":"projects","key":null,
///  "payload":"eyJ0aXRsZSI6Im15LXByb2plY3QifQ==","sequence":1,
///  "timestamp":"2024-01-01T00:00:00Z"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Namespace of the published call.
    pub namespace: String,
    /// Name of the published call.
    pub name: String,
    /// Topic the event was appended to.
    pub topic: String,
    /// Partition key, when the call declares one.
    pub key: Option<String>,
    /// The encoded request.
    #[serde(serialize_with = "serialize_payload", deserialize_with = "deserialize_payload")]
    pub payload: Bytes,
    /// Position in the topic, assigned by the log. Zero until appended.
    pub sequence: u64,
    /// When the dispatcher created the envelope.
    pub timestamp: DateTime<Utc>,
}

impl EventEnvelope {
    /// Creates an unsequenced envelope.
    #[must_use]
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        topic: impl Into<String>,
        payload: Bytes,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            topic: topic.into(),
            key: None,
            payload,
            sequence: 0,
            timestamp: Utc::now(),
        }
    }

    /// Sets the partition key.
    #[must_use]
    pub fn with_key(mut self, key: Option<String>) -> Self {
        self.key = key;
        self
    }

    /// Decodes the payload into the call's request type.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }

    /// Identity consumers deduplicate on.
    #[must_use]
    pub fn dedup_key(&self) -> (&str, &str, u64) {
        (&self.namespace, &self.name, self.sequence)
    }
}

/// Response body of a call that was published but not handled synchronously.
///
/// Returned with status `202 Accepted`; `sequence` is the position the log
/// assigned to the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    /// Topic the event was appended to.
    pub topic: String,
    /// Sequence assigned by the log.
    pub sequence: u64,
}

impl From<&EventEnvelope> for Acknowledgement {
    fn from(envelope: &EventEnvelope) -> Self {
        Self {
            topic: envelope.topic.clone(),
            sequence: envelope.sequence,
        }
    }
}

fn serialize_payload<S: Serializer>(payload: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(payload))
}

fn deserialize_payload<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    STANDARD
        .decode(encoded.as_bytes())
        .map(Bytes::from)
        .map_err(serde::de::Error::custom)
}
