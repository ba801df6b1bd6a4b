use std::collections::HashMap;
use std::time::SystemTime;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

/// Error when encoding or decoding an event payload.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("payload error: {message}")]
pub struct PayloadError {
    pub message: String,
}

/// A timestamped fact about one aggregate, waiting to be published.
///
/// Publish order across a unit of work is decided by `timestamp` alone;
/// events with equal timestamps keep the order they were collected in.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct DomainEvent {
    pub id: String,
    pub aggregate_id: String,
    pub event_type: String,
    #[serde(with = "payload_serde")]
    pub payload: Vec<u8>,
    pub sequence: u64,
    pub timestamp: SystemTime,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

mod payload_serde {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(payload: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        STANDARD.encode(payload).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

impl DomainEvent {
    pub fn new(
        aggregate_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: Vec<u8>,
        sequence: u64,
    ) -> Self {
        Self::at(aggregate_id, event_type, payload, sequence, SystemTime::now())
    }

    /// Build an event with an explicit timestamp.
    pub fn at(
        aggregate_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: Vec<u8>,
        sequence: u64,
        timestamp: SystemTime,
    ) -> Self {
        DomainEvent {
            id: Uuid::new_v4().to_string(),
            aggregate_id: aggregate_id.into(),
            event_type: event_type.into(),
            payload,
            sequence,
            timestamp,
            metadata: HashMap::new(),
        }
    }

    /// Build an event with a bitcode-encoded payload.
    pub fn encode<T: Serialize>(
        aggregate_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: &T,
        sequence: u64,
    ) -> Result<Self, PayloadError> {
        let bytes = bitcode::serialize(payload).map_err(|e| PayloadError {
            message: e.to_string(),
        })?;
        Ok(Self::new(aggregate_id, event_type, bytes, sequence))
    }

    /// Deserialize the payload into the specified type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, PayloadError> {
        bitcode::deserialize(&self.payload).map_err(|e| PayloadError {
            message: e.to_string(),
        })
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(|s| s.as_str())
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.meta("correlation_id")
    }
}
