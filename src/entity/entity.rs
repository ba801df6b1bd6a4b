use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use super::{DomainEvent, PayloadError};

/// Identity plus the events recorded since the last commit.
///
/// Aggregates embed an `Entity` and derive [`Aggregate`](crate::Aggregate)
/// to take part in a unit of work.
#[derive(Clone, Serialize, Deserialize)]
pub struct Entity {
    id: String,
    version: u64,
    #[serde(skip, default)]
    uncommitted: Vec<DomainEvent>,
    timestamp: SystemTime,
}

impl Default for Entity {
    fn default() -> Self {
        Entity {
            id: String::new(),
            version: 0,
            uncommitted: Vec::new(),
            timestamp: SystemTime::now(),
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("version", &self.version)
            .field("uncommitted", &self.uncommitted.len())
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

impl Entity {
    pub fn new() -> Self {
        Entity::default()
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        let mut entity = Entity::default();
        entity.id = id.into();
        entity
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    pub fn uncommitted_events(&self) -> &[DomainEvent] {
        &self.uncommitted
    }

    pub fn has_uncommitted(&self) -> bool {
        !self.uncommitted.is_empty()
    }

    /// Record an event with a serializable payload.
    /// The payload is serialized using bitcode.
    pub fn digest<T: Serialize>(
        &mut self,
        name: impl Into<String>,
        payload: &T,
    ) -> Result<(), PayloadError> {
        let event = DomainEvent::encode(self.id.clone(), name, payload, self.version + 1)?;
        self.push(event);
        Ok(())
    }

    /// Record an event with no payload.
    pub fn digest_empty(&mut self, name: impl Into<String>) {
        let event = DomainEvent::new(self.id.clone(), name, Vec::new(), self.version + 1);
        self.push(event);
    }

    /// Append a pre-built event, keeping its timestamp.
    ///
    /// The event's aggregate id and sequence are rewritten to match this entity.
    pub fn record(&mut self, mut event: DomainEvent) {
        event.aggregate_id = self.id.clone();
        event.sequence = self.version + 1;
        self.push(event);
    }

    /// Forget the uncommitted events. Called once they have been published.
    pub fn clear_events(&mut self) {
        self.uncommitted.clear();
    }

    fn push(&mut self, event: DomainEvent) {
        self.version = event.sequence;
        self.timestamp = event.timestamp;
        self.uncommitted.push(event);
    }
}
