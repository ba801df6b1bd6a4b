use std::sync::Mutex;

use event_emitter_rs::EventEmitter;

use super::{EventBus, PublishError};
use crate::entity::DomainEvent;

/// A bus that re-emits events to in-process listeners via an `EventEmitter`.
///
/// Listeners are keyed by event type and receive the JSON-serialized event.
pub struct EmitterBus {
    emitter: Mutex<EventEmitter>,
}

impl Default for EmitterBus {
    fn default() -> Self {
        Self::new(EventEmitter::new())
    }
}

impl EmitterBus {
    pub fn new(emitter: EventEmitter) -> Self {
        EmitterBus {
            emitter: Mutex::new(emitter),
        }
    }

    /// Register a listener for an event type. Returns the listener id.
    pub fn on<F>(&self, event_type: &str, listener: F) -> Result<String, PublishError>
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        let mut emitter = self
            .emitter
            .lock()
            .map_err(|_| PublishError::Rejected("emitter poisoned".into()))?;
        Ok(emitter.on(event_type, listener))
    }
}

impl EventBus for EmitterBus {
    fn publish(&self, event: DomainEvent) -> Result<(), PublishError> {
        let data = serde_json::to_string(&event)
            .map_err(|e| PublishError::SerializationFailed(e.to_string()))?;
        let mut emitter = self
            .emitter
            .lock()
            .map_err(|_| PublishError::Rejected("emitter poisoned".into()))?;
        emitter.emit(&event.event_type, data);
        Ok(())
    }
}
