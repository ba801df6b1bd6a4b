use std::sync::{Arc, Mutex};

use tracing::info;

use super::{EventBus, PublishError};
use crate::entity::DomainEvent;

/// A bus that writes events to the log or to a buffer.
#[derive(Default)]
pub struct LogBus {
    buffer: Option<Arc<Mutex<Vec<String>>>>,
}

impl LogBus {
    pub fn new() -> Self {
        LogBus { buffer: None }
    }

    pub fn with_buffer(buffer: Arc<Mutex<Vec<String>>>) -> Self {
        LogBus {
            buffer: Some(buffer),
        }
    }
}

impl EventBus for LogBus {
    fn publish(&self, event: DomainEvent) -> Result<(), PublishError> {
        match &self.buffer {
            Some(buffer) => {
                let line = format!(
                    "[EVENT] {} {}#{}",
                    event.event_type, event.aggregate_id, event.sequence
                );
                buffer
                    .lock()
                    .map_err(|_| PublishError::Rejected("log buffer poisoned".into()))?
                    .push(line);
            }
            None => info!(
                event_id = %event.id,
                event_type = %event.event_type,
                aggregate_id = %event.aggregate_id,
                sequence = event.sequence,
                "domain event published"
            ),
        }
        Ok(())
    }
}
