//! Core event bus trait.

use std::error::Error;

use crate::entity::DomainEvent;
use crate::transaction::TransactionScope;

/// Error type for publish operations.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// Connection to the bus failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    /// Serialization of the event failed
    #[error("serialization failed: {0}")]
    SerializationFailed(String),
    /// The bus rejected the event
    #[error("event rejected: {0}")]
    Rejected(String),
    /// Other error
    #[error("publish error: {0}")]
    Other(#[source] Box<dyn Error + Send + Sync>),
}

/// Capability a unit of work publishes committed domain events through.
///
/// Implementations might include:
/// - `InMemoryBus` - For testing and single-process scenarios
/// - `LogBus` - Writes events to the log
/// - `EmitterBus` - In-process listeners
/// - Broker adapters (Kafka, NATS, RabbitMQ) living outside this crate
pub trait EventBus: Send + Sync {
    /// Publish a single event.
    fn publish(&self, event: DomainEvent) -> Result<(), PublishError>;

    /// Publish inside a transaction scope.
    ///
    /// Buses that report [`supports_distributed_transaction`] should enlist
    /// the event in `scope` and deliver it only when the scope commits. The
    /// default publishes immediately.
    ///
    /// [`supports_distributed_transaction`]: EventBus::supports_distributed_transaction
    fn publish_in(
        &self,
        event: DomainEvent,
        scope: &mut TransactionScope,
    ) -> Result<(), PublishError> {
        let _ = scope;
        self.publish(event)
    }

    /// Whether this bus can take part in a transaction scope shared with the
    /// persistence hook.
    fn supports_distributed_transaction(&self) -> bool {
        false
    }
}

impl<B: EventBus + ?Sized> EventBus for std::sync::Arc<B> {
    fn publish(&self, event: DomainEvent) -> Result<(), PublishError> {
        (**self).publish(event)
    }

    fn publish_in(
        &self,
        event: DomainEvent,
        scope: &mut TransactionScope,
    ) -> Result<(), PublishError> {
        (**self).publish_in(event, scope)
    }

    fn supports_distributed_transaction(&self) -> bool {
        (**self).supports_distributed_transaction()
    }
}
