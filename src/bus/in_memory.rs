//! In-memory bus for testing and single-process scenarios.

use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use super::{EventBus, PublishError};
use crate::entity::DomainEvent;
use crate::transaction::{Enlistment, TransactionScope};

/// In-memory event bus.
///
/// Features:
/// - Thread-safe (clones share the same log)
/// - Events are stored in an append-only log in publish order
/// - `transactional()` buses stage events in the transaction scope and only
///   append them when the scope commits
///
/// ## Example
///
/// ```
/// use sourced_uow::bus::{EventBus, InMemoryBus};
/// use sourced_uow::DomainEvent;
///
/// let bus = InMemoryBus::new();
/// bus.publish(DomainEvent::new("order-1", "OrderPlaced", vec![], 1)).unwrap();
/// assert_eq!(bus.event_types(), vec!["OrderPlaced"]);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryBus {
    log: Arc<RwLock<Vec<DomainEvent>>>,
    transactional: bool,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bus that takes part in transaction scopes.
    pub fn transactional() -> Self {
        Self {
            log: Arc::new(RwLock::new(Vec::new())),
            transactional: true,
        }
    }

    /// Get all published events in order.
    pub fn events(&self) -> Vec<DomainEvent> {
        self.log.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Get all published event types in order.
    pub fn event_types(&self) -> Vec<String> {
        self.log
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|e| e.event_type.clone())
            .collect()
    }

    /// Get all published timestamps in order.
    pub fn timestamps(&self) -> Vec<SystemTime> {
        self.log
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|e| e.timestamp)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.log.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find the first event of a type.
    pub fn find_by_type(&self, event_type: &str) -> Option<DomainEvent> {
        self.log
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|e| e.event_type == event_type)
            .cloned()
    }

    /// Clear the log (useful for test cleanup).
    pub fn clear(&self) {
        self.log.write().unwrap_or_else(|e| e.into_inner()).clear();
    }

    fn append(&self, event: DomainEvent) -> Result<(), PublishError> {
        self.log
            .write()
            .map_err(|_| PublishError::Rejected("in-memory log poisoned".into()))?
            .push(event);
        Ok(())
    }
}

impl EventBus for InMemoryBus {
    fn publish(&self, event: DomainEvent) -> Result<(), PublishError> {
        self.append(event)
    }

    fn publish_in(
        &self,
        event: DomainEvent,
        scope: &mut TransactionScope,
    ) -> Result<(), PublishError> {
        if !self.transactional {
            return self.append(event);
        }
        scope.enlist(Box::new(StagedEvent {
            log: Arc::clone(&self.log),
            event: Some(event),
        }));
        Ok(())
    }

    fn supports_distributed_transaction(&self) -> bool {
        self.transactional
    }
}

/// One event waiting for its transaction scope to commit.
struct StagedEvent {
    log: Arc<RwLock<Vec<DomainEvent>>>,
    event: Option<DomainEvent>,
}

impl Enlistment for StagedEvent {
    fn commit(&mut self) {
        if let Some(event) = self.event.take() {
            self.log
                .write()
                .unwrap_or_else(|e| e.into_inner())
                .push(event);
        }
    }

    fn rollback(&mut self) {
        self.event = None;
    }
}
