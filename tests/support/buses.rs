use std::sync::atomic::{AtomicUsize, Ordering};

use sourced_uow::bus::InMemoryBus;
use sourced_uow::{
    DomainEvent, Enlistment, EventBus, PublishError, TransactionError, TransactionScope,
};

/// Wraps an [`InMemoryBus`] and rejects the n-th publication (1-based).
pub struct FlakyBus {
    inner: InMemoryBus,
    fail_on: usize,
    calls: AtomicUsize,
}

impl FlakyBus {
    pub fn new(inner: InMemoryBus, fail_on: usize) -> Self {
        FlakyBus {
            inner,
            fail_on,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn delivered(&self) -> &InMemoryBus {
        &self.inner
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self, event: &DomainEvent) -> Result<(), PublishError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on {
            return Err(PublishError::Rejected(format!("{} refused", event.event_type)));
        }
        Ok(())
    }
}

impl EventBus for FlakyBus {
    fn publish(&self, event: DomainEvent) -> Result<(), PublishError> {
        self.check(&event)?;
        self.inner.publish(event)
    }

    fn publish_in(
        &self,
        event: DomainEvent,
        scope: &mut TransactionScope,
    ) -> Result<(), PublishError> {
        self.check(&event)?;
        self.inner.publish_in(event, scope)
    }

    fn supports_distributed_transaction(&self) -> bool {
        self.inner.supports_distributed_transaction()
    }
}

/// Transactional bus that stages events like [`InMemoryBus`] but also enlists
/// a participant that refuses to prepare.
pub struct VetoBus {
    inner: InMemoryBus,
}

impl VetoBus {
    pub fn new() -> Self {
        VetoBus {
            inner: InMemoryBus::transactional(),
        }
    }

    pub fn delivered(&self) -> &InMemoryBus {
        &self.inner
    }
}

struct Veto;

impl Enlistment for Veto {
    fn prepare(&mut self) -> Result<(), TransactionError> {
        Err(TransactionError::PrepareFailed {
            participant: "broker".into(),
            reason: "broker refused the batch".into(),
        })
    }

    fn commit(&mut self) {}

    fn rollback(&mut self) {}
}

impl EventBus for VetoBus {
    fn publish(&self, event: DomainEvent) -> Result<(), PublishError> {
        self.inner.publish(event)
    }

    fn publish_in(
        &self,
        event: DomainEvent,
        scope: &mut TransactionScope,
    ) -> Result<(), PublishError> {
        self.inner.publish_in(event, scope)?;
        scope.enlist(Box::new(Veto));
        Ok(())
    }

    fn supports_distributed_transaction(&self) -> bool {
        true
    }
}
