//! Commit sequencing: persist, collect, order, publish, clear.

use tracing::{debug, warn};

use super::{ChangeSet, UnitOfWorkStore};
use crate::bus::EventBus;
use crate::entity::DomainEvent;
use crate::error::UnitOfWorkError;
use crate::transaction::TransactionScope;

/// What a successful commit did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommitReceipt {
    pub created: usize,
    pub modified: usize,
    pub deleted: usize,
    pub events_published: usize,
    /// Persistence and publication ran inside one transaction scope.
    pub transactional: bool,
}

/// Persist a snapshot of the pending registrations, publish their events in
/// timestamp order, then clear the events from the aggregates.
///
/// With a transactional bus, persistence and publication share one scope
/// that completes only after the last event was staged. Events are cleared from the aggregates only after every event was
/// published, and outside the transaction scope.
pub(crate) fn commit<S, B>(
    store: &S,
    bus: &B,
    changes: &ChangeSet,
) -> Result<CommitReceipt, UnitOfWorkError>
where
    S: UnitOfWorkStore + ?Sized,
    B: EventBus + ?Sized,
{
    let transactional = bus.supports_distributed_transaction();
    let events_published = if transactional {
        let mut scope = TransactionScope::begin();
        persist(store, changes, Some(&mut scope))?;
        let events = collect_events(changes)?;
        let count = events.len();
        for event in events {
            bus.publish_in(event, &mut scope)?;
        }
        scope.complete()?;
        count
    } else {
        persist(store, changes, None)?;
        let events = collect_events(changes)?;
        let count = events.len();
        for event in events {
            let event_id = event.id.clone();
            if let Err(err) = bus.publish(event) {
                warn!(
                    event_id = %event_id,
                    error = %err,
                    "publication failed after persistence; stored changes stay applied"
                );
                return Err(err.into());
            }
        }
        count
    };

    clear_events(changes)?;

    Ok(CommitReceipt {
        created: changes.created_count(),
        modified: changes.modified_count(),
        deleted: changes.deleted_count(),
        events_published,
        transactional,
    })
}

fn persist<S: UnitOfWorkStore + ?Sized>(
    store: &S,
    changes: &ChangeSet,
    scope: Option<&mut TransactionScope>,
) -> Result<(), UnitOfWorkError> {
    store.persist(changes, scope).map_err(|err| {
        debug!(error = %err, "persistence hook failed");
        UnitOfWorkError::Persistence(Box::new(err))
    })
}

/// Concatenate every aggregate's uncommitted events (new, then modified, then
/// deleted) and stably sort them by timestamp.
pub(crate) fn collect_events(changes: &ChangeSet) -> Result<Vec<DomainEvent>, UnitOfWorkError> {
    let mut events = Vec::new();
    for (_, aggregate) in changes.all() {
        let aggregate = aggregate
            .read()
            .map_err(|_| UnitOfWorkError::LockPoisoned("event collection"))?;
        events.extend(aggregate.uncommitted_events().iter().cloned());
    }
    events.sort_by_key(|event| event.timestamp);
    Ok(events)
}

fn clear_events(changes: &ChangeSet) -> Result<(), UnitOfWorkError> {
    for (_, aggregate) in changes.all() {
        aggregate
            .write()
            .map_err(|_| UnitOfWorkError::LockPoisoned("event clearing"))?
            .clear_events();
    }
    Ok(())
}
