use std::sync::Arc;

use tracing::{debug, info, info_span};
use uuid::Uuid;

use super::orchestrator::{self, CommitReceipt};
use super::{Deletion, Registrations, UnitOfWorkConfig, UnitOfWorkStore};
use crate::aggregate::AggregateRef;
use crate::bus::EventBus;
use crate::error::UnitOfWorkError;
use crate::lane::{LaneId, LaneLocal};

/// Change tracker and commit orchestrator for one or more units of work.
///
/// All pending state is kept per [`LaneId`]: concurrent units of work that
/// share one `UnitOfWork` each open their own lane and never observe each
/// other's registrations. Calls on a single lane must be sequential.
///
/// ```
/// use std::convert::Infallible;
/// use std::sync::Arc;
/// use sourced_uow::bus::InMemoryBus;
/// use sourced_uow::{shared, Aggregate, ChangeSet, Entity, TransactionScope, UnitOfWork, UnitOfWorkStore};
///
/// #[derive(Aggregate, Default)]
/// struct Order {
///     entity: Entity,
/// }
///
/// struct Discard;
///
/// impl UnitOfWorkStore for Discard {
///     type Error = Infallible;
///
///     fn persist(&self, _: &ChangeSet, _: Option<&mut TransactionScope>) -> Result<(), Infallible> {
///         Ok(())
///     }
/// }
///
/// let bus = Arc::new(InMemoryBus::new());
/// let uow = UnitOfWork::new(Discard, bus.clone());
///
/// let order = shared(Order { entity: Entity::with_id("order-1") });
/// order.write().unwrap().entity.digest_empty("OrderPlaced");
///
/// let lane = uow.lane();
/// lane.register_new(order.clone()).unwrap();
/// lane.commit().unwrap();
///
/// assert_eq!(bus.event_types(), vec!["OrderPlaced"]);
/// ```
pub struct UnitOfWork<S, B: ?Sized> {
    id: Uuid,
    store: S,
    bus: Arc<B>,
    config: UnitOfWorkConfig,
    lanes: LaneLocal<Registrations>,
}

impl<S, B> UnitOfWork<S, B>
where
    S: UnitOfWorkStore,
    B: EventBus + ?Sized,
{
    pub fn new(store: S, bus: Arc<B>) -> Self {
        Self::with_config(store, bus, UnitOfWorkConfig::default())
    }

    pub fn with_config(store: S, bus: Arc<B>, config: UnitOfWorkConfig) -> Self {
        UnitOfWork {
            id: Uuid::new_v4(),
            store,
            bus,
            config,
            lanes: LaneLocal::new(),
        }
    }

    pub fn context_id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &UnitOfWorkConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bus(&self) -> &Arc<B> {
        &self.bus
    }

    /// Open a fresh lane. Its storage is released when the guard drops.
    pub fn lane(&self) -> Lane<'_, S, B> {
        Lane {
            uow: self,
            id: LaneId::new(),
        }
    }

    /// Whether the lane has nothing left to persist. Untouched lanes are.
    pub fn committed(&self, lane: LaneId) -> Result<bool, UnitOfWorkError> {
        Ok(self
            .lanes
            .peek(lane, Registrations::committed)?
            .unwrap_or(true))
    }

    pub fn register_new(&self, lane: LaneId, aggregate: AggregateRef) -> Result<(), UnitOfWorkError> {
        let id = aggregate_id(&aggregate)?;
        self.lanes
            .with(lane, |regs| regs.register_new(&id, aggregate))??;
        debug!(context = %self.id, lane = %lane, aggregate_id = %id, "registered new");
        Ok(())
    }

    pub fn register_modified(
        &self,
        lane: LaneId,
        aggregate: AggregateRef,
    ) -> Result<(), UnitOfWorkError> {
        let id = aggregate_id(&aggregate)?;
        let inserted = self
            .lanes
            .with(lane, |regs| regs.register_modified(&id, aggregate))??;
        debug!(
            context = %self.id,
            lane = %lane,
            aggregate_id = %id,
            inserted,
            "registered modified"
        );
        Ok(())
    }

    pub fn register_deleted(
        &self,
        lane: LaneId,
        aggregate: AggregateRef,
    ) -> Result<(), UnitOfWorkError> {
        let id = aggregate_id(&aggregate)?;
        let policy = self.config.committed_policy;
        let outcome = self
            .lanes
            .with(lane, |regs| regs.register_deleted(&id, aggregate, policy))??;
        match outcome {
            Deletion::CancelledNew => {
                debug!(context = %self.id, lane = %lane, aggregate_id = %id, "new registration cancelled by delete")
            }
            Deletion::Marked | Deletion::AlreadyDeleted => {
                debug!(context = %self.id, lane = %lane, aggregate_id = %id, "registered deleted")
            }
        }
        Ok(())
    }

    /// Persist the lane's registrations, then publish their events.
    ///
    /// On failure the registrations and the events stay in place so the
    /// caller can retry. Registrations are kept after success too unless
    /// [`UnitOfWorkConfig::clear_registrations_on_commit`] is set; call
    /// [`clear_registrations`](Self::clear_registrations) before reusing
    /// the lane otherwise.
    pub fn commit(&self, lane: LaneId) -> Result<CommitReceipt, UnitOfWorkError> {
        let span = info_span!("unit_of_work.commit", context = %self.id, lane = %lane);
        let _entered = span.enter();

        let changes = self
            .lanes
            .peek(lane, Registrations::snapshot)?
            .unwrap_or_default();
        let receipt = orchestrator::commit(&self.store, self.bus.as_ref(), &changes)?;

        let clear = self.config.clear_registrations_on_commit;
        self.lanes.with_existing(lane, |regs| {
            regs.mark_committed();
            if clear {
                regs.clear();
            }
        })?;

        info!(
            created = receipt.created,
            modified = receipt.modified,
            deleted = receipt.deleted,
            events = receipt.events_published,
            transactional = receipt.transactional,
            "unit of work committed"
        );
        Ok(receipt)
    }

    /// Discard the lane's registrations without persisting or publishing.
    ///
    /// The store's rollback hook sees the discarded changes first. Even if
    /// it fails, the registrations are gone and the lane reports committed.
    pub fn rollback(&self, lane: LaneId) -> Result<(), UnitOfWorkError> {
        let changes = self
            .lanes
            .with_existing(lane, |regs| {
                let changes = regs.snapshot();
                regs.clear();
                regs.mark_committed();
                changes
            })?
            .unwrap_or_default();

        self.store
            .rollback(&changes)
            .map_err(|err| UnitOfWorkError::Rollback(Box::new(err)))?;

        info!(
            context = %self.id,
            lane = %lane,
            discarded = changes.len(),
            "unit of work rolled back"
        );
        Ok(())
    }

    /// Empty the lane's three pending sets. `committed` is left alone.
    pub fn clear_registrations(&self, lane: LaneId) -> Result<(), UnitOfWorkError> {
        self.lanes.with_existing(lane, Registrations::clear)?;
        Ok(())
    }

    pub fn pending_new(&self, lane: LaneId) -> Result<Vec<String>, UnitOfWorkError> {
        Ok(self
            .lanes
            .peek(lane, Registrations::pending_new)?
            .unwrap_or_default())
    }

    pub fn pending_modified(&self, lane: LaneId) -> Result<Vec<String>, UnitOfWorkError> {
        Ok(self
            .lanes
            .peek(lane, Registrations::pending_modified)?
            .unwrap_or_default())
    }

    pub fn pending_deleted(&self, lane: LaneId) -> Result<Vec<String>, UnitOfWorkError> {
        Ok(self
            .lanes
            .peek(lane, Registrations::pending_deleted)?
            .unwrap_or_default())
    }

    /// Release one lane's storage. Safe to call more than once.
    pub fn release(&self, lane: LaneId) -> Result<(), UnitOfWorkError> {
        if self.lanes.release(lane)? {
            debug!(context = %self.id, lane = %lane, "lane released");
        }
        Ok(())
    }

    /// Release every lane's storage. Safe to call more than once.
    pub fn dispose(&self) -> Result<(), UnitOfWorkError> {
        let released = self.lanes.clear()?;
        if released > 0 {
            debug!(context = %self.id, lanes = released, "unit of work disposed");
        }
        Ok(())
    }

    pub fn active_lanes(&self) -> Result<usize, UnitOfWorkError> {
        Ok(self.lanes.len()?)
    }
}

impl<S, B: ?Sized> Drop for UnitOfWork<S, B> {
    fn drop(&mut self) {
        if let Ok(released) = self.lanes.clear() {
            if released > 0 {
                debug!(context = %self.id, lanes = released, "unit of work dropped with open lanes");
            }
        }
    }
}

fn aggregate_id(aggregate: &AggregateRef) -> Result<String, UnitOfWorkError> {
    let aggregate = aggregate
        .read()
        .map_err(|_| UnitOfWorkError::LockPoisoned("aggregate identity"))?;
    Ok(aggregate.id().to_string())
}

/// One unit of work's lane inside a shared [`UnitOfWork`].
///
/// Dropping the guard releases the lane's storage.
pub struct Lane<'a, S, B>
where
    S: UnitOfWorkStore,
    B: EventBus + ?Sized,
{
    uow: &'a UnitOfWork<S, B>,
    id: LaneId,
}

impl<'a, S, B> Lane<'a, S, B>
where
    S: UnitOfWorkStore,
    B: EventBus + ?Sized,
{
    pub fn id(&self) -> LaneId {
        self.id
    }

    pub fn context_id(&self) -> Uuid {
        self.uow.context_id()
    }

    pub fn committed(&self) -> Result<bool, UnitOfWorkError> {
        self.uow.committed(self.id)
    }

    pub fn register_new(&self, aggregate: AggregateRef) -> Result<(), UnitOfWorkError> {
        self.uow.register_new(self.id, aggregate)
    }

    pub fn register_modified(&self, aggregate: AggregateRef) -> Result<(), UnitOfWorkError> {
        self.uow.register_modified(self.id, aggregate)
    }

    pub fn register_deleted(&self, aggregate: AggregateRef) -> Result<(), UnitOfWorkError> {
        self.uow.register_deleted(self.id, aggregate)
    }

    pub fn commit(&self) -> Result<CommitReceipt, UnitOfWorkError> {
        self.uow.commit(self.id)
    }

    pub fn rollback(&self) -> Result<(), UnitOfWorkError> {
        self.uow.rollback(self.id)
    }

    pub fn clear_registrations(&self) -> Result<(), UnitOfWorkError> {
        self.uow.clear_registrations(self.id)
    }

    pub fn pending_new(&self) -> Result<Vec<String>, UnitOfWorkError> {
        self.uow.pending_new(self.id)
    }

    pub fn pending_modified(&self) -> Result<Vec<String>, UnitOfWorkError> {
        self.uow.pending_modified(self.id)
    }

    pub fn pending_deleted(&self) -> Result<Vec<String>, UnitOfWorkError> {
        self.uow.pending_deleted(self.id)
    }
}

impl<S, B> Drop for Lane<'_, S, B>
where
    S: UnitOfWorkStore,
    B: EventBus + ?Sized,
{
    fn drop(&mut self) {
        let _ = self.uow.release(self.id);
    }
}
