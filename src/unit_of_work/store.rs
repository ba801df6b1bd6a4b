use std::error::Error;

use super::ChangeSet;
use crate::transaction::TransactionScope;

/// Storage-specific hooks behind a [`UnitOfWork`](super::UnitOfWork).
///
/// One implementation per storage technology. `persist` must apply all three
/// categories of the change set or fail as a whole; how it achieves that is
/// up to the store.
pub trait UnitOfWorkStore: Send + Sync {
    type Error: Error + Send + Sync + 'static;

    /// Apply the pending new, modified and deleted aggregates.
    ///
    /// `scope` is `Some` when the bus takes part in a transaction. A store
    /// that can join it should stage its writes as an
    /// [`Enlistment`](crate::transaction::Enlistment) so they commit or roll
    /// back together with the published events.
    fn persist(
        &self,
        changes: &ChangeSet,
        scope: Option<&mut TransactionScope>,
    ) -> Result<(), Self::Error>;

    /// Discard any storage-side state held for these changes.
    fn rollback(&self, changes: &ChangeSet) -> Result<(), Self::Error> {
        let _ = changes;
        Ok(())
    }
}

impl<S: UnitOfWorkStore + ?Sized> UnitOfWorkStore for std::sync::Arc<S> {
    type Error = S::Error;

    fn persist(
        &self,
        changes: &ChangeSet,
        scope: Option<&mut TransactionScope>,
    ) -> Result<(), Self::Error> {
        (**self).persist(changes, scope)
    }

    fn rollback(&self, changes: &ChangeSet) -> Result<(), Self::Error> {
        (**self).rollback(changes)
    }
}
