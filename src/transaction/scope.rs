use tracing::{debug, warn};
use uuid::Uuid;

use super::TransactionError;

/// A participant in a [`TransactionScope`].
///
/// Stores and buses stage their work in an enlistment instead of applying it
/// directly; the scope decides whether the staged work is committed or
/// rolled back.
pub trait Enlistment: Send {
    /// Vote on the outcome. Returning an error rolls back every participant.
    fn prepare(&mut self) -> Result<(), TransactionError> {
        Ok(())
    }

    /// Apply the staged work. Only called after every participant prepared.
    fn commit(&mut self);

    /// Discard the staged work.
    fn rollback(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScopeState {
    Active,
    Committed,
    RolledBack,
}

/// Explicit transaction scope shared by the persistence hook and the bus.
///
/// The scope is released when dropped: unless [`complete`](Self::complete)
/// succeeded, every participant is rolled back in reverse enlistment order.
pub struct TransactionScope {
    id: Uuid,
    participants: Vec<Box<dyn Enlistment>>,
    state: ScopeState,
}

impl Default for TransactionScope {
    fn default() -> Self {
        Self::begin()
    }
}

impl TransactionScope {
    pub fn begin() -> Self {
        let id = Uuid::new_v4();
        debug!(transaction = %id, "transaction scope started");
        TransactionScope {
            id,
            participants: Vec::new(),
            state: ScopeState::Active,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn enlist(&mut self, participant: Box<dyn Enlistment>) {
        self.participants.push(participant);
    }

    /// Two-phase completion: prepare all participants, then commit all.
    ///
    /// If any participant fails to prepare, all of them are rolled back and
    /// the preparation error is returned.
    pub fn complete(mut self) -> Result<(), TransactionError> {
        let prepared = self
            .participants
            .iter_mut()
            .try_for_each(|participant| participant.prepare());
        if let Err(err) = prepared {
            warn!(transaction = %self.id, error = %err, "transaction prepare failed");
            self.roll_back();
            return Err(err);
        }

        for participant in self.participants.iter_mut() {
            participant.commit();
        }
        self.state = ScopeState::Committed;
        debug!(
            transaction = %self.id,
            participants = self.participants.len(),
            "transaction scope committed"
        );
        Ok(())
    }

    fn roll_back(&mut self) {
        if self.state != ScopeState::Active {
            return;
        }
        for participant in self.participants.iter_mut().rev() {
            participant.rollback();
        }
        self.state = ScopeState::RolledBack;
        debug!(transaction = %self.id, "transaction scope rolled back");
    }
}

impl Drop for TransactionScope {
    fn drop(&mut self) {
        self.roll_back();
    }
}
