use std::collections::BTreeMap;

use super::{ChangeSet, CommittedPolicy};
use crate::aggregate::AggregateRef;
use crate::error::UnitOfWorkError;

/// What a delete-registration did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Deletion {
    /// The aggregate was pending as new; both cancel out.
    CancelledNew,
    /// The aggregate is now pending as deleted.
    Marked,
    /// The aggregate was already pending as deleted.
    AlreadyDeleted,
}

/// Pending new / modified / deleted aggregates of one lane.
///
/// An id lives in at most one of the three maps for correctly-used lanes.
#[derive(Clone)]
pub struct Registrations {
    created: BTreeMap<String, AggregateRef>,
    modified: BTreeMap<String, AggregateRef>,
    deleted: BTreeMap<String, AggregateRef>,
    committed: bool,
}

impl Default for Registrations {
    fn default() -> Self {
        Registrations {
            created: BTreeMap::new(),
            modified: BTreeMap::new(),
            deleted: BTreeMap::new(),
            committed: true,
        }
    }
}

impl Registrations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn committed(&self) -> bool {
        self.committed
    }

    pub fn register_new(&mut self, id: &str, aggregate: AggregateRef) -> Result<(), UnitOfWorkError> {
        require_id(id)?;
        if self.modified.contains_key(id) {
            return Err(UnitOfWorkError::InvalidState {
                id: id.to_string(),
                reason: "is registered as modified",
            });
        }
        if self.created.contains_key(id) {
            return Err(UnitOfWorkError::AlreadyRegistered { id: id.to_string() });
        }

        self.created.insert(id.to_string(), aggregate);
        self.committed = false;
        Ok(())
    }

    /// Returns `true` if the aggregate was not tracked yet.
    pub fn register_modified(
        &mut self,
        id: &str,
        aggregate: AggregateRef,
    ) -> Result<bool, UnitOfWorkError> {
        require_id(id)?;
        if self.deleted.contains_key(id) {
            return Err(UnitOfWorkError::InvalidState {
                id: id.to_string(),
                reason: "is registered as deleted",
            });
        }

        let inserted = !self.modified.contains_key(id) && !self.created.contains_key(id);
        if inserted {
            self.modified.insert(id.to_string(), aggregate);
        }
        self.committed = false;
        Ok(inserted)
    }

    pub fn register_deleted(
        &mut self,
        id: &str,
        aggregate: AggregateRef,
        policy: CommittedPolicy,
    ) -> Result<Deletion, UnitOfWorkError> {
        require_id(id)?;
        if self.created.remove(id).is_some() {
            if policy == CommittedPolicy::Derived {
                self.committed = self.is_empty();
            }
            return Ok(Deletion::CancelledNew);
        }

        let was_modified = self.modified.remove(id).is_some();
        let was_added = !self.deleted.contains_key(id);
        if was_added {
            self.deleted.insert(id.to_string(), aggregate);
        }

        self.committed = match policy {
            CommittedPolicy::Observed => !(was_modified || was_added),
            CommittedPolicy::Derived => self.is_empty(),
        };

        Ok(if was_added {
            Deletion::Marked
        } else {
            Deletion::AlreadyDeleted
        })
    }

    pub fn pending_new(&self) -> Vec<String> {
        self.created.keys().cloned().collect()
    }

    pub fn pending_modified(&self) -> Vec<String> {
        self.modified.keys().cloned().collect()
    }

    pub fn pending_deleted(&self) -> Vec<String> {
        self.deleted.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }

    /// Empty the three maps. `committed` is left alone.
    pub fn clear(&mut self) {
        self.created.clear();
        self.modified.clear();
        self.deleted.clear();
    }

    pub(crate) fn mark_committed(&mut self) {
        self.committed = true;
    }

    pub fn snapshot(&self) -> ChangeSet {
        ChangeSet {
            created: self.created.clone(),
            modified: self.modified.clone(),
            deleted: self.deleted.clone(),
        }
    }
}

fn require_id(id: &str) -> Result<(), UnitOfWorkError> {
    if id.is_empty() {
        return Err(UnitOfWorkError::InvalidArgument(
            "aggregate id must not be empty".to_string(),
        ));
    }
    Ok(())
}
