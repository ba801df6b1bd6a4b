use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use sourced_uow::{ChangeSet, TransactionScope, UnitOfWorkStore};

#[derive(Debug, thiserror::Error)]
#[error("store unavailable during {0}")]
pub struct StoreDown(pub &'static str);

/// What one call to a store hook saw.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Seen {
    pub created: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
    pub in_scope: bool,
}

impl Seen {
    fn of(changes: &ChangeSet, in_scope: bool) -> Self {
        Seen {
            created: changes.created().map(|(id, _)| id.to_string()).collect(),
            modified: changes.modified().map(|(id, _)| id.to_string()).collect(),
            deleted: changes.deleted().map(|(id, _)| id.to_string()).collect(),
            in_scope,
        }
    }
}

/// Store that remembers every hook call and can be told to fail.
#[derive(Default)]
pub struct RecordingStore {
    persisted: Mutex<Vec<Seen>>,
    rolled_back: Mutex<Vec<Seen>>,
    fail_persist: AtomicBool,
    fail_rollback: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let store = Self::default();
        store.fail_persist(true);
        store
    }

    pub fn fail_persist(&self, fail: bool) {
        self.fail_persist.store(fail, Ordering::SeqCst);
    }

    pub fn fail_rollback(&self, fail: bool) {
        self.fail_rollback.store(fail, Ordering::SeqCst);
    }

    pub fn persisted(&self) -> Vec<Seen> {
        self.persisted.lock().unwrap().clone()
    }

    pub fn rolled_back(&self) -> Vec<Seen> {
        self.rolled_back.lock().unwrap().clone()
    }
}

impl UnitOfWorkStore for RecordingStore {
    type Error = StoreDown;

    fn persist(
        &self,
        changes: &ChangeSet,
        scope: Option<&mut TransactionScope>,
    ) -> Result<(), StoreDown> {
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(StoreDown("persist"));
        }
        self.persisted
            .lock()
            .unwrap()
            .push(Seen::of(changes, scope.is_some()));
        Ok(())
    }

    fn rollback(&self, changes: &ChangeSet) -> Result<(), StoreDown> {
        self.rolled_back
            .lock()
            .unwrap()
            .push(Seen::of(changes, false));
        if self.fail_rollback.load(Ordering::SeqCst) {
            return Err(StoreDown("rollback"));
        }
        Ok(())
    }
}
