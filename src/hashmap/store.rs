use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::entity::DomainEvent;
use crate::transaction::{Enlistment, TransactionError, TransactionScope};
use crate::unit_of_work::{ChangeSet, UnitOfWorkStore};

#[derive(Default)]
struct Streams {
    streams: HashMap<String, Vec<DomainEvent>>,
    /// Ids held by a prepared transaction until it commits or rolls back.
    reserved: HashSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("store lock poisoned during {0}")]
    LockPoisoned(&'static str),
    #[error("stream {id} already exists")]
    AlreadyExists { id: String },
    #[error("stream {id} not found")]
    NotFound { id: String },
    #[error("stream {id} is reserved by a pending transaction")]
    Reserved { id: String },
}

/// In-memory event-stream store.
///
/// New aggregates open a stream with their uncommitted events, modified
/// aggregates append to it, deleted aggregates drop it. A change set is
/// validated in full before anything is written.
///
/// Inside a transaction scope the writes are staged. Preparing the scope
/// reserves every stream id it touches, so no other writer can change those
/// streams before the staged writes are applied or discarded.
#[derive(Clone, Default)]
pub struct HashMapStore {
    storage: Arc<RwLock<Streams>>,
}

#[derive(Clone, Debug)]
enum Write {
    Create { id: String, events: Vec<DomainEvent> },
    Append { id: String, events: Vec<DomainEvent> },
    Delete { id: String },
}

impl Write {
    fn id(&self) -> &str {
        match self {
            Write::Create { id, .. } | Write::Append { id, .. } | Write::Delete { id } => id,
        }
    }
}

impl HashMapStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored events of one aggregate.
    pub fn stream(&self, id: &str) -> Result<Option<Vec<DomainEvent>>, StoreError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(storage.streams.get(id).cloned())
    }

    pub fn contains(&self, id: &str) -> Result<bool, StoreError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(storage.streams.contains_key(id))
    }

    /// Whether a prepared transaction currently holds the stream id.
    pub fn is_reserved(&self, id: &str) -> Result<bool, StoreError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(storage.reserved.contains(id))
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(storage.streams.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl UnitOfWorkStore for HashMapStore {
    type Error = StoreError;

    fn persist(
        &self,
        changes: &ChangeSet,
        scope: Option<&mut TransactionScope>,
    ) -> Result<(), StoreError> {
        let writes = plan(changes)?;

        match scope {
            Some(scope) => {
                {
                    let storage = self
                        .storage
                        .read()
                        .map_err(|_| StoreError::LockPoisoned("read"))?;
                    validate(&storage, &writes)?;
                }
                scope.enlist(Box::new(StagedWrites {
                    storage: Arc::clone(&self.storage),
                    writes,
                    reserved: false,
                }));
            }
            None => {
                let mut storage = self
                    .storage
                    .write()
                    .map_err(|_| StoreError::LockPoisoned("write"))?;
                validate(&storage, &writes)?;
                apply(&mut storage, writes);
            }
        }
        Ok(())
    }
}

fn plan(changes: &ChangeSet) -> Result<Vec<Write>, StoreError> {
    let mut writes = Vec::with_capacity(changes.len());
    for (id, aggregate) in changes.created() {
        let aggregate = aggregate
            .read()
            .map_err(|_| StoreError::LockPoisoned("aggregate read"))?;
        writes.push(Write::Create {
            id: id.to_string(),
            events: aggregate.uncommitted_events().to_vec(),
        });
    }
    for (id, aggregate) in changes.modified() {
        let aggregate = aggregate
            .read()
            .map_err(|_| StoreError::LockPoisoned("aggregate read"))?;
        writes.push(Write::Append {
            id: id.to_string(),
            events: aggregate.uncommitted_events().to_vec(),
        });
    }
    for (id, _) in changes.deleted() {
        writes.push(Write::Delete { id: id.to_string() });
    }
    Ok(writes)
}

fn validate(storage: &Streams, writes: &[Write]) -> Result<(), StoreError> {
    for write in writes {
        if storage.reserved.contains(write.id()) {
            return Err(StoreError::Reserved {
                id: write.id().to_string(),
            });
        }
        match write {
            Write::Create { id, .. } if storage.streams.contains_key(id) => {
                return Err(StoreError::AlreadyExists { id: id.clone() });
            }
            Write::Append { id, .. } | Write::Delete { id }
                if !storage.streams.contains_key(id) =>
            {
                return Err(StoreError::NotFound { id: id.clone() });
            }
            _ => {}
        }
    }
    Ok(())
}

fn apply(storage: &mut Streams, writes: Vec<Write>) {
    for write in writes {
        match write {
            Write::Create { id, events } => {
                storage.streams.insert(id, events);
            }
            Write::Append { id, events } => {
                storage.streams.entry(id).or_default().extend(events);
            }
            Write::Delete { id } => {
                storage.streams.remove(&id);
            }
        }
    }
}

/// Writes held back until the surrounding transaction scope commits.
struct StagedWrites {
    storage: Arc<RwLock<Streams>>,
    writes: Vec<Write>,
    reserved: bool,
}

impl StagedWrites {
    fn unreserve(&mut self, storage: &mut Streams) {
        if self.reserved {
            for write in &self.writes {
                storage.reserved.remove(write.id());
            }
            self.reserved = false;
        }
    }
}

impl Enlistment for StagedWrites {
    /// Validate and reserve under one write lock.
    fn prepare(&mut self) -> Result<(), TransactionError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| TransactionError::Aborted("store lock poisoned".into()))?;
        validate(&storage, &self.writes).map_err(|err| TransactionError::PrepareFailed {
            participant: "hashmap store".into(),
            reason: err.to_string(),
        })?;
        for write in &self.writes {
            storage.reserved.insert(write.id().to_string());
        }
        self.reserved = true;
        Ok(())
    }

    fn commit(&mut self) {
        let storage = Arc::clone(&self.storage);
        let mut storage = storage.write().unwrap_or_else(|e| e.into_inner());
        self.unreserve(&mut storage);
        apply(&mut storage, std::mem::take(&mut self.writes));
    }

    fn rollback(&mut self) {
        let storage = Arc::clone(&self.storage);
        let mut storage = storage.write().unwrap_or_else(|e| e.into_inner());
        self.unreserve(&mut storage);
        self.writes.clear();
    }
}
