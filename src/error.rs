use std::error::Error;

use crate::bus::PublishError;
use crate::lane::LaneError;
use crate::transaction::TransactionError;

/// Boxed error raised by a store's persistence or rollback hook.
pub type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum UnitOfWorkError {
    /// An aggregate with an empty identity was passed to a registration call.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A registration would put an aggregate in two categories at once.
    #[error("aggregate {id} {reason}")]
    InvalidState { id: String, reason: &'static str },
    /// The aggregate is already registered in that category.
    #[error("aggregate {id} is already registered as new")]
    AlreadyRegistered { id: String },
    /// The persistence hook failed. Nothing was published.
    #[error("persistence failed: {0}")]
    Persistence(#[source] BoxError),
    /// The bus rejected an event after persistence succeeded.
    #[error("publication failed: {0}")]
    Publication(#[from] PublishError),
    /// The transaction scope could not complete.
    #[error("transaction failed: {0}")]
    Transaction(#[from] TransactionError),
    /// The rollback hook failed. Registrations were still discarded.
    #[error("rollback failed: {0}")]
    Rollback(#[source] BoxError),
    #[error("lock poisoned during {0}")]
    LockPoisoned(&'static str),
}

impl From<LaneError> for UnitOfWorkError {
    fn from(err: LaneError) -> Self {
        match err {
            LaneError::Poisoned(operation) => UnitOfWorkError::LockPoisoned(operation),
        }
    }
}

impl UnitOfWorkError {
    /// Whether the persistence hook refused the change set.
    ///
    /// Nothing was written or published then, so the lane can be committed
    /// again as it is. Publication and transaction failures report `false`:
    /// whether they left anything durable depends on the bus.
    pub fn is_retryable(&self) -> bool {
        matches!(self, UnitOfWorkError::Persistence(_))
    }
}
