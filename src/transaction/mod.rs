//! Explicit transaction scope for the atomic commit path.
//!
//! When the bus can take part in a distributed transaction, the unit of work
//! opens a [`TransactionScope`] and hands it to both the persistence hook and
//! the bus. Each side enlists its staged work; the scope then commits all of
//! it or none of it.

mod scope;

pub use scope::{Enlistment, TransactionScope};

/// Error raised while completing a transaction scope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransactionError {
    #[error("participant {participant} failed to prepare: {reason}")]
    PrepareFailed { participant: String, reason: String },
    #[error("transaction aborted: {0}")]
    Aborted(String),
}
