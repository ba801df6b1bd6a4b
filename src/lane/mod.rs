//! Execution-context-local storage.
//!
//! A shared [`UnitOfWork`](crate::UnitOfWork) keeps one private slot per
//! concurrent unit of work. Each slot is addressed by an explicit [`LaneId`]
//! token handed out by the owner; nothing is keyed on the current thread.

mod lane_local;

use std::fmt;

use uuid::Uuid;

pub use lane_local::LaneLocal;

/// Token identifying one execution lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LaneId(Uuid);

impl LaneId {
    pub fn new() -> Self {
        LaneId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for LaneId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for lane storage operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LaneError {
    /// A thread panicked while holding the lane table or a lane slot.
    #[error("lane storage poisoned during {0}")]
    Poisoned(&'static str),
}
