//! Unit of Work - change tracking and commit orchestration.
//!
//! ## Commit sequence
//!
//! ```text
//! register_new / register_modified / register_deleted   (per lane)
//!                            │
//!                            ▼
//!     UnitOfWorkStore::persist(changes, scope?)
//!                            │ ok
//!                            ▼
//!     collect events: new → modified → deleted
//!     stable sort by timestamp, publish in order
//!                            │ ok
//!                            ▼
//!     scope.complete()  (only if the bus is transactional)
//!                            │
//!                            ▼
//!     clear events on every registered aggregate
//! ```

mod change_set;
mod config;
mod context;
mod orchestrator;
mod registrations;
mod store;

pub use change_set::ChangeSet;
pub use config::{CommittedPolicy, UnitOfWorkConfig};
pub use context::{Lane, UnitOfWork};
pub use orchestrator::CommitReceipt;
pub use registrations::{Deletion, Registrations};
pub use store::UnitOfWorkStore;
