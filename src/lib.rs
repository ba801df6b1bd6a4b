//! Unit of Work change tracking with ordered event publication.
//!
//! Register aggregates as new, modified or deleted inside a lane, then commit:
//! the store persists the change set, the bus publishes every uncommitted
//! event in timestamp order, and the aggregates' events are cleared.

extern crate self as sourced_uow;

mod aggregate;
pub mod bus;
mod entity;
mod error;
mod hashmap;
pub mod lane;
pub mod transaction;
mod unit_of_work;

pub use aggregate::{shared, Aggregate, AggregateRef};
pub use bus::{EventBus, PublishError};
pub use entity::{DomainEvent, Entity, PayloadError};
pub use error::{BoxError, UnitOfWorkError};
pub use hashmap::{HashMapStore, StoreError};
pub use lane::LaneId;
pub use transaction::{Enlistment, TransactionError, TransactionScope};
pub use unit_of_work::{
    ChangeSet, CommitReceipt, CommittedPolicy, Deletion, Lane, Registrations, UnitOfWork,
    UnitOfWorkConfig, UnitOfWorkStore,
};

pub use sourced_uow_macros::Aggregate;
