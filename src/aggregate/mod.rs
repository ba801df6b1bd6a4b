use std::sync::{Arc, RwLock};

use crate::entity::DomainEvent;

/// Capability a domain type needs to take part in a unit of work.
///
/// Usually derived with `#[derive(Aggregate)]` over an embedded
/// [`Entity`](crate::Entity).
pub trait Aggregate: Send + Sync {
    /// Stable identity. Must be non-empty to be registered.
    fn id(&self) -> &str;

    /// Events produced since the last [`clear_events`](Aggregate::clear_events).
    fn uncommitted_events(&self) -> &[DomainEvent];

    fn clear_events(&mut self);
}

/// Shared handle to any aggregate, as held by a unit of work.
///
/// An `Arc<RwLock<Order>>` coerces to this at call sites, so callers keep
/// their typed handle while the unit of work tracks the erased one.
pub type AggregateRef = Arc<RwLock<dyn Aggregate>>;

/// Wrap an aggregate for registration.
pub fn shared<A: Aggregate + 'static>(aggregate: A) -> Arc<RwLock<A>> {
    Arc::new(RwLock::new(aggregate))
}
