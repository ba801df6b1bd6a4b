use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use sourced_uow::{shared, Aggregate, DomainEvent, Entity};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub customer: String,
    pub total_cents: u32,
}

/// Order aggregate. The entity lives under a non-default field name to
/// exercise `#[aggregate(entity)]`.
#[derive(Aggregate, Default)]
pub struct Order {
    #[aggregate(entity)]
    core: Entity,
    customer: String,
    total_cents: u32,
    shipped: bool,
}

impl Order {
    pub fn with_id(id: &str) -> Self {
        Order {
            core: Entity::with_id(id),
            ..Order::default()
        }
    }

    pub fn place(id: &str, customer: &str, total_cents: u32) -> Self {
        let mut order = Order::with_id(id);
        order.customer = customer.to_string();
        order.total_cents = total_cents;
        order
            .core
            .digest(
                "OrderPlaced",
                &OrderPlaced {
                    customer: customer.to_string(),
                    total_cents,
                },
            )
            .expect("payload encodes");
        order
    }

    pub fn ship(&mut self) {
        self.shipped = true;
        self.core.digest_empty("OrderShipped");
    }

    /// Record an empty event at `secs` past the epoch.
    pub fn happened_at(&mut self, event_type: &str, secs: u64) {
        let event = DomainEvent::at(self.core.id(), event_type, Vec::new(), 0, at(secs));
        self.core.record(event);
    }

    pub fn entity(&self) -> &Entity {
        &self.core
    }

    pub fn shipped(&self) -> bool {
        self.shipped
    }
}

pub fn order(id: &str) -> Arc<RwLock<Order>> {
    shared(Order::with_id(id))
}

pub fn placed(id: &str) -> Arc<RwLock<Order>> {
    shared(Order::place(id, "alice", 1_250))
}

/// An order carrying one empty event per `(event_type, secs)` pair.
pub fn order_with_events(id: &str, events: &[(&str, u64)]) -> Arc<RwLock<Order>> {
    let mut order = Order::with_id(id);
    for (event_type, secs) in events {
        order.happened_at(event_type, *secs);
    }
    shared(order)
}

pub fn at(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

pub fn secs(timestamp: SystemTime) -> u64 {
    timestamp
        .duration_since(SystemTime::UNIX_EPOCH)
        .expect("after epoch")
        .as_secs()
}

pub fn pending(order: &Arc<RwLock<Order>>) -> usize {
    order.read().unwrap().uncommitted_events().len()
}
