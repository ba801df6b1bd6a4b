mod domain_event;
mod entity;

pub use domain_event::{DomainEvent, PayloadError};
pub use entity::Entity;
