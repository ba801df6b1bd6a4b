//! Event bus - where committed domain events go.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 UnitOfWork::commit()                         │
//! │  persist → collect → sort by timestamp → publish → clear     │
//! └─────────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     EventBus trait                           │
//! │  publish(event) / publish_in(event, scope)                   │
//! │  supports_distributed_transaction()                          │
//! └─────────────────────────────────────────────────────────────┘
//!          │                  │                     │
//!          ▼                  ▼                     ▼
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────────────┐
//! │ InMemoryBus │    │   LogBus    │    │    EmitterBus       │
//! │ (included)  │    │ (included)  │    │ (feature "emitter") │
//! └─────────────┘    └─────────────┘    └─────────────────────┘
//! ```

#[cfg(feature = "emitter")]
mod emitter;
mod in_memory;
mod log;
mod publisher;

#[cfg(feature = "emitter")]
pub use emitter::EmitterBus;
pub use in_memory::InMemoryBus;
pub use log::LogBus;
pub use publisher::{EventBus, PublishError};
