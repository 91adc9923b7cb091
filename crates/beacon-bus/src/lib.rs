//! In-memory implementation of the Beacon messaging backbone.
//!
//! [`MemoryBus`] provides partitioned, key-ordered, at-least-once
//! publish/subscribe with consumer-group offset tracking, implementing the
//! traits in [`beacon_core::bus`]. It backs the single-process server wiring
//! and substitutes for an external broker in tests; an external-broker
//! adapter would implement the same two traits.

mod bus;

pub mod error;

pub use bus::{MemoryBus, MemoryConsumer};
pub use error::{Error, Result};
