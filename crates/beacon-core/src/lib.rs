//! Core types and trait definitions for the Beacon error-tracking pipeline.
//!
//! This crate is deliberately free of HTTP, database, and runtime
//! dependencies. All other crates depend on it; it depends on nothing
//! proprietary.

pub mod bus;
pub mod error;
pub mod event;
pub mod fingerprint;
pub mod issue;
pub mod rule;
pub mod store;

pub use error::{Error, Result};
pub use fingerprint::fingerprint;
