//! The Beacon processing pipeline: deduplication, alert evaluation, and the
//! issue resolution flow.
//!
//! Two background consumer loops run here — [`DedupEngine`] over
//! `raw-events` and [`AlertEvaluator`] over `issue-updates` — plus the
//! [`resolve`] operation invoked by the HTTP API. All three take their store
//! and backbone collaborators as explicitly constructed, owned instances so
//! tests can substitute an in-memory backbone.

pub mod alert;
pub mod dedup;
pub mod error;
pub mod notify;
pub mod resolve;

pub use alert::{AlertConfig, AlertEvaluator};
pub use dedup::{DedupConfig, DedupEngine};
pub use error::{Error, Result};
pub use notify::{Notifier, TracingNotifier};
pub use resolve::resolve;
