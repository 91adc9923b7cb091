//! Messaging-backbone contract: partitioned, key-ordered, at-least-once
//! publish/subscribe with consumer-group offset tracking.
//!
//! Every topic in this pipeline is keyed by `project_id`; "same key ⇒ same
//! partition" is a hard precondition the dedup engine's correctness argument
//! relies on, not an optimization. Delivery is at-least-once: a message may
//! be redelivered after a crash between persistence and offset commit.

use std::future::Future;

/// Topic carrying [`RawEvent`](crate::event::RawEvent)s from ingestion.
pub const RAW_EVENTS: &str = "raw-events";
/// Topic carrying [`IssueUpdate`](crate::event::IssueUpdate)s from the dedup
/// engine to the alert evaluator.
pub const ISSUE_UPDATES: &str = "issue-updates";
/// Topic carrying [`IssueResolved`](crate::event::IssueResolved) messages.
pub const ISSUE_RESOLVED: &str = "issue-resolved";

/// One message as handed to a consumer, with enough position information to
/// commit it afterwards.
#[derive(Debug, Clone)]
pub struct Delivery {
  pub topic:     String,
  pub partition: usize,
  pub offset:    u64,
  pub key:       String,
  pub payload:   Vec<u8>,
}

/// Producer side of the backbone.
pub trait Publisher: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Append `payload` to the partition of `topic` selected by `key`.
  fn publish<'a>(
    &'a self,
    topic: &'a str,
    key: &'a str,
    payload: Vec<u8>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

/// Consumer-group entry point.
pub trait Subscriber: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;
  type Consumer: Consumer;

  /// Join `group` on `topic`, resuming from the group's committed offsets.
  fn subscribe<'a>(
    &'a self,
    topic: &'a str,
    group: &'a str,
  ) -> impl Future<Output = Result<Self::Consumer, Self::Error>> + Send + 'a;
}

/// A single group member's ordered view of its assigned partitions.
///
/// Within one consumer, message handling is sequential: a delivery is fully
/// processed (or explicitly failed) before the next fetch, and the offset is
/// committed only after processing succeeds.
pub trait Consumer: Send {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Wait for and return the next uncommitted message. Advances the
  /// consumer's in-memory read position but not the committed offset.
  fn fetch(
    &mut self,
  ) -> impl Future<Output = Result<Delivery, Self::Error>> + Send + '_;

  /// Durably record that everything up to and including `delivery` has been
  /// processed. Controls what gets redelivered after a restart.
  fn commit<'a>(
    &'a mut self,
    delivery: &'a Delivery,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Reset the in-memory read position back to the committed offsets, so
  /// fetched-but-uncommitted messages are delivered again. Used by consumers
  /// to retry after a transient processing failure.
  fn rewind(
    &mut self,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
