//! Error type for `beacon-bus`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A commit referenced a topic the bus has never seen.
  #[error("unknown topic: {0:?}")]
  UnknownTopic(String),

  /// A commit referenced a partition outside the topic's range.
  #[error("topic {topic:?} has no partition {partition}")]
  UnknownPartition { topic: String, partition: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
