//! Error types for `beacon-engine`.

use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("issue not found: {0}")]
  IssueNotFound(Uuid),

  #[error("project {project_id:?} is not owned by user {user_id:?}")]
  Forbidden {
    project_id: String,
    user_id:    String,
  },

  /// Payload on `topic` failed to parse into the expected schema. Dropped
  /// and logged by consumers, never retried — redelivery would not fix it.
  #[error("malformed payload on {topic:?}: {source}")]
  Malformed {
    topic:  String,
    #[source]
    source: serde_json::Error,
  },

  #[error("encode error: {0}")]
  Encode(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("bus error: {0}")]
  Bus(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// A store or backbone call exceeded its bounded timeout. Surfaced as a
  /// retryable failure rather than hanging the consumer.
  #[error("{op} timed out after {after:?}")]
  Timeout { op: &'static str, after: Duration },
}

impl Error {
  /// Whether redelivery can fix this failure. Malformed input cannot be
  /// retried; everything else is assumed transient.
  pub fn is_retryable(&self) -> bool {
    !matches!(self, Error::Malformed { .. })
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
