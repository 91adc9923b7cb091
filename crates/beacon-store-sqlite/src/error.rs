//! Error type for `beacon-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] beacon_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A unique-key conflict surfaced despite the atomic-upsert contract.
  /// Treated as a bug signal by consumers: logged at error severity and the
  /// triggering message is retried rather than silently dropped.
  #[error("uniqueness invariant violated for project {project_id:?} fingerprint {fingerprint:?}")]
  UniquenessViolation {
    project_id:  String,
    fingerprint: String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
