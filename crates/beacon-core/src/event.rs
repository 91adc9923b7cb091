//! Wire messages exchanged over the messaging backbone.
//!
//! Field names are fixed for cross-service compatibility; every message is
//! JSON-encoded and keyed by `project_id` so all traffic for one project
//! lands on the same ordered partition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, issue::IssueStatus};

// ─── Severity ────────────────────────────────────────────────────────────────

/// Severity label attached by the emitting SDK.
///
/// The same lowercase strings appear on the wire and in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
  Debug,
  Info,
  Warning,
  Error,
  Fatal,
}

impl Level {
  pub fn as_str(&self) -> &'static str {
    match self {
      Level::Debug => "debug",
      Level::Info => "info",
      Level::Warning => "warning",
      Level::Error => "error",
      Level::Fatal => "fatal",
    }
  }

  pub fn parse(s: &str) -> Result<Self, Error> {
    match s {
      "debug" => Ok(Level::Debug),
      "info" => Ok(Level::Info),
      "warning" => Ok(Level::Warning),
      "error" => Ok(Level::Error),
      "fatal" => Ok(Level::Fatal),
      other => Err(Error::UnknownLevel(other.to_owned())),
    }
  }
}

impl std::fmt::Display for Level {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Messages ────────────────────────────────────────────────────────────────

/// A single error/log occurrence as emitted by an SDK, carried on the
/// `raw-events` topic. Transient; never persisted as-is by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
  pub project_id:  String,
  pub timestamp:   DateTime<Utc>,
  pub level:       Level,
  pub message:     String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub stack_trace: Option<String>,
}

/// The authoritative post-write state of an issue, published on
/// `issue-updates` exactly once per processed [`RawEvent`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueUpdate {
  pub issue_id:   Uuid,
  pub project_id: String,
  pub count:      i64,
  pub level:      Level,
  pub status:     IssueStatus,
  pub updated_at: DateTime<Utc>,
}

/// Published on `issue-resolved` once per resolve action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueResolved {
  pub issue_id:    Uuid,
  pub project_id:  String,
  pub resolved_at: DateTime<Utc>,
}
