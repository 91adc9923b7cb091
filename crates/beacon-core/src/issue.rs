//! Issue — the deduplicated aggregate for all events sharing a fingerprint
//! within a project.
//!
//! Exactly one issue exists per `(project_id, fingerprint)` pair; the store
//! enforces this with a unique constraint and an atomic conditional upsert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::Level;

/// Issue lifecycle status. The only transition is `open → resolved`; no
/// transition back exists, and renewed occurrences do not reopen an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
  Open,
  Resolved,
}

impl IssueStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      IssueStatus::Open => "open",
      IssueStatus::Resolved => "resolved",
    }
  }

  pub fn parse(s: &str) -> Result<Self, crate::Error> {
    match s {
      "open" => Ok(IssueStatus::Open),
      "resolved" => Ok(IssueStatus::Resolved),
      other => Err(crate::Error::UnknownStatus(other.to_owned())),
    }
  }
}

/// One issue per `(project_id, fingerprint)`.
///
/// `id`, `project_id`, `fingerprint`, and `title` are immutable after
/// creation; `count` and `last_seen` advance with every matching occurrence;
/// `status` is mutated only by the resolution flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
  pub id:          Uuid,
  pub project_id:  String,
  pub fingerprint: String,
  /// First seen message, verbatim.
  pub title:       String,
  /// Severity at first occurrence; later occurrences do not change it.
  pub level:       Level,
  pub count:       i64,
  pub first_seen:  DateTime<Utc>,
  pub last_seen:   DateTime<Utc>,
  pub status:      IssueStatus,
}

impl Issue {
  /// Build a fully-formed candidate issue for a first occurrence, identifier
  /// included, before any store call. The store's upsert either inserts this
  /// candidate verbatim or discards it in favour of the existing row.
  pub fn new(
    project_id: String,
    fingerprint: String,
    title: String,
    level: Level,
    seen_at: DateTime<Utc>,
  ) -> Self {
    Self {
      id: Uuid::new_v4(),
      project_id,
      fingerprint,
      title,
      level,
      count: 1,
      first_seen: seen_at,
      last_seen: seen_at,
      status: IssueStatus::Open,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_issue_is_open_with_count_one() {
    let now = Utc::now();
    let issue = Issue::new(
      "proj-1".into(),
      "fp".into(),
      "boom".into(),
      Level::Error,
      now,
    );
    assert_eq!(issue.count, 1);
    assert_eq!(issue.status, IssueStatus::Open);
    assert_eq!(issue.first_seen, issue.last_seen);
  }

  #[test]
  fn distinct_candidates_get_distinct_ids() {
    let now = Utc::now();
    let a = Issue::new("p".into(), "fp".into(), "m".into(), Level::Info, now);
    let b = Issue::new("p".into(), "fp".into(), "m".into(), Level::Info, now);
    assert_ne!(a.id, b.id);
  }
}
