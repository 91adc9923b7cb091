//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Levels and statuses use the same lowercase
//! strings as the wire format.

use beacon_core::{
  event::Level,
  issue::{Issue, IssueStatus},
  rule::AlertRule,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Level / status ──────────────────────────────────────────────────────────

pub fn encode_level(level: Level) -> &'static str { level.as_str() }

pub fn decode_level(s: &str) -> Result<Level> { Ok(Level::parse(s)?) }

pub fn encode_status(status: IssueStatus) -> &'static str { status.as_str() }

pub fn decode_status(s: &str) -> Result<IssueStatus> {
  Ok(IssueStatus::parse(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `issues` row.
pub struct RawIssue {
  pub issue_id:    String,
  pub project_id:  String,
  pub fingerprint: String,
  pub title:       String,
  pub level:       String,
  pub count:       i64,
  pub first_seen:  String,
  pub last_seen:   String,
  pub status:      String,
}

impl RawIssue {
  pub fn into_issue(self) -> Result<Issue> {
    Ok(Issue {
      id:          decode_uuid(&self.issue_id)?,
      project_id:  self.project_id,
      fingerprint: self.fingerprint,
      title:       self.title,
      level:       decode_level(&self.level)?,
      count:       self.count,
      first_seen:  decode_dt(&self.first_seen)?,
      last_seen:   decode_dt(&self.last_seen)?,
      status:      decode_status(&self.status)?,
    })
  }
}

/// Raw strings read directly from an `alert_rules` row.
pub struct RawRule {
  pub rule_id:    String,
  pub project_id: String,
  pub level:      String,
  pub threshold:  i64,
  pub is_active:  bool,
}

impl RawRule {
  pub fn into_rule(self) -> Result<AlertRule> {
    Ok(AlertRule {
      id:         decode_uuid(&self.rule_id)?,
      project_id: self.project_id,
      level:      decode_level(&self.level)?,
      threshold:  self.threshold,
      is_active:  self.is_active,
    })
  }
}
