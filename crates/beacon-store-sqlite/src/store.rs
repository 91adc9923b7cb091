//! [`SqliteStore`] — the SQLite implementation of [`IssueStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use beacon_core::{
  event::Level,
  issue::{Issue, IssueStatus},
  rule::AlertRule,
  store::IssueStore,
};

use crate::{
  Error, Result,
  encode::{
    RawIssue, RawRule, encode_dt, encode_level, encode_status, encode_uuid,
  },
  schema::SCHEMA,
};

const ISSUE_COLUMNS: &str =
  "issue_id, project_id, fingerprint, title, level, count, first_seen, last_seen, status";

fn read_issue_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawIssue> {
  Ok(RawIssue {
    issue_id:    row.get(0)?,
    project_id:  row.get(1)?,
    fingerprint: row.get(2)?,
    title:       row.get(3)?,
    level:       row.get(4)?,
    count:       row.get(5)?,
    first_seen:  row.get(6)?,
    last_seen:   row.get(7)?,
    status:      row.get(8)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Beacon issue store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Seeding (administrative surface; not part of the pipeline trait) ──────

  /// Register a project and its owning user.
  pub async fn add_project(&self, project_id: &str, owner_user_id: &str) -> Result<()> {
    let project_id = project_id.to_owned();
    let owner = owner_user_id.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO projects (project_id, owner_user_id) VALUES (?1, ?2)",
          rusqlite::params![project_id, owner],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Persist an operator-defined alert rule.
  pub async fn add_rule(&self, rule: &AlertRule) -> Result<()> {
    let rule_id = encode_uuid(rule.id);
    let project_id = rule.project_id.clone();
    let level = encode_level(rule.level).to_owned();
    let threshold = rule.threshold;
    let is_active = rule.is_active;
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO alert_rules (rule_id, project_id, level, threshold, is_active)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![rule_id, project_id, level, threshold, is_active],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── IssueStore impl ─────────────────────────────────────────────────────────

impl IssueStore for SqliteStore {
  type Error = Error;

  async fn upsert_occurrence(&self, candidate: Issue) -> Result<Issue> {
    let issue_id_str = encode_uuid(candidate.id);
    let project_id = candidate.project_id.clone();
    let fingerprint = candidate.fingerprint.clone();
    let title = candidate.title.clone();
    let level_str = encode_level(candidate.level).to_owned();
    let first_seen_str = encode_dt(candidate.first_seen);
    let last_seen_str = encode_dt(candidate.last_seen);

    // One statement: insert the candidate or bump the existing row. The
    // ON CONFLICT target is the (project_id, fingerprint) unique constraint;
    // status, title, level, and first_seen are never touched on conflict.
    let result: Result<RawIssue, tokio_rusqlite::Error> = self
      .conn
      .call(move |conn| {
        let raw = conn.query_row(
          &format!(
            "INSERT INTO issues ({ISSUE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7, 'open')
             ON CONFLICT (project_id, fingerprint) DO UPDATE SET
               count     = count + 1,
               last_seen = excluded.last_seen
             RETURNING {ISSUE_COLUMNS}"
          ),
          rusqlite::params![
            issue_id_str,
            project_id,
            fingerprint,
            title,
            level_str,
            first_seen_str,
            last_seen_str,
          ],
          read_issue_row,
        )?;
        Ok(raw)
      })
      .await;

    match result {
      Ok(raw) => raw.into_issue(),
      // A constraint error here means the upsert contract itself was
      // violated (e.g. an issue_id collision) — a bug signal, not a
      // silently-absorbed condition.
      Err(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _)))
        if e.code == rusqlite::ErrorCode::ConstraintViolation =>
      {
        Err(Error::UniquenessViolation {
          project_id:  candidate.project_id,
          fingerprint: candidate.fingerprint,
        })
      }
      Err(e) => Err(e.into()),
    }
  }

  async fn get_issue(&self, id: Uuid) -> Result<Option<Issue>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawIssue> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE issue_id = ?1"),
              rusqlite::params![id_str],
              read_issue_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawIssue::into_issue).transpose()
  }

  async fn list_issues(&self, project_id: &str) -> Result<Vec<Issue>> {
    let project_id = project_id.to_owned();

    let raws: Vec<RawIssue> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ISSUE_COLUMNS} FROM issues
           WHERE project_id = ?1
           ORDER BY last_seen DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![project_id], read_issue_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawIssue::into_issue).collect()
  }

  async fn resolve_issue(&self, id: Uuid) -> Result<Option<Issue>> {
    let id_str = encode_uuid(id);
    let resolved = encode_status(IssueStatus::Resolved);

    let raw: Option<RawIssue> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "UPDATE issues SET status = ?2
                 WHERE issue_id = ?1
                 RETURNING {ISSUE_COLUMNS}"
              ),
              rusqlite::params![id_str, resolved],
              read_issue_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawIssue::into_issue).transpose()
  }

  async fn project_owner(&self, project_id: &str) -> Result<Option<String>> {
    let project_id = project_id.to_owned();

    let owner: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT owner_user_id FROM projects WHERE project_id = ?1",
              rusqlite::params![project_id],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(owner)
  }

  async fn active_rules(&self, project_id: &str, level: Level) -> Result<Vec<AlertRule>> {
    let project_id = project_id.to_owned();
    let level_str = encode_level(level).to_owned();

    let raws: Vec<RawRule> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT rule_id, project_id, level, threshold, is_active
           FROM alert_rules
           WHERE project_id = ?1 AND level = ?2 AND is_active = 1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![project_id, level_str], |row| {
            Ok(RawRule {
              rule_id:    row.get(0)?,
              project_id: row.get(1)?,
              level:      row.get(2)?,
              threshold:  row.get(3)?,
              is_active:  row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRule::into_rule).collect()
  }
}
