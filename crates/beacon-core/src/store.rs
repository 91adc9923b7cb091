//! The `IssueStore` trait.
//!
//! Implemented by storage backends (e.g. `beacon-store-sqlite`). Higher
//! layers (`beacon-engine`, `beacon-api`) depend on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{event::Level, issue::Issue, rule::AlertRule};

/// Abstraction over the persisted issue aggregate.
///
/// The store is the one shared mutable resource with real contention:
/// concurrent callers may target the same `(project_id, fingerprint)` key,
/// so [`upsert_occurrence`](IssueStore::upsert_occurrence) must be a single
/// atomic operation — never a read followed by a separate write.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait IssueStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Aggregation ───────────────────────────────────────────────────────

  /// Atomic find-or-create-and-increment for one occurrence.
  ///
  /// If no issue exists for `(candidate.project_id, candidate.fingerprint)`,
  /// the candidate is inserted verbatim (`count == 1`, `status == open`).
  /// Otherwise the existing row's `count` is incremented and `last_seen` is
  /// set to `candidate.last_seen`; `status`, `title`, `level`, and
  /// `first_seen` are left untouched — a resolved issue keeps counting
  /// without reopening.
  ///
  /// Returns the authoritative post-write row.
  fn upsert_occurrence(
    &self,
    candidate: Issue,
  ) -> impl Future<Output = Result<Issue, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Retrieve an issue by id. Returns `None` if not found.
  fn get_issue(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Issue>, Self::Error>> + Send + '_;

  /// All issues for a project, ordered by `last_seen` descending.
  fn list_issues<'a>(
    &'a self,
    project_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Issue>, Self::Error>> + Send + 'a;

  // ── Resolution ────────────────────────────────────────────────────────

  /// Set `status = resolved`, idempotently: resolving an already-resolved
  /// issue is a no-op success. Returns the updated row, or `None` if the
  /// issue does not exist.
  fn resolve_issue(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Issue>, Self::Error>> + Send + '_;

  // ── Collaborator lookups ──────────────────────────────────────────────

  /// The `user_id` owning a project, or `None` for an unknown project.
  fn project_owner<'a>(
    &'a self,
    project_id: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  /// Active alert rules for `(project_id, level)`. Read-only to this core.
  fn active_rules<'a>(
    &'a self,
    project_id: &'a str,
    level: Level,
  ) -> impl Future<Output = Result<Vec<AlertRule>, Self::Error>> + Send + 'a;
}
