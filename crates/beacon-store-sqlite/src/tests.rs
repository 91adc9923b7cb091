//! Integration tests for `SqliteStore` against an in-memory database.

use beacon_core::{
  event::Level,
  fingerprint,
  issue::{Issue, IssueStatus},
  rule::AlertRule,
  store::IssueStore,
};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn candidate(project_id: &str, message: &str) -> Issue {
  Issue::new(
    project_id.to_owned(),
    fingerprint(message, None),
    message.to_owned(),
    Level::Error,
    Utc::now(),
  )
}

// ─── Upsert ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_occurrence_creates_open_issue() {
  let s = store().await;

  let issue = s.upsert_occurrence(candidate("proj-1", "boom")).await.unwrap();
  assert_eq!(issue.count, 1);
  assert_eq!(issue.status, IssueStatus::Open);
  assert_eq!(issue.title, "boom");
  assert_eq!(issue.level, Level::Error);
  assert_eq!(issue.first_seen, issue.last_seen);
}

#[tokio::test]
async fn repeated_occurrences_increment_one_issue() {
  let s = store().await;

  let mut last = None;
  for _ in 0..5 {
    last = Some(s.upsert_occurrence(candidate("proj-1", "boom")).await.unwrap());
  }

  let issue = last.unwrap();
  assert_eq!(issue.count, 5);

  let all = s.list_issues("proj-1").await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].count, 5);
}

#[tokio::test]
async fn existing_issue_keeps_id_title_level_and_first_seen() {
  let s = store().await;

  let first = s.upsert_occurrence(candidate("proj-1", "boom")).await.unwrap();

  let mut later = candidate("proj-1", "boom");
  later.title = "boom, but phrased differently".into();
  later.level = Level::Fatal;
  later.last_seen = first.last_seen + Duration::seconds(30);
  later.first_seen = later.last_seen;
  let second = s.upsert_occurrence(later).await.unwrap();

  assert_eq!(second.id, first.id);
  assert_eq!(second.title, "boom");
  assert_eq!(second.level, Level::Error);
  assert_eq!(second.first_seen, first.first_seen);
  assert!(second.last_seen > first.last_seen);
  assert_eq!(second.count, 2);
}

#[tokio::test]
async fn distinct_fingerprints_create_distinct_issues() {
  let s = store().await;

  s.upsert_occurrence(candidate("proj-1", "boom")).await.unwrap();
  s.upsert_occurrence(candidate("proj-1", "bang")).await.unwrap();

  let all = s.list_issues("proj-1").await.unwrap();
  assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn same_fingerprint_in_different_projects_is_separate() {
  let s = store().await;

  s.upsert_occurrence(candidate("proj-1", "boom")).await.unwrap();
  s.upsert_occurrence(candidate("proj-2", "boom")).await.unwrap();

  assert_eq!(s.list_issues("proj-1").await.unwrap().len(), 1);
  assert_eq!(s.list_issues("proj-2").await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_upserts_preserve_uniqueness_and_count() {
  let s = store().await;

  let mut handles = Vec::new();
  for _ in 0..32 {
    let s = s.clone();
    handles.push(tokio::spawn(async move {
      s.upsert_occurrence(candidate("proj-1", "boom")).await.unwrap()
    }));
  }
  for h in handles {
    h.await.unwrap();
  }

  let all = s.list_issues("proj-1").await.unwrap();
  assert_eq!(all.len(), 1, "duplicate rows for one fingerprint");
  assert_eq!(all[0].count, 32, "lost increments under concurrency");
}

// ─── Reads ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_issue_roundtrip() {
  let s = store().await;

  let created = s.upsert_occurrence(candidate("proj-1", "boom")).await.unwrap();
  let fetched = s.get_issue(created.id).await.unwrap().unwrap();

  assert_eq!(fetched.id, created.id);
  assert_eq!(fetched.fingerprint, created.fingerprint);
  assert_eq!(fetched.first_seen, created.first_seen);
  assert_eq!(fetched.status, IssueStatus::Open);
}

#[tokio::test]
async fn get_issue_missing_returns_none() {
  let s = store().await;
  assert!(s.get_issue(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_issues_orders_by_last_seen_descending() {
  let s = store().await;

  let base = Utc::now();
  for (i, message) in ["old", "mid", "new"].iter().enumerate() {
    let mut c = candidate("proj-1", message);
    c.first_seen = base + Duration::seconds(i as i64);
    c.last_seen = c.first_seen;
    s.upsert_occurrence(c).await.unwrap();
  }

  let all = s.list_issues("proj-1").await.unwrap();
  let titles: Vec<&str> = all.iter().map(|i| i.title.as_str()).collect();
  assert_eq!(titles, vec!["new", "mid", "old"]);
}

// ─── Resolution ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn resolve_flips_status() {
  let s = store().await;

  let issue = s.upsert_occurrence(candidate("proj-1", "boom")).await.unwrap();
  let resolved = s.resolve_issue(issue.id).await.unwrap().unwrap();
  assert_eq!(resolved.status, IssueStatus::Resolved);
}

#[tokio::test]
async fn resolve_is_idempotent() {
  let s = store().await;

  let issue = s.upsert_occurrence(candidate("proj-1", "boom")).await.unwrap();
  let first = s.resolve_issue(issue.id).await.unwrap().unwrap();
  let second = s.resolve_issue(issue.id).await.unwrap().unwrap();

  assert_eq!(second.status, IssueStatus::Resolved);
  assert_eq!(second.count, first.count);
  assert_eq!(second.first_seen, first.first_seen);
  assert_eq!(second.fingerprint, first.fingerprint);
}

#[tokio::test]
async fn resolve_missing_returns_none() {
  let s = store().await;
  assert!(s.resolve_issue(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn resolved_issue_keeps_counting_without_reopening() {
  let s = store().await;

  let issue = s.upsert_occurrence(candidate("proj-1", "boom")).await.unwrap();
  s.resolve_issue(issue.id).await.unwrap();

  let after = s.upsert_occurrence(candidate("proj-1", "boom")).await.unwrap();
  assert_eq!(after.count, 2);
  assert_eq!(after.status, IssueStatus::Resolved);
  assert!(after.last_seen >= issue.last_seen);
}

// ─── Projects and rules ──────────────────────────────────────────────────────

#[tokio::test]
async fn project_owner_lookup() {
  let s = store().await;
  s.add_project("proj-1", "user-7").await.unwrap();

  assert_eq!(
    s.project_owner("proj-1").await.unwrap().as_deref(),
    Some("user-7")
  );
  assert!(s.project_owner("proj-unknown").await.unwrap().is_none());
}

#[tokio::test]
async fn active_rules_filter_by_level_and_activity() {
  let s = store().await;

  s.add_rule(&AlertRule::new("proj-1".into(), Level::Error, 3))
    .await
    .unwrap();
  s.add_rule(&AlertRule::new("proj-1".into(), Level::Warning, 10))
    .await
    .unwrap();

  let mut inactive = AlertRule::new("proj-1".into(), Level::Error, 1);
  inactive.is_active = false;
  s.add_rule(&inactive).await.unwrap();

  s.add_rule(&AlertRule::new("proj-2".into(), Level::Error, 5))
    .await
    .unwrap();

  let rules = s.active_rules("proj-1", Level::Error).await.unwrap();
  assert_eq!(rules.len(), 1);
  assert_eq!(rules[0].threshold, 3);
  assert!(rules[0].is_active);
}
