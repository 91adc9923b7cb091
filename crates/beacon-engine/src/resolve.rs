//! The issue resolution flow.
//!
//! `open --resolve()--> resolved` is the only status transition in this
//! core; nothing flips an issue back to open.

use beacon_core::{
  bus::{ISSUE_RESOLVED, Publisher},
  event::IssueResolved,
  issue::Issue,
  store::IssueStore,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{Error, Result};

/// Resolve `issue_id` on behalf of `user_id`.
///
/// Preconditions: the issue exists, and `user_id` owns its project.
/// Idempotent — resolving an already-resolved issue is a no-op success that
/// still emits an `IssueResolved` message. Returns the updated issue.
pub async fn resolve<S, P>(
  store: &S,
  publisher: &P,
  issue_id: Uuid,
  user_id: &str,
) -> Result<Issue>
where
  S: IssueStore,
  P: Publisher,
{
  let issue = store
    .get_issue(issue_id)
    .await
    .map_err(|e| Error::Store(Box::new(e)))?
    .ok_or(Error::IssueNotFound(issue_id))?;

  let owner = store
    .project_owner(&issue.project_id)
    .await
    .map_err(|e| Error::Store(Box::new(e)))?;
  if owner.as_deref() != Some(user_id) {
    return Err(Error::Forbidden {
      project_id: issue.project_id,
      user_id:    user_id.to_owned(),
    });
  }

  let resolved = store
    .resolve_issue(issue_id)
    .await
    .map_err(|e| Error::Store(Box::new(e)))?
    .ok_or(Error::IssueNotFound(issue_id))?;

  let message = IssueResolved {
    issue_id:    resolved.id,
    project_id:  resolved.project_id.clone(),
    resolved_at: Utc::now(),
  };
  publisher
    .publish(
      ISSUE_RESOLVED,
      &resolved.project_id,
      serde_json::to_vec(&message)?,
    )
    .await
    .map_err(|e| Error::Bus(Box::new(e)))?;

  tracing::info!(
    issue_id = %resolved.id,
    project_id = %resolved.project_id,
    user_id,
    "issue resolved"
  );
  Ok(resolved)
}

#[cfg(test)]
mod tests {
  use beacon_bus::MemoryBus;
  use beacon_core::{
    bus::{Consumer as _, Subscriber},
    event::Level,
    fingerprint,
    issue::IssueStatus,
  };
  use beacon_store_sqlite::SqliteStore;

  use super::*;

  async fn seeded_store() -> (SqliteStore, Issue) {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store.add_project("proj-1", "alice").await.unwrap();
    let issue = store
      .upsert_occurrence(Issue::new(
        "proj-1".into(),
        fingerprint("boom", None),
        "boom".into(),
        Level::Error,
        Utc::now(),
      ))
      .await
      .unwrap();
    (store, issue)
  }

  #[tokio::test]
  async fn owner_resolves_and_message_is_emitted() {
    let (store, issue) = seeded_store().await;
    let bus = MemoryBus::new(2);
    let mut resolved_feed = bus.subscribe(ISSUE_RESOLVED, "test").await.unwrap();

    let resolved = resolve(&store, &bus, issue.id, "alice").await.unwrap();
    assert_eq!(resolved.status, IssueStatus::Resolved);

    let d = resolved_feed.fetch().await.unwrap();
    let message: IssueResolved = serde_json::from_slice(&d.payload).unwrap();
    assert_eq!(message.issue_id, issue.id);
    assert_eq!(message.project_id, "proj-1");
    assert_eq!(d.key, "proj-1");
  }

  #[tokio::test]
  async fn missing_issue_is_not_found() {
    let (store, _) = seeded_store().await;
    let bus = MemoryBus::new(2);

    let err = resolve(&store, &bus, Uuid::new_v4(), "alice").await.unwrap_err();
    assert!(matches!(err, Error::IssueNotFound(_)));
  }

  #[tokio::test]
  async fn non_owner_is_forbidden_even_for_existing_issue() {
    let (store, issue) = seeded_store().await;
    let bus = MemoryBus::new(2);

    let err = resolve(&store, &bus, issue.id, "mallory").await.unwrap_err();
    assert!(matches!(err, Error::Forbidden { .. }));

    // No mutation happened.
    let unchanged = store.get_issue(issue.id).await.unwrap().unwrap();
    assert_eq!(unchanged.status, IssueStatus::Open);
  }

  #[tokio::test]
  async fn unknown_project_owner_is_forbidden() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let issue = store
      .upsert_occurrence(Issue::new(
        "proj-orphan".into(),
        fingerprint("boom", None),
        "boom".into(),
        Level::Error,
        Utc::now(),
      ))
      .await
      .unwrap();
    let bus = MemoryBus::new(2);

    let err = resolve(&store, &bus, issue.id, "alice").await.unwrap_err();
    assert!(matches!(err, Error::Forbidden { .. }));
  }

  #[tokio::test]
  async fn resolving_twice_is_a_no_op_success() {
    let (store, issue) = seeded_store().await;
    let bus = MemoryBus::new(2);

    let first = resolve(&store, &bus, issue.id, "alice").await.unwrap();
    let second = resolve(&store, &bus, issue.id, "alice").await.unwrap();

    assert_eq!(second.status, IssueStatus::Resolved);
    assert_eq!(second.count, first.count);
    assert_eq!(second.first_seen, first.first_seen);
    assert_eq!(second.fingerprint, first.fingerprint);
  }
}
