//! Handlers for issue endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/projects/{project_id}/issues` | Owner only; `last_seen` descending |
//! | `GET`   | `/issues/{id}` | 404 if absent |
//! | `PATCH` | `/issues/{id}/resolve` | Owner only; idempotent |

use axum::{
  Json,
  extract::{Path, State},
};
use beacon_core::{bus::Publisher, issue::Issue, store::IssueStore};
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError};

/// Issue ids arrive as path segments; a malformed one is a client error and
/// gets the same JSON error shape as every other rejection.
fn parse_issue_id(raw: &str) -> Result<Uuid, ApiError> {
  raw
    .parse()
    .map_err(|_| ApiError::BadRequest(format!("invalid issue id {raw:?}")))
}

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /projects/{project_id}/issues`
pub async fn list<S, B>(
  State(state): State<AppState<S, B>>,
  CurrentUser(user_id): CurrentUser,
  Path(project_id): Path<String>,
) -> Result<Json<Vec<Issue>>, ApiError>
where
  S: IssueStore + 'static,
  B: Publisher + 'static,
{
  let owner = state
    .store
    .project_owner(&project_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if owner.as_deref() != Some(user_id.as_str()) {
    return Err(ApiError::Forbidden);
  }

  let issues = state
    .store
    .list_issues(&project_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(issues))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /issues/{id}`
pub async fn get_one<S, B>(
  State(state): State<AppState<S, B>>,
  CurrentUser(_user_id): CurrentUser,
  Path(id): Path<String>,
) -> Result<Json<Issue>, ApiError>
where
  S: IssueStore + 'static,
  B: Publisher + 'static,
{
  let id = parse_issue_id(&id)?;
  let issue = state
    .store
    .get_issue(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("issue {id} not found")))?;
  Ok(Json(issue))
}

// ─── Resolve ─────────────────────────────────────────────────────────────────

/// `PATCH /issues/{id}/resolve`
pub async fn resolve_one<S, B>(
  State(state): State<AppState<S, B>>,
  CurrentUser(user_id): CurrentUser,
  Path(id): Path<String>,
) -> Result<Json<Issue>, ApiError>
where
  S: IssueStore + 'static,
  B: Publisher + 'static,
{
  let id = parse_issue_id(&id)?;
  let issue = beacon_engine::resolve(
    state.store.as_ref(),
    state.publisher.as_ref(),
    id,
    &user_id,
  )
  .await?;
  Ok(Json(issue))
}
