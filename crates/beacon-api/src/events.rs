//! Handler for `POST /events` — the thin ingestion endpoint.
//!
//! Validates the payload shape and forwards it to `raw-events`, keyed by
//! `project_id`. Everything interesting happens downstream in the dedup
//! engine.

use axum::{
  Json,
  body::Bytes,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use beacon_core::{
  bus::{Publisher, RAW_EVENTS},
  event::RawEvent,
  store::IssueStore,
};
use serde_json::json;

use crate::{AppState, error::ApiError};

/// `POST /events` — body: a `RawEvent` JSON object. Replies `202 Accepted`
/// once the event is on the backbone; processing is asynchronous.
pub async fn ingest<S, B>(
  State(state): State<AppState<S, B>>,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
  S: IssueStore + 'static,
  B: Publisher + 'static,
{
  let event: RawEvent = serde_json::from_slice(&body)
    .map_err(|e| ApiError::BadRequest(format!("invalid event payload: {e}")))?;

  // Republish the validated payload verbatim.
  state
    .publisher
    .publish(RAW_EVENTS, &event.project_id, body.to_vec())
    .await
    .map_err(|e| ApiError::Bus(Box::new(e)))?;

  tracing::debug!(project_id = %event.project_id, level = %event.level, "event queued");
  Ok((StatusCode::ACCEPTED, Json(json!({ "status": "queued" }))))
}
