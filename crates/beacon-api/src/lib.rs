//! JSON HTTP surface for Beacon.
//!
//! Exposes an axum [`Router`] backed by any [`IssueStore`] and
//! [`Publisher`]. The transport itself is thin: the dedup, alerting, and
//! resolution semantics live in `beacon-engine` and the store.

pub mod auth;
pub mod error;
pub mod events;
pub mod issues;

pub use error::ApiError;

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, patch, post},
};
use beacon_core::{bus::Publisher, store::IssueStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::Identity;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` with
/// `BEACON_*` environment overrides.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Partition count for the in-process backbone.
  #[serde(default = "default_partitions")]
  pub partitions: usize,
  /// Bearer token → opaque user id. The identity collaborator's contract:
  /// the core trusts the resolved value as-is.
  #[serde(default)]
  pub tokens:     HashMap<String, String>,
}

fn default_partitions() -> usize { 4 }

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, B> {
  pub store:     Arc<S>,
  pub publisher: Arc<B>,
  pub identity:  Arc<dyn Identity>,
}

impl<S, B> Clone for AppState<S, B> {
  fn clone(&self) -> Self {
    Self {
      store:     Arc::clone(&self.store),
      publisher: Arc::clone(&self.publisher),
      identity:  Arc::clone(&self.identity),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised router for the Beacon API.
pub fn router<S, B>(state: AppState<S, B>) -> Router
where
  S: IssueStore + 'static,
  B: Publisher + 'static,
{
  Router::new()
    .route("/events", post(events::ingest::<S, B>))
    .route("/projects/{project_id}/issues", get(issues::list::<S, B>))
    .route("/issues/{id}", get(issues::get_one::<S, B>))
    .route("/issues/{id}/resolve", patch(issues::resolve_one::<S, B>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
