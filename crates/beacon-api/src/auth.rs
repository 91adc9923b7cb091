//! Bearer-credential extractor backed by the identity collaborator.
//!
//! Every authenticated request carries `Authorization: Bearer <token>`; the
//! token resolves to a stable opaque `user_id` which the core trusts as-is.
//! Credential issuance and refresh live outside this service.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use beacon_core::{bus::Publisher, store::IssueStore};

use crate::{AppState, error::ApiError};

/// Resolves a bearer credential to a user id. `None` means the credential is
/// missing from the identity collaborator's view — reject with 401.
pub trait Identity: Send + Sync {
  fn resolve(&self, token: &str) -> Option<String>;
}

/// Static token → user mapping, built from configuration.
pub struct TokenMap {
  tokens: std::collections::HashMap<String, String>,
}

impl TokenMap {
  pub fn new(tokens: std::collections::HashMap<String, String>) -> Self {
    Self { tokens }
  }
}

impl Identity for TokenMap {
  fn resolve(&self, token: &str) -> Option<String> {
    self.tokens.get(token).cloned()
  }
}

/// The authenticated requester. Present in a handler's signature means the
/// request carried a resolvable bearer credential.
pub struct CurrentUser(pub String);

/// Verify the bearer header directly — shared by the extractor and tests.
pub fn verify_bearer(headers: &HeaderMap, identity: &dyn Identity) -> Result<String, ApiError> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let token = header_val
    .strip_prefix("Bearer ")
    .ok_or(ApiError::Unauthorized)?;

  identity.resolve(token).ok_or(ApiError::Unauthorized)
}

impl<S, B> FromRequestParts<AppState<S, B>> for CurrentUser
where
  S: IssueStore + 'static,
  B: Publisher + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, B>,
  ) -> Result<Self, Self::Rejection> {
    let user_id = verify_bearer(&parts.headers, state.identity.as_ref())?;
    Ok(CurrentUser(user_id))
  }
}

#[cfg(test)]
mod tests {
  use std::{collections::HashMap, sync::Arc};

  use axum::http::{Request, header};
  use beacon_core::{event::Level, issue::Issue, rule::AlertRule};
  use uuid::Uuid;

  use super::*;

  // Minimal no-op collaborators for testing the extractor only.
  #[derive(Clone)]
  struct NoopStore;

  impl IssueStore for NoopStore {
    type Error = std::convert::Infallible;
    async fn upsert_occurrence(&self, _: Issue) -> Result<Issue, Self::Error> { unimplemented!() }
    async fn get_issue(&self, _: Uuid) -> Result<Option<Issue>, Self::Error> { unimplemented!() }
    async fn list_issues(&self, _: &str) -> Result<Vec<Issue>, Self::Error> { unimplemented!() }
    async fn resolve_issue(&self, _: Uuid) -> Result<Option<Issue>, Self::Error> { unimplemented!() }
    async fn project_owner(&self, _: &str) -> Result<Option<String>, Self::Error> { unimplemented!() }
    async fn active_rules(&self, _: &str, _: Level) -> Result<Vec<AlertRule>, Self::Error> { unimplemented!() }
  }

  struct NoopBus;

  impl Publisher for NoopBus {
    type Error = std::convert::Infallible;
    async fn publish(&self, _: &str, _: &str, _: Vec<u8>) -> Result<(), Self::Error> { Ok(()) }
  }

  fn make_state() -> AppState<NoopStore, NoopBus> {
    let tokens =
      HashMap::from([("sekrit".to_string(), "user-7".to_string())]);
    AppState {
      store:     Arc::new(NoopStore),
      publisher: Arc::new(NoopBus),
      identity:  Arc::new(TokenMap::new(tokens)),
    }
  }

  async fn extract(
    req: Request<axum::body::Body>,
    state: &AppState<NoopStore, NoopBus>,
  ) -> Result<CurrentUser, ApiError> {
    let (mut parts, _) = req.into_parts();
    CurrentUser::from_request_parts(&mut parts, state).await
  }

  #[tokio::test]
  async fn known_token_resolves_to_user() {
    let state = make_state();
    let req = Request::builder()
      .header(header::AUTHORIZATION, "Bearer sekrit")
      .body(axum::body::Body::empty())
      .unwrap();
    let user = extract(req, &state).await.unwrap();
    assert_eq!(user.0, "user-7");
  }

  #[tokio::test]
  async fn unknown_token_is_unauthorized() {
    let state = make_state();
    let req = Request::builder()
      .header(header::AUTHORIZATION, "Bearer nope")
      .body(axum::body::Body::empty())
      .unwrap();
    assert!(matches!(
      extract(req, &state).await,
      Err(ApiError::Unauthorized)
    ));
  }

  #[tokio::test]
  async fn missing_header_is_unauthorized() {
    let state = make_state();
    let req = Request::builder().body(axum::body::Body::empty()).unwrap();
    assert!(matches!(
      extract(req, &state).await,
      Err(ApiError::Unauthorized)
    ));
  }

  #[tokio::test]
  async fn non_bearer_scheme_is_unauthorized() {
    let state = make_state();
    let req = Request::builder()
      .header(header::AUTHORIZATION, "Basic c2Vrcml0")
      .body(axum::body::Body::empty())
      .unwrap();
    assert!(matches!(
      extract(req, &state).await,
      Err(ApiError::Unauthorized)
    ));
  }
}
