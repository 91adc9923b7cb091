//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error reaches the caller as a structured JSON body with a
//! machine-distinguishable `category` alongside the human-readable message.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("forbidden")]
  Forbidden,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("bus error: {0}")]
  Bus(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  fn category(&self) -> &'static str {
    match self {
      ApiError::Unauthorized => "unauthorized",
      ApiError::Forbidden => "forbidden",
      ApiError::NotFound(_) => "not_found",
      ApiError::BadRequest(_) => "bad_request",
      ApiError::Store(_) | ApiError::Bus(_) => "internal",
    }
  }

  fn status(&self) -> StatusCode {
    match self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden => StatusCode::FORBIDDEN,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Store(_) | ApiError::Bus(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let body = json!({
      "error": self.to_string(),
      "category": self.category(),
    });
    (self.status(), Json(body)).into_response()
  }
}

impl From<beacon_engine::Error> for ApiError {
  fn from(e: beacon_engine::Error) -> Self {
    use beacon_engine::Error;
    match e {
      Error::IssueNotFound(id) => ApiError::NotFound(format!("issue {id} not found")),
      Error::Forbidden { .. } => ApiError::Forbidden,
      bad @ (Error::Malformed { .. } | Error::Encode(_)) => {
        ApiError::BadRequest(bad.to_string())
      }
      Error::Store(inner) => ApiError::Store(inner),
      Error::Bus(inner) => ApiError::Bus(inner),
      timeout @ Error::Timeout { .. } => ApiError::Store(Box::new(timeout)),
    }
  }
}
