//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use delegasi_core::ErrorKind;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Workflow(#[from] delegasi_core::Error),

  /// No usable `x-actor-id`, or it names nobody in the directory.
  #[error("unauthenticated: {0}")]
  Unauthenticated(String),

  #[error("bad request: {0}")]
  BadRequest(String),
}

fn status_for(kind: ErrorKind) -> StatusCode {
  match kind {
    ErrorKind::InvalidTransition | ErrorKind::Conflict => StatusCode::CONFLICT,
    ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
    ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
    ErrorKind::NotFound => StatusCode::NOT_FOUND,
    ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
    ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, kind) = match &self {
      ApiError::Workflow(e) => (status_for(e.kind()), e.kind().as_str()),
      ApiError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "unauthenticated"),
      ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
    };
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    (status, Json(json!({ "error": self.to_string(), "kind": kind }))).into_response()
  }
}
