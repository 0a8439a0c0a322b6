//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use roster_core::authz::AuthzError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  /// The authorizer denied the request.
  #[error("forbidden")]
  Forbidden,

  /// The authorizer could not be asked. Details are logged, not returned.
  #[error("authorizer unavailable")]
  Authorizer(#[source] AuthzError),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The caller's identity (or a requested user id) has no user.
  #[error("user not found")]
  UserNotFound(#[source] roster_identity::Error),

  /// Probe failure or directory fault. Details are logged, not returned.
  #[error("directory unavailable")]
  Directory(#[source] roster_identity::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<roster_identity::Error> for ApiError {
  fn from(e: roster_identity::Error) -> Self {
    if e.is_not_found() {
      ApiError::UserNotFound(e)
    } else {
      ApiError::Directory(e)
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized => {
        let mut res = (
          StatusCode::UNAUTHORIZED,
          Json(json!({ "error": "unauthorized" })),
        )
          .into_response();
        res
          .headers_mut()
          .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        return res;
      }
      ApiError::Forbidden => (StatusCode::FORBIDDEN, "forbidden".to_owned()),
      ApiError::Authorizer(e) => {
        tracing::error!(error = %e, "authorizer request failed");
        (StatusCode::SERVICE_UNAVAILABLE, "authorizer unavailable".to_owned())
      }
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::UserNotFound(e) => {
        tracing::debug!(error = %e, "user resolution found no user");
        (StatusCode::NOT_FOUND, "user not found".to_owned())
      }
      ApiError::Directory(e) => {
        tracing::error!(error = %e, "directory request failed");
        (StatusCode::SERVICE_UNAVAILABLE, "directory unavailable".to_owned())
      }
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
