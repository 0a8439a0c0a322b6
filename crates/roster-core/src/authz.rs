//! The authorization-decision contract.
//!
//! Roster does not evaluate policy. Every request is put to an external
//! authorizer together with the resource context the store can supply; the
//! authorizer answers allowed or denied. Policies typically consult the
//! ownership relations Roster mirrors into the directory.

use std::future::Future;

use serde_json::{Map, Value};
use thiserror::Error;

/// Resource-context key carrying the owning user's id.
pub const OWNER_ID_KEY: &str = "ownerID";

/// One authorization question.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthzRequest {
  /// The caller's bearer token, forwarded as the identity context.
  pub token:    String,
  /// Policy path below the policy root, e.g. `PUT.todos.__id`.
  pub policy:   String,
  /// Facts about the addressed resource, e.g. `{"ownerID": "u1"}`.
  pub resource: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
  /// The authorizer refused to evaluate the request (bad policy path,
  /// unknown instance).
  #[error("authorizer rejected request: {0}")]
  Rejected(String),

  /// Transport, authentication, or service failure.
  #[error("authorizer unavailable: {0}")]
  Unavailable(String),
}

/// Abstraction over an external policy decision point.
pub trait Authorizer: Send + Sync {
  /// `Ok(true)` if the request is allowed.
  fn is_allowed<'a>(
    &'a self,
    request: &'a AuthzRequest,
  ) -> impl Future<Output = Result<bool, AuthzError>> + Send + 'a;
}
