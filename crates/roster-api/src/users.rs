//! Handlers for `/users` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/users/{identity}` | Resolve an external identity; served from the user cache when possible |
//! | `GET`  | `/users/id/{id}` | Direct lookup by directory user id |

use axum::{
  Json,
  extract::{Path, State},
};
use roster_core::{authz::Authorizer, directory::Directory, store::TodoStore, user::User};

use crate::{AppState, auth::Caller, error::ApiError};

/// `GET /users/{identity}`
pub async fn by_identity<S, D, A>(
  State(state): State<AppState<S, D, A>>,
  _caller: Caller,
  Path(identity): Path<String>,
) -> Result<Json<User>, ApiError>
where
  S: TodoStore + 'static,
  D: Directory + 'static,
  A: Authorizer + 'static,
{
  let user = state.resolve_identity(&identity).await?;
  Ok(Json(user))
}

/// `GET /users/id/{id}`
pub async fn by_id<S, D, A>(
  State(state): State<AppState<S, D, A>>,
  _caller: Caller,
  Path(id): Path<String>,
) -> Result<Json<User>, ApiError>
where
  S: TodoStore + 'static,
  D: Directory + 'static,
  A: Authorizer + 'static,
{
  let user = state.resolver.resolve_by_id(&id).await?;
  Ok(Json(user))
}
