//! Handlers for `/todos` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/todos` | All todos |
//! | `POST`   | `/todos` | Body: `{"Title":"...","Completed":false}`; owner is the caller; returns 201 + todo |
//! | `PUT`    | `/todos/{id}` | Body: `{"Title":"...","Completed":true}` |
//! | `DELETE` | `/todos/{id}` | Returns 204 |
//!
//! Every write is committed to the store first and mirrored into the
//! directory afterwards. A failed mirror is logged and does not change the
//! response.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use roster_core::{
  authz::Authorizer,
  directory::Directory,
  store::TodoStore,
  todo::{NewTodo, Todo, TodoUpdate},
};
use roster_identity::SyncError;
use uuid::Uuid;

use crate::{AppState, auth::Caller, error::ApiError};

fn log_sync_failure(result: Result<(), SyncError>) {
  if let Err(e) = result {
    tracing::warn!(todo_id = e.todo_id(), error = %e, "directory mirror out of sync");
  }
}

fn require_title(title: &str) -> Result<(), ApiError> {
  if title.trim().is_empty() {
    return Err(ApiError::BadRequest("Title must not be empty".to_owned()));
  }
  Ok(())
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /todos`
pub async fn list<S, D, A>(
  State(state): State<AppState<S, D, A>>,
  _caller: Caller,
) -> Result<Json<Vec<Todo>>, ApiError>
where
  S: TodoStore + 'static,
  D: Directory + 'static,
  A: Authorizer + 'static,
{
  let todos = state
    .store
    .list()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(todos))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /todos` — returns 201 + the stored [`Todo`].
pub async fn create<S, D, A>(
  State(state): State<AppState<S, D, A>>,
  caller: Caller,
  Json(body): Json<NewTodo>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TodoStore + 'static,
  D: Directory + 'static,
  A: Authorizer + 'static,
{
  require_title(&body.title)?;

  let owner = state.resolve_identity(&caller.identity).await?;
  let todo = body.into_todo(Uuid::new_v4().to_string(), owner.id);

  state
    .store
    .insert(&todo)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  log_sync_failure(state.sync.on_create(&todo).await);

  Ok((StatusCode::CREATED, Json(todo)))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /todos/{id}`
pub async fn update<S, D, A>(
  State(state): State<AppState<S, D, A>>,
  _caller: Caller,
  Path(id): Path<String>,
  Json(body): Json<TodoUpdate>,
) -> Result<Json<Todo>, ApiError>
where
  S: TodoStore + 'static,
  D: Directory + 'static,
  A: Authorizer + 'static,
{
  require_title(&body.title)?;

  let todo = state
    .store
    .update(&id, body)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("todo {id} not found")))?;
  log_sync_failure(state.sync.on_update(&todo).await);

  Ok(Json(todo))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /todos/{id}`
pub async fn delete<S, D, A>(
  State(state): State<AppState<S, D, A>>,
  _caller: Caller,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: TodoStore + 'static,
  D: Directory + 'static,
  A: Authorizer + 'static,
{
  let existed = state
    .store
    .delete(&id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !existed {
    return Err(ApiError::NotFound(format!("todo {id} not found")));
  }
  log_sync_failure(state.sync.on_delete(&id).await);

  Ok(StatusCode::NO_CONTENT)
}
