//! Authorization middleware.
//!
//! Runs after routing on every route. It verifies the bearer token, derives
//! the policy path from the method and the matched route (`PUT /todos/{id}`
//! becomes `PUT.todos.__id`), attaches the addressed todo's owner as
//! resource context, and asks the [`Authorizer`]. Allowed requests continue
//! with the verified [`Caller`] in their extensions.

use std::collections::HashMap;

use axum::{
  extract::{MatchedPath, Path, Request, State},
  http::Method,
  middleware::Next,
  response::Response,
};
use roster_core::{
  authz::{AuthzRequest, Authorizer, OWNER_ID_KEY},
  directory::Directory,
  store::TodoStore,
};
use serde_json::{Map, Value};

use crate::{AppState, auth::verify_bearer, error::ApiError};

/// Route whose `{id}` names a todo.
const TODO_ROUTE: &str = "/todos/{id}";

/// `{METHOD}.{segment}…` with `{param}` segments written as `__param`.
pub fn policy_path(method: &Method, route: &str) -> String {
  let mut path = method.as_str().to_owned();
  for segment in route.split('/').filter(|s| !s.is_empty()) {
    path.push('.');
    match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
      Some(param) => {
        path.push_str("__");
        path.push_str(param);
      }
      None => path.push_str(segment),
    }
  }
  path
}

pub async fn authorize<S, D, A>(
  State(state): State<AppState<S, D, A>>,
  matched: MatchedPath,
  params: Option<Path<HashMap<String, String>>>,
  mut req: Request,
  next: Next,
) -> Result<Response, ApiError>
where
  S: TodoStore + 'static,
  D: Directory + 'static,
  A: Authorizer + 'static,
{
  let caller = verify_bearer(req.headers(), &state.auth)?;

  let mut resource = Map::new();
  let todo_id = params
    .as_ref()
    .filter(|_| matched.as_str() == TODO_ROUTE)
    .and_then(|Path(p)| p.get("id"));
  if let Some(id) = todo_id {
    let todo = state
      .store
      .get(id)
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?;
    if let Some(todo) = todo {
      resource.insert(OWNER_ID_KEY.to_owned(), Value::String(todo.owner_id));
    }
  }

  let request = AuthzRequest {
    token: caller.token.clone(),
    policy: policy_path(req.method(), matched.as_str()),
    resource,
  };
  match state.authorizer.is_allowed(&request).await {
    Ok(true) => {}
    Ok(false) => {
      tracing::debug!(identity = %caller.identity, policy = %request.policy, "request denied");
      return Err(ApiError::Forbidden);
    }
    Err(e) => return Err(ApiError::Authorizer(e)),
  }

  req.extensions_mut().insert(caller);
  Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn policy_paths_follow_route_shape() {
    assert_eq!(policy_path(&Method::GET, "/todos"), "GET.todos");
    assert_eq!(policy_path(&Method::PUT, "/todos/{id}"), "PUT.todos.__id");
    assert_eq!(
      policy_path(&Method::GET, "/users/{identity}"),
      "GET.users.__identity"
    );
    assert_eq!(policy_path(&Method::GET, "/users/id/{id}"), "GET.users.id.__id");
  }
}
