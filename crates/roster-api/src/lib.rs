//! JSON REST API for Roster.
//!
//! Exposes an axum [`Router`] backed by any [`TodoStore`], [`Directory`] and
//! [`Authorizer`]. Every route requires a bearer token, whose subject is the
//! caller's identity, and an allow decision from the authorizer. TLS and
//! CORS are the caller's responsibility.

pub mod auth;
pub mod authz;
pub mod error;
pub mod todos;
pub mod users;

use std::sync::Arc;

use axum::{
  Router, middleware,
  routing::{get, put},
};
use roster_core::{authz::Authorizer, directory::Directory, store::TodoStore, user::User};
use roster_identity::{IdentityResolver, ResourceRelationSynchronizer, UserCache};
use tower_http::trace::TraceLayer;

pub use auth::{AuthConfig, Caller};
pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, D, A> {
  pub store:      Arc<S>,
  pub resolver:   Arc<IdentityResolver<D>>,
  pub users:      Arc<UserCache>,
  pub sync:       Arc<ResourceRelationSynchronizer<D>>,
  pub authorizer: Arc<A>,
  pub auth:       Arc<AuthConfig>,
}

impl<S, D, A> Clone for AppState<S, D, A> {
  fn clone(&self) -> Self {
    Self {
      store:      self.store.clone(),
      resolver:   self.resolver.clone(),
      users:      self.users.clone(),
      sync:       self.sync.clone(),
      authorizer: self.authorizer.clone(),
      auth:       self.auth.clone(),
    }
  }
}

impl<S, D: Directory + 'static, A> AppState<S, D, A> {
  /// Wire the resolver and synchronizer to one shared directory.
  pub fn new(
    store: Arc<S>,
    directory: Arc<D>,
    authorizer: Arc<A>,
    users: UserCache,
    auth: AuthConfig,
  ) -> Self {
    Self {
      store,
      resolver: Arc::new(IdentityResolver::new(directory.clone())),
      users: Arc::new(users),
      sync: Arc::new(ResourceRelationSynchronizer::new(directory)),
      authorizer,
      auth: Arc::new(auth),
    }
  }

  /// Resolve an identity through the user cache.
  pub async fn resolve_identity(&self, identity: &str) -> Result<User, roster_identity::Error> {
    if let Some(user) = self.users.get(identity) {
      return Ok(user);
    }
    let user = self.resolver.resolve_by_identity(identity).await?;
    self.users.put(identity, user.clone());
    Ok(user)
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn router<S, D, A>(state: AppState<S, D, A>) -> Router
where
  S: TodoStore + 'static,
  D: Directory + 'static,
  A: Authorizer + 'static,
{
  Router::new()
    // Users
    .route("/users/{identity}", get(users::by_identity::<S, D, A>))
    .route("/users/id/{id}", get(users::by_id::<S, D, A>))
    // Todos
    .route("/todos", get(todos::list::<S, D, A>).post(todos::create::<S, D, A>))
    .route(
      "/todos/{id}",
      put(todos::update::<S, D, A>).delete(todos::delete::<S, D, A>),
    )
    .route_layer(middleware::from_fn_with_state(
      state.clone(),
      authz::authorize::<S, D, A>,
    ))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
