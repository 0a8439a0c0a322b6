//! The `TodoStore` trait — the primary, authoritative store.
//!
//! The trait is implemented by storage backends (e.g. `roster-store-sqlite`).
//! The API layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::todo::{Todo, TodoUpdate};

/// Abstraction over the primary todo store.
///
/// Single-row operations are assumed durable and strongly consistent; the
/// directory mirror is only written after they succeed.
pub trait TodoStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Return every todo in insertion order.
  fn list(&self) -> impl Future<Output = Result<Vec<Todo>, Self::Error>> + Send + '_;

  /// Retrieve a todo by id. Returns `None` if not found.
  fn get<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Todo>, Self::Error>> + Send + 'a;

  /// Persist a new todo. Fails if the id is already taken.
  fn insert<'a>(
    &'a self,
    todo: &'a Todo,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Replace the title and completion flag of an existing todo. The owner is
  /// never rewritten. Returns `None` if the todo does not exist.
  fn update<'a>(
    &'a self,
    id: &'a str,
    update: TodoUpdate,
  ) -> impl Future<Output = Result<Option<Todo>, Self::Error>> + Send + 'a;

  /// Delete a todo. Returns `false` if it did not exist.
  fn delete<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
