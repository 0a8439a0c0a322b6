//! Error type for `roster-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A todo with this id already exists.
  #[error("todo {0} already exists")]
  DuplicateTodo(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
