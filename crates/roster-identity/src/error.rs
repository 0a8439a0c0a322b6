//! Error types for `roster-identity`.

use roster_core::directory::DirectoryError;
use thiserror::Error;

/// Failure to resolve a caller into a user.
#[derive(Debug, Error)]
pub enum Error {
  /// The schema probe could not classify the directory. Not memoized; the
  /// next call probes again.
  #[error("schema probe failed: {0}")]
  ProbeFailure(#[source] DirectoryError),

  /// No identity-to-user mapping exists.
  #[error("no user is linked to identity {0:?}")]
  IdentityNotFound(String),

  #[error("user not found: {0}")]
  UserNotFound(String),

  /// Transport or service fault talking to the directory.
  #[error("directory unavailable: {0}")]
  DirectoryUnavailable(#[source] DirectoryError),

  /// The directory refused a request it should have accepted.
  #[error("directory rejected request: {0}")]
  DirectoryRejected(#[source] DirectoryError),
}

impl Error {
  /// True for the recoverable "no such user" outcomes.
  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::IdentityNotFound(_) | Self::UserNotFound(_))
  }
}

impl From<DirectoryError> for Error {
  fn from(e: DirectoryError) -> Self {
    match e {
      DirectoryError::Unavailable(_) => Self::DirectoryUnavailable(e),
      DirectoryError::NotFound(_) | DirectoryError::InvalidArgument(_) => {
        Self::DirectoryRejected(e)
      }
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure to mirror a primary-store change into the directory.
///
/// Never fatal: the primary store has already committed. Callers log it.
#[derive(Debug, Error)]
pub enum SyncError {
  #[error("writing resource object for todo {todo_id}: {source}")]
  WriteObject {
    todo_id: String,
    source:  DirectoryError,
  },

  /// The resource object exists but has no owner relation.
  #[error("writing owner relation for todo {todo_id}: {source}")]
  WriteRelation {
    todo_id: String,
    source:  DirectoryError,
  },

  #[error("deleting resource object for todo {todo_id}: {source}")]
  DeleteObject {
    todo_id: String,
    source:  DirectoryError,
  },
}

impl SyncError {
  pub fn todo_id(&self) -> &str {
    match self {
      Self::WriteObject { todo_id, .. }
      | Self::WriteRelation { todo_id, .. }
      | Self::DeleteObject { todo_id, .. } => todo_id,
    }
  }
}
