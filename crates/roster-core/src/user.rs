//! The canonical internal user record.

use serde::{Deserialize, Serialize};

/// A user resolved from the directory.
///
/// `id` is the directory's object identifier for the `user` type and is the
/// join key stored as a todo's owner. Users are never mutated after
/// resolution; callers receive clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:      String,
  pub name:    String,
  pub email:   String,
  pub picture: String,
}
