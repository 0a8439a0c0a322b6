//! Todo — the owned resource held by the primary store.

use serde::{Deserialize, Serialize};

/// A todo row. Field names on the wire match the columns clients already
/// use (`ID`, `Title`, `Completed`, `OwnerID`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
  #[serde(rename = "ID")]
  pub id:        String,
  #[serde(rename = "Title")]
  pub title:     String,
  #[serde(rename = "Completed")]
  pub completed: bool,
  /// The owning user's directory id. Fixed at creation.
  #[serde(rename = "OwnerID")]
  pub owner_id:  String,
}

/// Caller-supplied fields for a new todo. `ID` and `OwnerID` are always
/// assigned server-side.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTodo {
  #[serde(rename = "Title")]
  pub title:     String,
  #[serde(rename = "Completed", default)]
  pub completed: bool,
}

impl NewTodo {
  /// Materialise into a [`Todo`] with the given id and owner.
  pub fn into_todo(self, id: String, owner_id: String) -> Todo {
    Todo {
      id,
      title: self.title,
      completed: self.completed,
      owner_id,
    }
  }
}

/// Replacement fields for an existing todo. The owner is not updatable.
#[derive(Debug, Clone, Deserialize)]
pub struct TodoUpdate {
  #[serde(rename = "Title")]
  pub title:     String,
  #[serde(rename = "Completed")]
  pub completed: bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn serialises_with_column_names() {
    let todo = Todo {
      id:        "t1".into(),
      title:     "Buy milk".into(),
      completed: false,
      owner_id:  "u1".into(),
    };
    let json = serde_json::to_value(&todo).unwrap();
    assert_eq!(
      json,
      serde_json::json!({
        "ID": "t1", "Title": "Buy milk", "Completed": false, "OwnerID": "u1"
      })
    );
  }

  #[test]
  fn new_todo_ignores_client_supplied_ids() {
    let body: NewTodo = serde_json::from_value(serde_json::json!({
      "Title": "Buy milk", "ID": "forged", "OwnerID": "someone-else"
    }))
    .unwrap();
    let todo = body.into_todo("t1".into(), "u1".into());
    assert_eq!(todo.id, "t1");
    assert_eq!(todo.owner_id, "u1");
    assert!(!todo.completed);
  }
}
