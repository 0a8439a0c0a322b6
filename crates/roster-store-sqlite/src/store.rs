//! [`SqliteStore`] — the SQLite implementation of [`TodoStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;

use roster_core::{
  store::TodoStore,
  todo::{Todo, TodoUpdate},
};

use crate::{Error, Result, schema::SCHEMA};

const SELECT_TODO: &str = "SELECT ID, Title, Completed, OwnerID FROM todos";

fn row_to_todo(row: &rusqlite::Row<'_>) -> rusqlite::Result<Todo> {
  Ok(Todo {
    id:        row.get(0)?,
    title:     row.get(1)?,
    completed: row.get(2)?,
    owner_id:  row.get(3)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A todo store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── TodoStore impl ──────────────────────────────────────────────────────────

impl TodoStore for SqliteStore {
  type Error = Error;

  async fn list(&self) -> Result<Vec<Todo>> {
    let todos = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!("{SELECT_TODO} ORDER BY rowid"))?;
        let rows = stmt
          .query_map([], row_to_todo)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(todos)
  }

  async fn get(&self, id: &str) -> Result<Option<Todo>> {
    let id = id.to_owned();
    let todo = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("{SELECT_TODO} WHERE ID = ?1"),
              rusqlite::params![id],
              row_to_todo,
            )
            .optional()?,
        )
      })
      .await?;
    Ok(todo)
  }

  async fn insert(&self, todo: &Todo) -> Result<()> {
    let row = todo.clone();
    let inserted = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "INSERT OR IGNORE INTO todos (ID, Title, Completed, OwnerID)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![row.id, row.title, row.completed, row.owner_id],
        )?;
        Ok(changed == 1)
      })
      .await?;

    if !inserted {
      return Err(Error::DuplicateTodo(todo.id.clone()));
    }
    Ok(())
  }

  async fn update(&self, id: &str, update: TodoUpdate) -> Result<Option<Todo>> {
    let id = id.to_owned();
    let todo = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE todos SET Title = ?1, Completed = ?2 WHERE ID = ?3",
          rusqlite::params![update.title, update.completed, id],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(
          conn
            .query_row(
              &format!("{SELECT_TODO} WHERE ID = ?1"),
              rusqlite::params![id],
              row_to_todo,
            )
            .optional()?,
        )
      })
      .await?;
    Ok(todo)
  }

  async fn delete(&self, id: &str) -> Result<bool> {
    let id = id.to_owned();
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM todos WHERE ID = ?1", rusqlite::params![id])?)
      })
      .await?;
    Ok(changed > 0)
  }
}
