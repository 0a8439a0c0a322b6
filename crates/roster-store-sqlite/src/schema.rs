//! SQL schema for the Roster SQLite store.
//!
//! Executed once at connection startup. Column names match the todo's wire
//! field names.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS todos (
    ID        TEXT PRIMARY KEY,
    Title     TEXT NOT NULL,
    Completed BOOLEAN NOT NULL,
    OwnerID   TEXT NOT NULL     -- directory user id; never rewritten
);

CREATE INDEX IF NOT EXISTS todos_owner_idx ON todos(OwnerID);

PRAGMA user_version = 1;
";
