//! Key-value slot for process-wide lock state.
//!
//! # Responsibility
//! - Hold the PIN digest and session expiry outside the task collections.
//! - Allow an in-memory fake so the lock gate can be tested without SQLite.
//!
//! # Invariants
//! - One value per key; `set` overwrites.
//! - `remove` of a missing key is a no-op.

use crate::repo::task_repo::RepoResult;
use rusqlite::{Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::HashMap;

/// Minimal get/set/clear capability used by the lock gate.
pub trait SessionStore {
    fn get(&self, key: &str) -> RepoResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> RepoResult<()>;
    fn remove(&self, key: &str) -> RepoResult<()>;
}

/// Session slot persisted in the `session_kv` table.
pub struct SqliteSessionStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSessionStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SessionStore for SqliteSessionStore<'_> {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM session_kv WHERE key = ?1;", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO session_kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
            [key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM session_kv WHERE key = ?1;", [key])?;
        Ok(())
    }
}

/// In-memory session slot for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: RefCell<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> RepoResult<()> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> RepoResult<()> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MemorySessionStore, SessionStore, SqliteSessionStore};
    use crate::db::open_db_in_memory;

    fn exercise(store: &dyn SessionStore) {
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "one").unwrap();
        store.set("k", "two").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn memory_store_overwrites_and_removes() {
        exercise(&MemorySessionStore::new());
    }

    #[test]
    fn sqlite_store_overwrites_and_removes() {
        let conn = open_db_in_memory().unwrap();
        exercise(&SqliteSessionStore::new(&conn));
    }
}
