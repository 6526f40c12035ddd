//! Persisted one-time import flag.
//!
//! # Responsibility
//! - Remember across restarts whether the first-run import completed.
//!
//! # Invariants
//! - The flag only ever moves from unset to set.

use crate::repo::task_repo::RepoResult;
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::Cell;

/// Fixed key of the import flag row in `app_flags`.
pub const HAS_LOADED_TASKS_KEY: &str = "has_loaded_tasks";

/// State object consulted by `ImportGate`.
pub trait ImportFlag {
    fn is_imported(&self) -> RepoResult<bool>;
    fn mark_imported(&self) -> RepoResult<()>;
}

/// SQLite-backed flag stored in the `app_flags` table.
pub struct SqliteImportFlag<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteImportFlag<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ImportFlag for SqliteImportFlag<'_> {
    fn is_imported(&self) -> RepoResult<bool> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM app_flags WHERE key = ?1;",
                [HAS_LOADED_TASKS_KEY],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(value == Some(1))
    }

    fn mark_imported(&self) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO app_flags (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![HAS_LOADED_TASKS_KEY, 1_i64],
        )?;
        Ok(())
    }
}

/// Process-local flag for tests and ephemeral stores.
#[derive(Debug, Default)]
pub struct InMemoryImportFlag {
    imported: Cell<bool>,
}

impl InMemoryImportFlag {
    pub fn new(imported: bool) -> Self {
        Self {
            imported: Cell::new(imported),
        }
    }
}

impl ImportFlag for InMemoryImportFlag {
    fn is_imported(&self) -> RepoResult<bool> {
        Ok(self.imported.get())
    }

    fn mark_imported(&self) -> RepoResult<()> {
        self.imported.set(true);
        Ok(())
    }
}

impl<F: ImportFlag + ?Sized> ImportFlag for &F {
    fn is_imported(&self) -> RepoResult<bool> {
        (**self).is_imported()
    }

    fn mark_imported(&self) -> RepoResult<()> {
        (**self).mark_imported()
    }
}
