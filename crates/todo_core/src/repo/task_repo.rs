//! Task repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide id-keyed CRUD over the `tasks` table.
//! - Map rows to `Task` with explicit, typed column handling.
//!
//! # Invariants
//! - Write paths validate before touching SQL.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Every statement addresses rows by exact `id`, never by position.

use crate::db::{DbError, UNICODE_LOWER_FN};
use crate::model::task::{Task, TaskId, TaskValidationError};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    is_completed,
    date,
    owner_ref
FROM tasks";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for task persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(TaskValidationError),
    Db(DbError),
    NotFound(TaskId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence contract for tasks.
///
/// Each call is its own implicit transaction, committed before returning.
pub trait TaskRepository {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId>;
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Lists every task ordered by `date ASC, id ASC`.
    fn list_tasks(&self) -> RepoResult<Vec<Task>>;
    /// Case-insensitive substring match over name or description.
    fn search_tasks(&self, query: &str) -> RepoResult<Vec<Task>>;
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        self.conn.execute(
            "INSERT INTO tasks (
                id,
                name,
                description,
                is_completed,
                date,
                owner_ref
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                task.id.to_string(),
                task.name.as_str(),
                task.description.as_deref(),
                bool_to_int(task.is_completed),
                task.date,
                task.owner_ref,
            ],
        )?;

        Ok(task.id)
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                name = ?1,
                description = ?2,
                is_completed = ?3,
                date = ?4,
                owner_ref = ?5
             WHERE id = ?6;",
            params![
                task.name.as_str(),
                task.description.as_deref(),
                bool_to_int(task.is_completed),
                task.date,
                task.owner_ref,
                task.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(task.id));
        }

        Ok(())
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }

        Ok(None)
    }

    fn list_tasks(&self) -> RepoResult<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} ORDER BY date ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();

        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }

    fn search_tasks(&self, query: &str) -> RepoResult<Vec<Task>> {
        if query.is_empty() {
            return self.list_tasks();
        }

        // Built-in lower()/LIKE fold ASCII only. Both sides go through the
        // same Rust lowercase as `TaskStore::search`.
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE {UNICODE_LOWER_FN}(name) LIKE ?1 ESCAPE '\\'
                OR {UNICODE_LOWER_FN}(coalesce(description, '')) LIKE ?1 ESCAPE '\\'
             ORDER BY date ASC, id ASC;"
        ))?;
        let pattern = format!("%{}%", escape_like(&query.to_lowercase()));
        let mut rows = stmt.query([pattern])?;
        let mut tasks = Vec::new();

        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in tasks.id"))
    })?;

    let is_completed = match row.get::<_, i64>("is_completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_completed value `{other}` in tasks.is_completed"
            )));
        }
    };

    let task = Task {
        id,
        name: row.get("name")?,
        description: row.get("description")?,
        is_completed,
        date: row.get("date")?,
        owner_ref: row.get("owner_ref")?,
    };
    task.validate()?;
    Ok(task)
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn escape_like_guards_wildcards() {
        assert_eq!(escape_like("2.5%_a\\b"), "2.5\\%\\_a\\\\b");
        assert_eq!(escape_like("milk"), "milk");
    }
}
