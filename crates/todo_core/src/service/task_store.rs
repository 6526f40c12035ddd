//! Canonical task list with write-through persistence.
//!
//! # Responsibility
//! - Hold the in-memory task list loaded from the repository.
//! - Route every mutation through the repository before touching memory.
//! - Serve search and sorted projections without side effects.
//!
//! # Invariants
//! - Memory mirrors the repository after every successful call; a failed
//!   write leaves memory untouched.
//! - Records are located by exact `TaskId`, never by position in a projection.
//! - Only one logical owner mutates a store; there is no internal locking.

use crate::model::task::{
    now_epoch_ms, validate_name, Task, TaskId, TaskPatch, TaskValidationError,
};
use crate::repo::task_repo::{RepoError, TaskRepository};
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Error taxonomy surfaced by `TaskStore` operations.
#[derive(Debug)]
pub enum StoreError {
    /// Input rejected before any persistence attempt.
    Validation(TaskValidationError),
    /// No task with this id exists.
    NotFound(TaskId),
    /// Underlying store failure; in-memory state was left unchanged.
    Persistence(RepoError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::Persistence(err) => write!(f, "task persistence failed: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<TaskValidationError> for StoreError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Persistence(other),
        }
    }
}

/// Full set of creation inputs. Omitted fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub name: String,
    pub description: Option<String>,
    pub is_completed: bool,
    /// Defaults to now when `None`.
    pub date: Option<i64>,
    pub owner_ref: Option<i64>,
}

impl NewTask {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Sort key for [`TaskStore::list_sorted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Oldest `date` first.
    #[default]
    Oldest,
    /// Newest `date` first.
    Newest,
}

/// Owner of the canonical task list.
pub struct TaskStore<R: TaskRepository> {
    repo: R,
    tasks: Vec<Task>,
}

impl<R: TaskRepository> TaskStore<R> {
    /// Loads every persisted task into memory.
    pub fn load(repo: R) -> Result<Self, StoreError> {
        let tasks = read_all(&repo)?;
        Ok(Self { repo, tasks })
    }

    /// Re-reads the canonical list from the repository.
    ///
    /// On failure the previous in-memory list is kept.
    pub fn reload(&mut self) -> StoreResult<()> {
        self.tasks = read_all(&self.repo)?;
        Ok(())
    }

    /// Returns every task. Order is insertion order and carries no meaning.
    pub fn list(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    /// Returns every task sorted by `date`, ties broken by id.
    pub fn list_sorted(&self, order: SortOrder) -> Vec<Task> {
        let mut tasks = self.tasks.clone();
        tasks.sort_by(|a, b| (a.date, a.id).cmp(&(b.date, b.id)));
        if order == SortOrder::Newest {
            tasks.reverse();
        }
        tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn count(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Creates an open task from the user-facing inputs.
    pub fn create(
        &mut self,
        name: impl Into<String>,
        description: Option<String>,
        date: Option<i64>,
        owner_ref: Option<i64>,
    ) -> StoreResult<Task> {
        self.create_with(NewTask {
            name: name.into(),
            description,
            is_completed: false,
            date,
            owner_ref,
        })
    }

    /// Creates a task with a fresh id and persists it.
    ///
    /// # Errors
    /// - [`StoreError::Validation`] for an empty name, before any write.
    /// - [`StoreError::Persistence`] when the insert fails.
    pub fn create_with(&mut self, input: NewTask) -> StoreResult<Task> {
        validate_name(&input.name)?;

        let mut task = Task::new(input.name);
        task.description = input.description;
        task.is_completed = input.is_completed;
        task.date = input.date.unwrap_or_else(now_epoch_ms);
        task.owner_ref = input.owner_ref;

        self.repo.create_task(&task).map_err(|err| {
            error!(
                "event=task_create module=store status=error task_id={} error={}",
                task.id, err
            );
            StoreError::from(err)
        })?;
        debug!(
            "event=task_create module=store status=ok task_id={} imported={}",
            task.id,
            task.owner_ref.is_some()
        );

        self.tasks.push(task.clone());
        Ok(task)
    }

    /// Applies `patch` to the canonical record as one write.
    ///
    /// Readers never observe a partially-patched task: the next version is
    /// built off to the side, persisted, and only then swapped in. An empty
    /// patch returns the current record without a write.
    pub fn update(&mut self, id: TaskId, patch: &TaskPatch) -> StoreResult<Task> {
        let index = self.position(id)?;
        if patch.is_empty() {
            return Ok(self.tasks[index].clone());
        }
        let next = self.tasks[index].patched(patch)?;

        self.repo.update_task(&next).map_err(|err| {
            error!(
                "event=task_update module=store status=error task_id={} error={}",
                id, err
            );
            StoreError::from(err)
        })?;
        debug!("event=task_update module=store status=ok task_id={id}");

        self.tasks[index] = next.clone();
        Ok(next)
    }

    /// Flips `is_completed` on the canonical record.
    pub fn toggle_completed(&mut self, id: TaskId) -> StoreResult<Task> {
        let current = self.get(id).ok_or(StoreError::NotFound(id))?.is_completed;
        self.update(id, &TaskPatch::completed(!current))
    }

    /// Replaces name and description, as the edit screen does on save.
    pub fn edit(
        &mut self,
        id: TaskId,
        name: impl Into<String>,
        description: Option<String>,
    ) -> StoreResult<Task> {
        self.update(id, &TaskPatch::edit(name, description))
    }

    /// Deletes one task by id.
    ///
    /// A second delete of the same id returns [`StoreError::NotFound`].
    pub fn delete(&mut self, id: TaskId) -> StoreResult<()> {
        let index = self.position(id)?;

        self.repo.delete_task(id).map_err(|err| {
            error!(
                "event=task_delete module=store status=error task_id={} error={}",
                id, err
            );
            StoreError::from(err)
        })?;
        info!("event=task_delete module=store status=ok task_id={id}");

        self.tasks.remove(index);
        Ok(())
    }

    /// Case-insensitive substring search over name or description.
    ///
    /// An empty query returns the full list. Pure over in-memory state.
    pub fn search(&self, query: &str) -> Vec<Task> {
        if query.is_empty() {
            return self.list();
        }

        let needle = query.to_lowercase();
        self.tasks
            .iter()
            .filter(|task| task.matches_lowercase(&needle))
            .cloned()
            .collect()
    }

    /// Borrows the repository, e.g. for predicate queries run in SQL.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    fn position(&self, id: TaskId) -> StoreResult<usize> {
        self.tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(StoreError::NotFound(id))
    }
}

fn read_all<R: TaskRepository>(repo: &R) -> StoreResult<Vec<Task>> {
    match repo.list_tasks() {
        Ok(tasks) => {
            info!(
                "event=store_load module=store status=ok count={}",
                tasks.len()
            );
            Ok(tasks)
        }
        Err(err) => {
            error!("event=store_load module=store status=error error={err}");
            Err(StoreError::Persistence(err))
        }
    }
}
