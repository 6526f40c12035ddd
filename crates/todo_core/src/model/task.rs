//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record and its validation rules.
//! - Describe partial updates as an explicit field patch.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `name` is never empty (whitespace-only counts as empty).

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a task, also used as the persistence key.
pub type TaskId = Uuid;

const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// Validation failures for task write paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Name is empty or whitespace only.
    EmptyName,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "task name must not be empty"),
        }
    }
}

impl Error for TaskValidationError {}

/// Canonical to-do record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub description: Option<String>,
    pub is_completed: bool,
    /// Unix epoch milliseconds.
    pub date: i64,
    /// Remote `userId` for imported tasks, `None` for local ones.
    pub owner_ref: Option<i64>,
}

impl Task {
    /// Creates an open task dated now with a generated ID.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            is_completed: false,
            date: now_epoch_ms(),
            owner_ref: None,
        }
    }

    /// Checks write-path invariants.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_name(&self.name)
    }

    /// Applies a patch to a copy of this task, leaving `self` untouched.
    ///
    /// The returned task is validated, so callers can persist it directly.
    pub fn patched(&self, patch: &TaskPatch) -> Result<Task, TaskValidationError> {
        let mut next = self.clone();
        if let Some(name) = &patch.name {
            next.name = name.clone();
        }
        if let Some(description) = &patch.description {
            next.description = description.clone();
        }
        if let Some(is_completed) = patch.is_completed {
            next.is_completed = is_completed;
        }
        if let Some(date) = patch.date {
            next.date = date;
        }
        if let Some(owner_ref) = patch.owner_ref {
            next.owner_ref = owner_ref;
        }
        next.validate()?;
        Ok(next)
    }

    /// Plain-text rendering handed to an external share sheet.
    pub fn share_text(&self) -> String {
        format!(
            "Task: {}\nDescription: {}",
            self.name,
            self.description.as_deref().unwrap_or("")
        )
    }

    /// Returns `date` as `dd/MM/yyyy` in local time.
    pub fn display_date(&self) -> String {
        format_display_date(self.date, &Local)
    }

    /// Returns whether `query` occurs in the name or description, ignoring case.
    ///
    /// `query` must already be lowercased.
    pub(crate) fn matches_lowercase(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(query)
            || self
                .description
                .as_deref()
                .is_some_and(|description| description.to_lowercase().contains(query))
    }
}

/// Field changes applied by `TaskStore::update`.
///
/// `None` leaves a field untouched. Nullable fields use a nested `Option`
/// so they can be cleared with `Some(None)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub is_completed: Option<bool>,
    pub date: Option<i64>,
    pub owner_ref: Option<Option<i64>>,
}

impl TaskPatch {
    pub fn completed(is_completed: bool) -> Self {
        Self {
            is_completed: Some(is_completed),
            ..Self::default()
        }
    }

    /// Edit-screen save: replaces name and description together.
    pub fn edit(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: Some(name.into()),
            description: Some(description),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Formats epoch milliseconds as `dd/MM/yyyy` in the given zone.
///
/// Out-of-range timestamps fall back to the Unix epoch.
pub fn format_display_date<Tz>(epoch_ms: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let utc = DateTime::<Utc>::from_timestamp_millis(epoch_ms).unwrap_or_default();
    utc.with_timezone(tz)
        .format(DISPLAY_DATE_FORMAT)
        .to_string()
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub(crate) fn validate_name(name: &str) -> Result<(), TaskValidationError> {
    if name.trim().is_empty() {
        return Err(TaskValidationError::EmptyName);
    }
    Ok(())
}
