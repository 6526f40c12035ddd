//! Core domain logic for the to-do list.
//! This crate is the single source of truth for task invariants.

pub mod config;
pub mod db;
pub mod import;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig, ImportConfig, LoggingConfig, StorageConfig};
pub use import::gate::{Activation, GateState, ImportError, ImportGate, ImportOutcome};
pub use import::remote::{
    decode_todo_list, FetchError, HttpRemoteSource, RemoteSource, RemoteTask, DEFAULT_IMPORT_URL,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::task::{format_display_date, Task, TaskId, TaskPatch, TaskValidationError};
pub use repo::flag_repo::{ImportFlag, InMemoryImportFlag, SqliteImportFlag, HAS_LOADED_TASKS_KEY};
pub use repo::task_repo::{RepoError, RepoResult, SqliteTaskRepository, TaskRepository};
pub use service::task_store::{NewTask, SortOrder, StoreError, StoreResult, TaskStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
