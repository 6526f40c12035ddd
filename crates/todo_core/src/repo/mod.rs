//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define the persistence contracts consumed by `TaskStore` and `ImportGate`.
//! - Keep SQL and row mapping inside the core persistence boundary.
//!
//! # Invariants
//! - Repository writes call `Task::validate()` before SQL mutations.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod flag_repo;
pub mod task_repo;
