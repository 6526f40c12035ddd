//! Domain model for the to-do list.
//!
//! # Responsibility
//! - Define the canonical task record used by core business logic.
//! - Keep presentation helpers (share text, display date) next to the data.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod task;
