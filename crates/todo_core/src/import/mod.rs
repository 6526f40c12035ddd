//! One-time remote seed of the task list.
//!
//! # Responsibility
//! - Fetch the remote to-do collection off the owning thread.
//! - Merge it into `TaskStore` exactly once per persisted data set.
//!
//! # Invariants
//! - The import flag is committed only after every fetched task is persisted.
//! - Fetch results reach the store only through the owner calling
//!   `ImportGate::poll` or `ImportGate::wait`.

pub mod gate;
pub mod remote;
