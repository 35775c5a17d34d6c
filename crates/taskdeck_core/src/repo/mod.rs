//! Repository layer over the task store.
//!
//! # Responsibility
//! - Define use-case oriented task access contracts.
//! - Keep file and lock handling out of service orchestration.
//!
//! # Invariants
//! - Repository writes validate input before anything is persisted.
//! - Repository APIs return semantic errors (`NotFound`, `Validation`) in
//!   addition to storage errors.

pub mod task_repo;
