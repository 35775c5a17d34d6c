//! Domain model for tasks and user settings.
//!
//! # Responsibility
//! - Define the records the store persists and the repository mutates.
//! - Keep field defaults in one place so deserialization resolves them once.
//!
//! # Invariants
//! - Every task is identified by a positive, immutable `TaskId`.
//! - Deletion is a hard removal from the collection.

pub mod settings;
pub mod task;
