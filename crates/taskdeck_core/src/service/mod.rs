//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Run the background reminder scan against the shared store.

pub mod reminder_scheduler;
pub mod task_service;
