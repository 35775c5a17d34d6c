//! Core domain logic for TaskDeck.
//! Task records, JSON persistence, listing queries and the reminder scheduler
//! live here; front ends only render and collect input.

pub mod logging;
pub mod model;
pub mod notification;
pub mod repo;
pub mod service;
pub mod store;

pub use logging::{init_logging, logging_status, LogLevel};
pub use model::settings::Settings;
pub use model::task::{Priority, ReminderState, TaskId, TaskRecord, TaskValidationError};
pub use notification::capability::{ConsoleNotifier, FnNotifier, Notifier, ReminderMessage};
pub use repo::task_repo::{
    DueBucket, FileTaskRepository, RepoError, RepoResult, ResetScope, StatusFilter, TaskDraft,
    TaskListQuery, TaskPatch, TaskRepository, TaskSort,
};
pub use service::reminder_scheduler::{
    ReminderConfig, ReminderScheduler, SchedulerHandle, TickReport,
};
pub use service::task_service::{TaskService, TaskSummary};
pub use store::{SettingsStore, StoreError, StorePaths, TaskStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
