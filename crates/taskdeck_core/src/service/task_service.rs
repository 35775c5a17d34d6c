//! Task use-case service.
//!
//! # Responsibility
//! - Provide stable entry points for CLI/GUI callers.
//! - Derive aggregate views (status counts, category choices).
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::model::task::{TaskId, TaskRecord};
use crate::repo::task_repo::{
    RepoResult, ResetScope, StatusFilter, TaskDraft, TaskListQuery, TaskPatch, TaskRepository,
};
use chrono::NaiveDate;

/// Offered when no task carries a category yet.
pub const DEFAULT_CATEGORIES: &[&str] = &["Work", "Personal", "Shopping", "Health", "Finance"];

/// Status counts shown in list footers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskSummary {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    /// Active tasks with a due date before the reference day.
    pub overdue: usize,
}

/// Use-case wrapper over a [`TaskRepository`].
pub struct TaskService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Creates a medium-priority task with only a description.
    pub fn create_task(&self, description: impl Into<String>) -> RepoResult<TaskRecord> {
        self.repo.add_task(&TaskDraft::new(description))
    }

    pub fn create_task_from(&self, draft: &TaskDraft) -> RepoResult<TaskRecord> {
        self.repo.add_task(draft)
    }

    pub fn get_task(&self, id: TaskId) -> RepoResult<Option<TaskRecord>> {
        self.repo.get_task(id)
    }

    pub fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<TaskRecord>> {
        self.repo.list_tasks(query)
    }

    pub fn complete_task(&self, id: TaskId) -> RepoResult<TaskRecord> {
        self.repo.complete_task(id)
    }

    pub fn update_task(&self, id: TaskId, patch: &TaskPatch) -> RepoResult<TaskRecord> {
        self.repo.update_task(id, patch)
    }

    pub fn delete_task(&self, id: TaskId) -> RepoResult<TaskRecord> {
        self.repo.delete_task(id)
    }

    pub fn set_reminder(&self, id: TaskId, at_epoch_secs: f64) -> RepoResult<TaskRecord> {
        self.repo.set_reminder(id, at_epoch_secs)
    }

    pub fn clear_reminder(&self, id: TaskId) -> RepoResult<TaskRecord> {
        self.repo.clear_reminder(id)
    }

    pub fn reset_notified(&self, scope: ResetScope) -> RepoResult<usize> {
        self.repo.reset_notified(scope)
    }

    /// Counts tasks by status relative to `today`.
    pub fn summary(&self, today: NaiveDate) -> RepoResult<TaskSummary> {
        let tasks = self.repo.list_tasks(&TaskListQuery {
            status: StatusFilter::All,
            ..TaskListQuery::default()
        })?;

        let completed = tasks.iter().filter(|task| task.completed).count();
        let overdue = tasks
            .iter()
            .filter(|task| !task.completed && task.is_overdue(today))
            .count();
        Ok(TaskSummary {
            total: tasks.len(),
            active: tasks.len() - completed,
            completed,
            overdue,
        })
    }

    /// Distinct categories in first-seen order, or [`DEFAULT_CATEGORIES`].
    pub fn categories(&self) -> RepoResult<Vec<String>> {
        let tasks = self.repo.list_tasks(&TaskListQuery::default())?;
        let mut categories: Vec<String> = Vec::new();
        for category in tasks.iter().filter_map(|task| task.category.as_deref()) {
            if !categories.iter().any(|known| known == category) {
                categories.push(category.to_string());
            }
        }

        if categories.is_empty() {
            return Ok(DEFAULT_CATEGORIES
                .iter()
                .map(|category| category.to_string())
                .collect());
        }
        Ok(categories)
    }
}
