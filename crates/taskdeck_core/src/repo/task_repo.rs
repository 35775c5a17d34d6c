//! Task repository contracts and file-backed implementation.
//!
//! # Responsibility
//! - Provide collection-level CRUD and reminder operations over `TaskStore`.
//! - Own id assignment (`max(existing) + 1`, or 1 when empty).
//!
//! # Invariants
//! - Every mutation is one load-modify-commit cycle under a single
//!   `StoreGuard`; nothing is written when validation or lookup fails.
//! - Mutations never write over a collection that failed to load.
//! - Read paths never mutate storage.

use crate::model::task::{
    validate_description, validate_progress, validate_reminder_time, Priority, TaskId,
    TaskRecord, TaskValidationError,
};
use crate::store::{StoreError, TaskStore};
use chrono::{Days, NaiveDate};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for task operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(TaskValidationError),
    NotFound(TaskId),
    Store(StoreError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Input for creating a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub description: String,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
    pub category: Option<String>,
}

impl TaskDraft {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Partial update. `None` leaves a field untouched; for optional fields
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<NaiveDate>>,
    pub category: Option<Option<String>>,
    /// Validated against `0..=100`; wide type so bad input is reportable.
    pub progress: Option<i64>,
    pub notes: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

/// Completion filter for listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

/// Due-date bucket relative to the reference day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueBucket {
    Today,
    /// From today through today + 7 days, inclusive.
    ThisWeek,
    /// Strictly before today.
    Overdue,
    NoDueDate,
}

/// Sort key for listing. All sorts are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSort {
    Id,
    /// Case-insensitive.
    Description,
    /// `High` first.
    Priority,
    /// Tasks without a due date sort last.
    DueDate,
    Progress,
}

/// Filter and sort options for listing tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListQuery {
    pub status: StatusFilter,
    pub priority: Option<Priority>,
    pub due: Option<DueBucket>,
    /// Exact category match.
    pub category: Option<String>,
    /// Case-insensitive substring over description, notes, category and tags.
    pub search: Option<String>,
    /// `None` keeps storage order.
    pub sort: Option<TaskSort>,
    /// Day used for due buckets; defaults to the local date.
    pub reference_date: Option<NaiveDate>,
}

impl TaskListQuery {
    /// Filters and sorts `tasks` into a fresh sequence.
    pub fn apply(&self, tasks: Vec<TaskRecord>) -> Vec<TaskRecord> {
        let today = self
            .reference_date
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let needle = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_lowercase);

        let mut matched: Vec<TaskRecord> = tasks
            .into_iter()
            .filter(|task| self.matches(task, today, needle.as_deref()))
            .collect();

        if let Some(sort) = self.sort {
            sort_tasks(&mut matched, sort);
        }
        matched
    }

    fn matches(&self, task: &TaskRecord, today: NaiveDate, needle: Option<&str>) -> bool {
        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Active => !task.completed,
            StatusFilter::Completed => task.completed,
        };
        if !status_ok {
            return false;
        }

        if self.priority.is_some_and(|priority| priority != task.priority) {
            return false;
        }

        if let Some(bucket) = self.due {
            if !in_due_bucket(task.due_date, bucket, today) {
                return false;
            }
        }

        if let Some(category) = self.category.as_deref() {
            if task.category.as_deref() != Some(category) {
                return false;
            }
        }

        match needle {
            Some(needle) => matches_search(task, needle),
            None => true,
        }
    }
}

fn in_due_bucket(due: Option<NaiveDate>, bucket: DueBucket, today: NaiveDate) -> bool {
    match (bucket, due) {
        (DueBucket::NoDueDate, due) => due.is_none(),
        (_, None) => false,
        (DueBucket::Today, Some(due)) => due == today,
        (DueBucket::ThisWeek, Some(due)) => {
            let end = today.checked_add_days(Days::new(7)).unwrap_or(NaiveDate::MAX);
            today <= due && due <= end
        }
        (DueBucket::Overdue, Some(due)) => due < today,
    }
}

fn matches_search(task: &TaskRecord, needle: &str) -> bool {
    let contains = |value: &str| value.to_lowercase().contains(needle);
    contains(task.description.as_str())
        || task.notes.as_deref().is_some_and(contains)
        || task.category.as_deref().is_some_and(contains)
        || task.tags.iter().any(|tag| contains(tag.as_str()))
}

fn sort_tasks(tasks: &mut [TaskRecord], sort: TaskSort) {
    match sort {
        TaskSort::Id => tasks.sort_by_key(|task| task.id),
        TaskSort::Description => tasks.sort_by_cached_key(|task| task.description.to_lowercase()),
        TaskSort::Priority => tasks.sort_by_key(|task| task.priority.rank()),
        TaskSort::DueDate => tasks.sort_by_key(|task| (task.due_date.is_none(), task.due_date)),
        TaskSort::Progress => tasks.sort_by_key(|task| task.progress),
    }
}

/// Which reminder flags `reset_notified` clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetScope {
    One(TaskId),
    All,
}

/// Repository interface for task operations.
pub trait TaskRepository {
    fn add_task(&self, draft: &TaskDraft) -> RepoResult<TaskRecord>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<TaskRecord>>;
    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<TaskRecord>>;
    fn complete_task(&self, id: TaskId) -> RepoResult<TaskRecord>;
    fn update_task(&self, id: TaskId, patch: &TaskPatch) -> RepoResult<TaskRecord>;
    fn delete_task(&self, id: TaskId) -> RepoResult<TaskRecord>;
    fn set_reminder(&self, id: TaskId, at_epoch_secs: f64) -> RepoResult<TaskRecord>;
    fn clear_reminder(&self, id: TaskId) -> RepoResult<TaskRecord>;
    fn reset_notified(&self, scope: ResetScope) -> RepoResult<usize>;
}

/// Repository backed by the shared JSON `TaskStore`.
#[derive(Debug, Clone)]
pub struct FileTaskRepository {
    store: Arc<TaskStore>,
}

impl FileTaskRepository {
    pub fn new(store: Arc<TaskStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<TaskStore> {
        &self.store
    }

    /// Runs one load-modify-commit cycle. `change` errors abort the cycle
    /// before anything is written.
    ///
    /// Loads with `try_load`, so a collection that cannot be read from either
    /// file is reported as `RepoError::Store` instead of being overwritten.
    fn mutate<T, F>(&self, event: &str, change: F) -> RepoResult<T>
    where
        F: FnOnce(&mut Vec<TaskRecord>) -> RepoResult<T>,
    {
        let guard = self.store.lock();
        let mut tasks = guard.try_load()?;
        let value = change(&mut tasks)?;
        guard.commit(&tasks)?;
        info!("event={event} module=repo status=ok count={}", tasks.len());
        Ok(value)
    }

    fn mutate_one<F>(&self, event: &str, id: TaskId, change: F) -> RepoResult<TaskRecord>
    where
        F: FnOnce(&mut TaskRecord) -> RepoResult<()>,
    {
        self.mutate(event, |tasks| {
            let task = tasks
                .iter_mut()
                .find(|task| task.id == id)
                .ok_or(RepoError::NotFound(id))?;
            change(task)?;
            Ok(task.clone())
        })
    }
}

/// Next id for `tasks`: one past the largest, or 1 when empty.
pub fn next_task_id(tasks: &[TaskRecord]) -> TaskId {
    tasks.iter().map(|task| task.id).max().map_or(1, |max| max + 1)
}

impl TaskRepository for FileTaskRepository {
    fn add_task(&self, draft: &TaskDraft) -> RepoResult<TaskRecord> {
        validate_description(&draft.description)?;

        self.mutate("task_add", |tasks| {
            let mut task = TaskRecord::new(next_task_id(tasks), draft.description.trim());
            task.priority = draft.priority.unwrap_or_default();
            task.due_date = draft.due_date;
            task.category = normalize_label(draft.category.as_deref());
            tasks.push(task.clone());
            Ok(task)
        })
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<TaskRecord>> {
        Ok(self.store.load().into_iter().find(|task| task.id == id))
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<TaskRecord>> {
        let tasks = query.apply(self.store.load());
        debug!("event=task_list module=repo status=ok count={}", tasks.len());
        Ok(tasks)
    }

    fn complete_task(&self, id: TaskId) -> RepoResult<TaskRecord> {
        self.mutate_one("task_complete", id, |task| {
            task.mark_complete();
            Ok(())
        })
    }

    fn update_task(&self, id: TaskId, patch: &TaskPatch) -> RepoResult<TaskRecord> {
        self.mutate_one("task_update", id, |task| {
            apply_patch(task, patch)?;
            Ok(())
        })
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<TaskRecord> {
        self.mutate("task_delete", |tasks| {
            let index = tasks
                .iter()
                .position(|task| task.id == id)
                .ok_or(RepoError::NotFound(id))?;
            Ok(tasks.remove(index))
        })
    }

    fn set_reminder(&self, id: TaskId, at_epoch_secs: f64) -> RepoResult<TaskRecord> {
        validate_reminder_time(at_epoch_secs)?;
        self.mutate_one("reminder_set", id, |task| {
            task.reminder_time = Some(at_epoch_secs);
            Ok(())
        })
    }

    fn clear_reminder(&self, id: TaskId) -> RepoResult<TaskRecord> {
        self.mutate_one("reminder_clear", id, |task| {
            task.reminder_time = None;
            task.reminder_notified = false;
            Ok(())
        })
    }

    fn reset_notified(&self, scope: ResetScope) -> RepoResult<usize> {
        self.mutate("reminder_reset", |tasks| {
            if let ResetScope::One(id) = scope {
                if !tasks.iter().any(|task| task.id == id) {
                    return Err(RepoError::NotFound(id));
                }
            }

            let mut reset = 0;
            for task in tasks.iter_mut() {
                let in_scope = match scope {
                    ResetScope::One(id) => task.id == id,
                    ResetScope::All => true,
                };
                if in_scope && task.reminder_notified {
                    task.reminder_notified = false;
                    reset += 1;
                }
            }
            Ok(reset)
        })
    }
}

/// Validates the whole patch before touching `task`, so a rejected patch
/// leaves the record unchanged.
fn apply_patch(task: &mut TaskRecord, patch: &TaskPatch) -> Result<(), TaskValidationError> {
    if let Some(description) = patch.description.as_deref() {
        validate_description(description)?;
    }
    let progress = patch.progress.map(validate_progress).transpose()?;

    if let Some(description) = patch.description.as_deref() {
        task.description = description.trim().to_string();
    }
    if let Some(priority) = patch.priority {
        task.priority = priority;
    }
    if let Some(due_date) = patch.due_date {
        task.due_date = due_date;
    }
    if let Some(category) = &patch.category {
        task.category = normalize_label(category.as_deref());
    }
    if let Some(notes) = &patch.notes {
        task.notes = notes.clone().filter(|value| !value.trim().is_empty());
    }
    if let Some(tags) = &patch.tags {
        task.tags = tags
            .iter()
            .filter_map(|tag| normalize_label(Some(tag)))
            .collect();
    }
    if let Some(progress) = progress {
        task.progress = progress;
    }
    // Completion forces 100 only on the false -> true edge; un-completing
    // keeps whatever progress the task had.
    match patch.completed {
        Some(true) if !task.completed => task.mark_complete(),
        Some(completed) => task.completed = completed,
        None => {}
    }
    Ok(())
}

fn normalize_label(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
