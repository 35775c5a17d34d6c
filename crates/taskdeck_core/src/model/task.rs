//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record persisted by the store.
//! - Provide field-level helpers (completion, progress, reminder state).
//!
//! # Invariants
//! - `id` is positive and never changes after creation.
//! - `description` is non-empty after trimming.
//! - `progress` stays within `0..=100`.
//! - `reminder_notified` only flips back to `false` through explicit
//!   user actions (clear/reset), never through the scheduler.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable identifier assigned by the repository (`max + 1`).
pub type TaskId = u64;

/// Upper bound for `TaskRecord::progress`.
pub const MAX_PROGRESS: u8 = 100;

/// Task priority. Ordering follows display rank: `High < Medium < Low`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Sort rank used by priority ordering.
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    /// Parses a priority label, ignoring ASCII case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived reminder lifecycle for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderState {
    /// No reminder time set.
    Unarmed,
    /// Reminder time set and not yet fired.
    Armed,
    /// Scheduler already fired this reminder.
    Fired,
}

/// Validation failures for task fields.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskValidationError {
    EmptyDescription,
    ProgressOutOfRange(i64),
    InvalidReminderTime(f64),
    ZeroId,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDescription => write!(f, "task description must not be empty"),
            Self::ProgressOutOfRange(value) => {
                write!(f, "task progress must be within 0..=100, got {value}")
            }
            Self::InvalidReminderTime(value) => {
                write!(f, "reminder time must be a finite timestamp, got {value}")
            }
            Self::ZeroId => write!(f, "task id must be positive"),
        }
    }
}

impl Error for TaskValidationError {}

/// One persisted task.
///
/// Optional fields deserialize to their defaults when missing so task files
/// written by older builds keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    /// Serialized as `YYYY-MM-DD`.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: NaiveDate,
    /// Seconds since the Unix epoch; fractional part is preserved.
    #[serde(default)]
    pub reminder_time: Option<f64>,
    #[serde(default)]
    pub reminder_notified: bool,
}

impl TaskRecord {
    /// Creates a task with defaults, created today (local time).
    pub fn new(id: TaskId, description: impl Into<String>) -> Self {
        Self::created_on(id, description, chrono::Local::now().date_naive())
    }

    /// Creates a task with defaults and an explicit creation date.
    pub fn created_on(id: TaskId, description: impl Into<String>, created_at: NaiveDate) -> Self {
        Self {
            id,
            description: description.into(),
            completed: false,
            priority: Priority::Medium,
            due_date: None,
            category: None,
            progress: 0,
            notes: None,
            tags: Vec::new(),
            created_at,
            reminder_time: None,
            reminder_notified: false,
        }
    }

    /// Validates field invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id == 0 {
            return Err(TaskValidationError::ZeroId);
        }
        validate_description(&self.description)?;
        if self.progress > MAX_PROGRESS {
            return Err(TaskValidationError::ProgressOutOfRange(i64::from(
                self.progress,
            )));
        }
        if let Some(at) = self.reminder_time {
            validate_reminder_time(at)?;
        }
        Ok(())
    }

    /// Marks the task done and forces progress to 100.
    pub fn mark_complete(&mut self) {
        self.completed = true;
        self.progress = MAX_PROGRESS;
    }

    /// Sets progress, clamping into `0..=100`.
    pub fn set_progress_clamped(&mut self, value: i64) {
        self.progress = value.clamp(0, i64::from(MAX_PROGRESS)) as u8;
    }

    pub fn reminder_state(&self) -> ReminderState {
        match (self.reminder_time, self.reminder_notified) {
            (None, _) => ReminderState::Unarmed,
            (Some(_), false) => ReminderState::Armed,
            (Some(_), true) => ReminderState::Fired,
        }
    }

    /// Returns whether the reminder is armed and due at `now` (epoch seconds).
    pub fn reminder_due(&self, now: f64) -> bool {
        match self.reminder_time {
            Some(at) => !self.reminder_notified && now >= at,
            None => false,
        }
    }

    /// Returns whether the due date lies strictly before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.due_date.is_some_and(|due| due < today)
    }

    /// Drops a reminder time that cannot be compared against the clock.
    pub(crate) fn normalize(&mut self) {
        if self.reminder_time.is_some_and(|at| !at.is_finite()) {
            self.reminder_time = None;
        }
    }
}

pub(crate) fn validate_description(value: &str) -> Result<(), TaskValidationError> {
    if value.trim().is_empty() {
        return Err(TaskValidationError::EmptyDescription);
    }
    Ok(())
}

pub(crate) fn validate_progress(value: i64) -> Result<u8, TaskValidationError> {
    if !(0..=i64::from(MAX_PROGRESS)).contains(&value) {
        return Err(TaskValidationError::ProgressOutOfRange(value));
    }
    Ok(value as u8)
}

pub(crate) fn validate_reminder_time(value: f64) -> Result<(), TaskValidationError> {
    if !value.is_finite() {
        return Err(TaskValidationError::InvalidReminderTime(value));
    }
    Ok(())
}
