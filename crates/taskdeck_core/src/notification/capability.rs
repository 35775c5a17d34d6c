//! Notification capability consumed by the reminder scheduler.
//!
//! # Responsibility
//! - Define the single `Notifier` seam platform backends plug into.
//! - Build deterministic reminder messages from task records.
//! - Contain notifier failures so they never cross into the scheduler.
//!
//! # Invariants
//! - `deliver_guarded` never panics and never blocks beyond the notifier.
//! - Medium priority is never shown in the title.

use crate::model::task::{Priority, TaskRecord};
use log::{error, warn};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Platform notification backend.
///
/// Implementations should return quickly (a few seconds at most) and report
/// failures as `false` instead of panicking.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str) -> bool;
}

/// Writes notifications to stdout. Always reports delivery.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, title: &str, body: &str) -> bool {
        println!("\n[NOTIFICATION] {title}: {body}");
        true
    }
}

/// Adapts a closure into a [`Notifier`].
pub struct FnNotifier<F>(F);

impl<F> FnNotifier<F>
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self(callback)
    }
}

impl<F> Notifier for FnNotifier<F>
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn notify(&self, title: &str, body: &str) -> bool {
        (self.0)(title, body)
    }
}

/// Rendered reminder text for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderMessage {
    pub title: String,
    pub body: String,
}

impl ReminderMessage {
    /// `Task Reminder [High]` / `Task #3: Pay rent (Due: 2024-01-01)`.
    pub fn for_task(task: &TaskRecord) -> Self {
        let title = match task.priority {
            Priority::Medium => "Task Reminder".to_string(),
            other => format!("Task Reminder [{other}]"),
        };
        let mut body = format!("Task #{}: {}", task.id, task.description);
        if let Some(due) = task.due_date {
            body.push_str(&format!(" (Due: {})", due.format("%Y-%m-%d")));
        }
        Self { title, body }
    }
}

/// Result of one guarded delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// Notifier returned `false`.
    Failed,
    /// Notifier panicked; treated as a failed delivery.
    Panicked,
}

impl DeliveryOutcome {
    pub fn is_delivered(self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Invokes `notifier`, turning a panic into [`DeliveryOutcome::Panicked`].
pub fn deliver_guarded(notifier: &dyn Notifier, message: &ReminderMessage) -> DeliveryOutcome {
    let attempt = catch_unwind(AssertUnwindSafe(|| {
        notifier.notify(&message.title, &message.body)
    }));

    match attempt {
        Ok(true) => DeliveryOutcome::Delivered,
        Ok(false) => {
            warn!("event=notify module=notification status=failed");
            DeliveryOutcome::Failed
        }
        Err(_) => {
            error!("event=notify module=notification status=panicked");
            DeliveryOutcome::Panicked
        }
    }
}
