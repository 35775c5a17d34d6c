//! Reminder scheduler.
//!
//! # Responsibility
//! - Scan the task collection for due, unnotified reminders.
//! - Fire each reminder at most once through the injected `Notifier`.
//! - Run scans on a fixed interval on a background thread with a clean stop.
//!
//! # Invariants
//! - A reminder is marked notified and persisted before its notification is
//!   attempted; delivery failures are never retried.
//! - A tick that cannot load or persist marks nothing and delivers nothing.
//! - Tick errors are logged and never leave the scheduler.
//! - A stop request takes effect before the next tick; an in-flight tick is
//!   never interrupted.

use crate::model::settings::{NotificationSettings, MIN_POLL_INTERVAL_SECS};
use crate::model::task::TaskId;
use crate::notification::capability::{deliver_guarded, Notifier, ReminderMessage};
use crate::store::TaskStore;
use log::{debug, error, info, warn};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const THREAD_NAME: &str = "taskdeck-reminders";

/// Scheduler knobs, resolved from settings at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderConfig {
    /// When false, due reminders are still marked fired but not delivered.
    pub enabled: bool,
    pub notify_completed: bool,
    pub poll_interval: Duration,
}

impl ReminderConfig {
    pub fn from_settings(settings: &NotificationSettings) -> Self {
        Self {
            enabled: settings.enabled,
            notify_completed: settings.notify_completed,
            poll_interval: settings.poll_interval(),
        }
    }

    /// Overrides the interval, keeping the minimum floor.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_secs(MIN_POLL_INTERVAL_SECS));
        self
    }
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self::from_settings(&NotificationSettings::default())
    }
}

/// Summary of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tasks whose reminder fired during this tick, in storage order.
    pub fired: Vec<TaskId>,
    pub delivered: usize,
    pub failed: usize,
    /// Fired while notifications were disabled.
    pub suppressed: usize,
    /// Load or save failed; nothing was marked or delivered.
    pub skipped: bool,
}

/// Periodic scanner for due reminders.
pub struct ReminderScheduler {
    store: Arc<TaskStore>,
    notifier: Arc<dyn Notifier>,
    config: ReminderConfig,
}

impl ReminderScheduler {
    pub fn new(store: Arc<TaskStore>, notifier: Arc<dyn Notifier>, config: ReminderConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    pub fn config(&self) -> &ReminderConfig {
        &self.config
    }

    /// Runs one scan against the wall clock.
    pub fn tick(&self) -> TickReport {
        self.tick_at(now_epoch_secs())
    }

    /// Runs one scan as if the current time were `now` (epoch seconds).
    pub fn tick_at(&self, now: f64) -> TickReport {
        let mut report = TickReport::default();
        let mut due = Vec::new();

        {
            let guard = self.store.lock();
            let mut tasks = match guard.try_load() {
                Ok(tasks) => tasks,
                Err(err) => {
                    error!(
                        "event=reminder_tick module=scheduler status=skipped stage=load error={}",
                        err
                    );
                    report.skipped = true;
                    return report;
                }
            };

            for task in tasks.iter_mut() {
                if task.completed && !self.config.notify_completed {
                    continue;
                }
                if !task.reminder_due(now) {
                    continue;
                }
                task.reminder_notified = true;
                due.push(ReminderMessage::for_task(task));
                report.fired.push(task.id);
            }

            if due.is_empty() {
                debug!("event=reminder_tick module=scheduler status=ok fired=0");
                return report;
            }

            if let Err(err) = guard.commit(&tasks) {
                error!(
                    "event=reminder_tick module=scheduler status=skipped stage=save error={}",
                    err
                );
                return TickReport {
                    skipped: true,
                    ..TickReport::default()
                };
            }
        }

        for (id, message) in report.fired.iter().zip(&due) {
            if !self.config.enabled {
                debug!("event=reminder_fire module=scheduler status=suppressed task_id={id}");
                report.suppressed += 1;
                continue;
            }
            if deliver_guarded(self.notifier.as_ref(), message).is_delivered() {
                info!("event=reminder_fire module=scheduler status=delivered task_id={id}");
                report.delivered += 1;
            } else {
                warn!("event=reminder_fire module=scheduler status=failed task_id={id}");
                report.failed += 1;
            }
        }

        info!(
            "event=reminder_tick module=scheduler status=ok fired={} delivered={} failed={}",
            report.fired.len(),
            report.delivered,
            report.failed
        );
        report
    }

    /// Moves the scheduler onto a background thread.
    ///
    /// The thread scans immediately, then once per `poll_interval` until the
    /// returned handle is stopped or dropped.
    pub fn start(self) -> std::io::Result<SchedulerHandle> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let interval = self.config.poll_interval;

        let join = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || {
                info!(
                    "event=scheduler_start module=scheduler status=ok interval_secs={}",
                    interval.as_secs()
                );
                loop {
                    self.tick();
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                info!("event=scheduler_stop module=scheduler status=ok");
            })?;

        Ok(SchedulerHandle {
            stop_tx: Some(stop_tx),
            join: Some(join),
        })
    }
}

/// Owner of a running scheduler thread. Dropping it stops and joins.
pub struct SchedulerHandle {
    stop_tx: Option<Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Signals the thread and waits for the current tick (if any) to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    pub fn is_running(&self) -> bool {
        self.join
            .as_ref()
            .is_some_and(|join| !join.is_finished())
    }

    fn shutdown(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                error!("event=scheduler_stop module=scheduler status=error reason=thread_panicked");
            }
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Current wall-clock time as fractional epoch seconds.
pub fn now_epoch_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or(0.0)
}
