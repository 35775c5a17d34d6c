//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `taskdeck_core` wiring against the real data directory.
//! - Print a short status report and run one reminder scan.

use std::process::ExitCode;
use std::sync::Arc;

use log::{error, info};
use taskdeck_core::{
    core_version, init_logging, ConsoleNotifier, FileTaskRepository, LogLevel, ReminderConfig,
    ReminderScheduler, SettingsStore, StorePaths, TaskService, TaskStore,
};

const LOG_LEVEL_ENV: &str = "TASKDECK_LOG_LEVEL";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("taskdeck: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let paths = StorePaths::from_default()
        .ok_or_else(|| "unable to resolve a data directory; set TASKDECK_DATA_DIR".to_string())?;

    let level = match std::env::var(LOG_LEVEL_ENV) {
        Ok(value) => LogLevel::parse(&value)?,
        Err(_) => LogLevel::build_default(),
    };
    // Logging is best-effort; the probe still runs without a log file.
    if let Err(err) = init_logging(level, &paths.log_dir()) {
        eprintln!("taskdeck: logging disabled: {err}");
    }

    println!("taskdeck_core version={}", core_version());
    println!("data_dir={}", paths.data_dir().display());

    let settings = SettingsStore::new(paths.settings_file()).load();
    let store = Arc::new(TaskStore::new(paths));
    let service = TaskService::new(FileTaskRepository::new(Arc::clone(&store)));

    let today = chrono::Local::now().date_naive();
    let summary = service.summary(today).map_err(|err| {
        error!("event=cli_summary module=cli status=error error={err}");
        err.to_string()
    })?;
    println!(
        "tasks total={} active={} completed={} overdue={}",
        summary.total, summary.active, summary.completed, summary.overdue
    );

    let scheduler = ReminderScheduler::new(
        store,
        Arc::new(ConsoleNotifier),
        ReminderConfig::from_settings(&settings.notifications),
    );
    let report = scheduler.tick();
    println!(
        "reminders fired={} delivered={} failed={} skipped={}",
        report.fired.len(),
        report.delivered,
        report.failed,
        report.skipped
    );
    info!("event=cli_probe module=cli status=ok");
    Ok(())
}
