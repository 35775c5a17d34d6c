use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use taskdeck_core::store::{StorePaths, TaskStore};
use taskdeck_core::{
    FileTaskRepository, FnNotifier, Notifier, Priority, ReminderConfig, ReminderScheduler,
    ReminderState, TaskDraft, TaskRepository,
};
use tempfile::TempDir;

const NOW: f64 = 1_700_000_000.0;

#[derive(Default)]
struct RecordingNotifier {
    seen: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    fn seen(&self) -> Vec<(String, String)> {
        self.seen.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, body: &str) -> bool {
        self.seen
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
        true
    }
}

struct Fixture {
    _dir: TempDir,
    store: Arc<TaskStore>,
    repo: FileTaskRepository,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(TaskStore::new(StorePaths::new(dir.path())));
    let repo = FileTaskRepository::new(Arc::clone(&store));
    Fixture {
        _dir: dir,
        store,
        repo,
    }
}

fn scheduler(
    fixture: &Fixture,
    notifier: Arc<dyn Notifier>,
    config: ReminderConfig,
) -> ReminderScheduler {
    ReminderScheduler::new(Arc::clone(&fixture.store), notifier, config)
}

#[test]
fn due_reminder_fires_exactly_once() {
    let fx = fixture();
    fx.repo
        .add_task(&TaskDraft::new("Pay rent").with_priority(Priority::High))
        .unwrap();
    fx.repo.set_reminder(1, NOW - 1.0).unwrap();

    let notifier = Arc::new(RecordingNotifier::default());
    let scheduler = scheduler(&fx, notifier.clone(), ReminderConfig::default());

    let first = scheduler.tick_at(NOW);
    assert_eq!(first.fired, vec![1]);
    assert_eq!(first.delivered, 1);
    assert_eq!(
        notifier.seen(),
        vec![(
            "Task Reminder [High]".to_string(),
            "Task #1: Pay rent".to_string()
        )]
    );
    assert_eq!(
        fx.repo.get_task(1).unwrap().unwrap().reminder_state(),
        ReminderState::Fired
    );

    let second = scheduler.tick_at(NOW + 120.0);
    assert!(second.fired.is_empty());
    assert_eq!(notifier.seen().len(), 1);
}

#[test]
fn future_reminder_waits() {
    let fx = fixture();
    fx.repo.add_task(&TaskDraft::new("later")).unwrap();
    fx.repo.set_reminder(1, NOW + 30.0).unwrap();

    let notifier = Arc::new(RecordingNotifier::default());
    let scheduler = scheduler(&fx, notifier.clone(), ReminderConfig::default());

    assert!(scheduler.tick_at(NOW).fired.is_empty());
    assert_eq!(scheduler.tick_at(NOW + 30.0).fired, vec![1]);
    assert_eq!(notifier.seen().len(), 1);
}

#[test]
fn completed_tasks_are_skipped_unless_configured() {
    let fx = fixture();
    fx.repo.add_task(&TaskDraft::new("done already")).unwrap();
    fx.repo.set_reminder(1, NOW - 10.0).unwrap();
    fx.repo.complete_task(1).unwrap();

    let notifier = Arc::new(RecordingNotifier::default());
    let quiet = scheduler(&fx, notifier.clone(), ReminderConfig::default());
    assert!(quiet.tick_at(NOW).fired.is_empty());
    assert_eq!(
        fx.repo.get_task(1).unwrap().unwrap().reminder_state(),
        ReminderState::Armed
    );

    let config = ReminderConfig {
        notify_completed: true,
        ..ReminderConfig::default()
    };
    let eager = scheduler(&fx, notifier.clone(), config);
    assert_eq!(eager.tick_at(NOW).fired, vec![1]);
    assert_eq!(notifier.seen().len(), 1);
}

#[test]
fn failing_or_panicking_notifier_still_marks_fired() {
    let fx = fixture();
    fx.repo.add_task(&TaskDraft::new("refused")).unwrap();
    fx.repo.add_task(&TaskDraft::new("exploding")).unwrap();
    fx.repo.set_reminder(1, NOW).unwrap();
    fx.repo.set_reminder(2, NOW).unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let notifier = FnNotifier::new(move |_: &str, body: &str| {
        counter.fetch_add(1, Ordering::SeqCst);
        if body.contains("exploding") {
            panic!("backend unavailable");
        }
        false
    });
    let scheduler = scheduler(&fx, Arc::new(notifier), ReminderConfig::default());

    let report = scheduler.tick_at(NOW);
    assert_eq!(report.fired, vec![1, 2]);
    assert_eq!(report.delivered, 0);
    assert_eq!(report.failed, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let again = scheduler.tick_at(NOW + 1.0);
    assert!(again.fired.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn disabled_notifications_mark_without_delivering() {
    let fx = fixture();
    fx.repo.add_task(&TaskDraft::new("silent")).unwrap();
    fx.repo.set_reminder(1, NOW).unwrap();

    let notifier = Arc::new(RecordingNotifier::default());
    let config = ReminderConfig {
        enabled: false,
        ..ReminderConfig::default()
    };
    let report = scheduler(&fx, notifier.clone(), config).tick_at(NOW);

    assert_eq!(report.fired, vec![1]);
    assert_eq!(report.suppressed, 1);
    assert!(notifier.seen().is_empty());
    assert!(fx.repo.get_task(1).unwrap().unwrap().reminder_notified);
}

#[test]
fn unreadable_store_skips_the_tick() {
    let fx = fixture();
    fs::write(fx.store.paths().tasks_file(), b"not json").unwrap();

    let notifier = Arc::new(RecordingNotifier::default());
    let report = scheduler(&fx, notifier.clone(), ReminderConfig::default()).tick_at(NOW);

    assert!(report.skipped);
    assert!(report.fired.is_empty());
    assert_eq!(
        fs::read(fx.store.paths().tasks_file()).unwrap(),
        b"not json".to_vec()
    );
}

#[test]
fn background_thread_fires_and_stops_promptly() {
    let fx = fixture();
    fx.repo.add_task(&TaskDraft::new("background")).unwrap();
    fx.repo.set_reminder(1, 1.0).unwrap();

    let notifier = Arc::new(RecordingNotifier::default());
    let handle = scheduler(&fx, notifier.clone(), ReminderConfig::default())
        .start()
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while notifier.seen().is_empty() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(notifier.seen().len(), 1);
    assert!(handle.is_running());

    let stop_started = Instant::now();
    handle.stop();
    assert!(stop_started.elapsed() < Duration::from_secs(5));
}
