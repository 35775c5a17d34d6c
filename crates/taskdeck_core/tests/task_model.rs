use chrono::NaiveDate;
use serde_json::{json, Value};
use taskdeck_core::{Priority, ReminderState, TaskRecord};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn record_serializes_with_stable_wire_fields() {
    let mut task = TaskRecord::created_on(2, "File taxes", day(2024, 4, 1));
    task.priority = Priority::High;
    task.due_date = Some(day(2024, 4, 15));
    task.category = Some("Finance".to_string());
    task.reminder_time = Some(1_713_000_000.25);

    let value = serde_json::to_value(&task).unwrap();
    assert_eq!(value["id"], json!(2));
    assert_eq!(value["description"], json!("File taxes"));
    assert_eq!(value["completed"], json!(false));
    assert_eq!(value["priority"], json!("High"));
    assert_eq!(value["due_date"], json!("2024-04-15"));
    assert_eq!(value["category"], json!("Finance"));
    assert_eq!(value["progress"], json!(0));
    assert_eq!(value["notes"], Value::Null);
    assert_eq!(value["tags"], json!([]));
    assert_eq!(value["created_at"], json!("2024-04-01"));
    assert_eq!(value["reminder_time"], json!(1_713_000_000.25));
    assert_eq!(value["reminder_notified"], json!(false));
}

#[test]
fn minimal_record_fills_defaults() {
    let task: TaskRecord = serde_json::from_value(json!({
        "id": 9,
        "description": "old entry",
        "created_at": "2022-01-05"
    }))
    .unwrap();

    assert_eq!(task.priority, Priority::Medium);
    assert!(!task.completed);
    assert_eq!(task.progress, 0);
    assert_eq!(task.due_date, None);
    assert_eq!(task.reminder_state(), ReminderState::Unarmed);
    assert!(task.validate().is_ok());
}

#[test]
fn mark_complete_forces_full_progress() {
    let mut task = TaskRecord::created_on(1, "ship", day(2024, 1, 1));
    task.set_progress_clamped(40);
    task.mark_complete();
    assert!(task.completed);
    assert_eq!(task.progress, 100);

    task.set_progress_clamped(-5);
    assert_eq!(task.progress, 0);
    task.set_progress_clamped(500);
    assert_eq!(task.progress, 100);
}
