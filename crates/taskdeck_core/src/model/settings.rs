//! User settings model.
//!
//! # Responsibility
//! - Describe the persisted settings groups and their built-in defaults.
//!
//! # Invariants
//! - Every group deserializes with `#[serde(default)]`, so a partial or
//!   older settings file merges over defaults instead of failing.
//! - Unknown keys are ignored.

use crate::model::task::Priority;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lower bound for the reminder scan interval.
pub const MIN_POLL_INTERVAL_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub colors: ColorSettings,
    pub autosave: AutosaveSettings,
    pub notifications: NotificationSettings,
    pub ui: UiSettings,
    pub cli: CliSettings,
}

impl Settings {
    /// Returns the configured display color for a priority level.
    pub fn color_for(&self, priority: Priority) -> &str {
        match priority {
            Priority::High => &self.colors.high_priority,
            Priority::Medium => &self.colors.medium_priority,
            Priority::Low => &self.colors.low_priority,
        }
    }

    /// Flips `cli.interactive_mode` and returns the new value.
    pub fn toggle_interactive_mode(&mut self) -> bool {
        self.cli.interactive_mode = !self.cli.interactive_mode;
        self.cli.interactive_mode
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorSettings {
    pub high_priority: String,
    pub medium_priority: String,
    pub low_priority: String,
    pub completed: String,
    pub default: String,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            high_priority: "#FF4444".to_string(),
            medium_priority: "#4444FF".to_string(),
            low_priority: "#44AA44".to_string(),
            completed: "#888888".to_string(),
            default: "#000000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveSettings {
    pub enabled: bool,
    #[serde(alias = "interval")]
    pub interval_secs: u64,
    pub on_exit: bool,
}

impl Default for AutosaveSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 120,
            on_exit: true,
        }
    }
}

/// Notification toggles consumed by the reminder scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub sound: bool,
    #[serde(alias = "advance_warning")]
    pub advance_warning_minutes: u32,
    pub console_fallback: bool,
    /// Fire reminders for tasks that are already completed.
    pub notify_completed: bool,
    pub poll_interval_secs: u64,
}

impl NotificationSettings {
    /// Scan interval, never shorter than [`MIN_POLL_INTERVAL_SECS`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(MIN_POLL_INTERVAL_SECS))
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sound: true,
            advance_warning_minutes: 15,
            console_fallback: true,
            notify_completed: false,
            poll_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    pub theme: Theme,
    pub font_family: String,
    pub font_size: u16,
    pub compact_view: bool,
    pub show_status_bar: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            theme: Theme::System,
            font_family: "Helvetica".to_string(),
            font_size: 10,
            compact_view: false,
            show_status_bar: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliSettings {
    pub interactive_mode: bool,
    pub show_colors: bool,
    pub compact_view: bool,
}

impl Default for CliSettings {
    fn default() -> Self {
        Self {
            interactive_mode: true,
            show_colors: true,
            compact_view: false,
        }
    }
}
