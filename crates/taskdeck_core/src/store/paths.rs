//! On-disk layout of the data directory.

use std::path::{Path, PathBuf};

/// Environment override for the data directory.
pub const DATA_DIR_ENV: &str = "TASKDECK_DATA_DIR";

const APP_DIR_NAME: &str = "TaskDeck";
const TASKS_FILE_NAME: &str = "tasks.json";
const BACKUP_SUFFIX: &str = ".bak";
const SETTINGS_FILE_NAME: &str = "settings.json";
const LOCK_FILE_NAME: &str = "tasks.lock";
const LOG_DIR_NAME: &str = "logs";

/// Resolves the per-user data directory.
///
/// `TASKDECK_DATA_DIR` wins when set to a non-empty value; otherwise the
/// platform data directory (e.g. `~/.local/share` on Linux) is used.
pub fn default_data_dir() -> Option<PathBuf> {
    if let Some(value) = std::env::var_os(DATA_DIR_ENV) {
        if !value.is_empty() {
            return Some(PathBuf::from(value));
        }
    }
    dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME))
}

/// File locations derived from one data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    data_dir: PathBuf,
}

impl StorePaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Paths rooted at [`default_data_dir`], if one can be resolved.
    pub fn from_default() -> Option<Self> {
        default_data_dir().map(Self::new)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn tasks_file(&self) -> PathBuf {
        self.data_dir.join(TASKS_FILE_NAME)
    }

    /// Sibling of the task file with `.bak` appended.
    pub fn backup_file(&self) -> PathBuf {
        self.data_dir
            .join(format!("{TASKS_FILE_NAME}{BACKUP_SUFFIX}"))
    }

    pub fn settings_file(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE_NAME)
    }

    pub fn lock_file(&self) -> PathBuf {
        self.data_dir.join(LOCK_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_DIR_NAME)
    }
}
