//! File-backed persistence for tasks and settings.
//!
//! # Responsibility
//! - Load and save the full task collection as one JSON document.
//! - Keep a `.bak` sibling and recover from it when the primary is unreadable.
//! - Serialize load-modify-save cycles across threads and processes.
//!
//! # Invariants
//! - Every save rewrites the whole collection; there is no partial write path.
//! - `TaskStore::load` never surfaces read failures to callers.
//! - Parent directories are created before any write.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod fs_util;
mod paths;
mod settings_store;
mod task_store;

pub use paths::{default_data_dir, StorePaths, DATA_DIR_ENV};
pub use settings_store::SettingsStore;
pub use task_store::{StoreGuard, TaskStore, TASK_FILE_VERSION};

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage-layer failures.
///
/// `Read`, `Corrupt` and `UnsupportedVersion` are read-side failures and are
/// absorbed by recovery in `TaskStore::load`. `Write` and `Serialize` surface
/// from `TaskStore::save`. `Backup` is only ever logged.
#[derive(Debug)]
pub enum StoreError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Corrupt {
        path: PathBuf,
        reason: String,
    },
    UnsupportedVersion {
        path: PathBuf,
        file_version: u32,
        latest_supported: u32,
    },
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    Backup {
        path: PathBuf,
        source: std::io::Error,
    },
    Serialize(serde_json::Error),
}

impl StoreError {
    /// Returns whether this failure happened while reading persisted state.
    pub fn is_read_error(&self) -> bool {
        matches!(
            self,
            Self::Read { .. } | Self::Corrupt { .. } | Self::UnsupportedVersion { .. }
        )
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read `{}`: {source}", path.display())
            }
            Self::Corrupt { path, reason } => {
                write!(f, "corrupt store file `{}`: {reason}", path.display())
            }
            Self::UnsupportedVersion {
                path,
                file_version,
                latest_supported,
            } => write!(
                f,
                "store file `{}` has version {file_version}, newer than supported {latest_supported}",
                path.display()
            ),
            Self::Write { path, source } => {
                write!(f, "failed to write `{}`: {source}", path.display())
            }
            Self::Backup { path, source } => {
                write!(f, "failed to back up to `{}`: {source}", path.display())
            }
            Self::Serialize(err) => write!(f, "failed to encode store data: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Write { source, .. } => Some(source),
            Self::Backup { source, .. } => Some(source),
            Self::Serialize(err) => Some(err),
            Self::Corrupt { .. } | Self::UnsupportedVersion { .. } => None,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}
