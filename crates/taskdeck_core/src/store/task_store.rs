//! Task collection file with backup-and-recover semantics.
//!
//! # Responsibility
//! - Encode/decode the versioned JSON task document.
//! - Recover from the `.bak` sibling when the primary cannot be read.
//! - Hand out `StoreGuard`s that serialize access to the files.
//!
//! # Invariants
//! - All reads and writes of the task file happen while a guard is held.
//! - Decoded records pass `TaskRecord::validate()` and carry unique ids.
//! - A bad record is repaired or skipped with a warning; only a document with
//!   no readable record at all is reported as corrupt.

use super::fs_util::{ensure_parent_dir, write_atomic};
use super::{StoreError, StorePaths, StoreResult};
use crate::model::task::TaskRecord;
use fs2::FileExt;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Latest task document version written by this build.
pub const TASK_FILE_VERSION: u32 = 1;

#[derive(Serialize)]
struct TaskDocumentRef<'a> {
    version: u32,
    tasks: &'a [TaskRecord],
}

#[derive(Deserialize)]
struct TaskDocument {
    #[serde(default = "first_version")]
    version: u32,
    tasks: Vec<Value>,
}

fn first_version() -> u32 {
    1
}

/// Durable store for the whole task collection.
///
/// Share one instance (usually behind `Arc`) between the repository and the
/// reminder scheduler so their cycles serialize on the same gate.
#[derive(Debug)]
pub struct TaskStore {
    paths: StorePaths,
    gate: Mutex<()>,
}

impl TaskStore {
    pub fn new(paths: StorePaths) -> Self {
        Self {
            paths,
            gate: Mutex::new(()),
        }
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Enters the critical section for one load-modify-save cycle.
    ///
    /// Blocks until the in-process gate and the exclusive lock on
    /// `tasks.lock` are both held. When the lock file cannot be opened or
    /// locked, the guard degrades to in-process exclusion and logs a warning.
    pub fn lock(&self) -> StoreGuard<'_> {
        let gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        let file_lock = acquire_file_lock(&self.paths.lock_file());
        StoreGuard {
            paths: &self.paths,
            _file_lock: file_lock,
            _gate: gate,
        }
    }

    /// Loads the collection; see [`StoreGuard::load`].
    pub fn load(&self) -> Vec<TaskRecord> {
        self.lock().load()
    }

    /// Loads the collection; see [`StoreGuard::try_load`].
    pub fn try_load(&self) -> StoreResult<Vec<TaskRecord>> {
        self.lock().try_load()
    }

    /// Overwrites the primary file; see [`StoreGuard::save`].
    pub fn save(&self, tasks: &[TaskRecord]) -> StoreResult<()> {
        self.lock().save(tasks)
    }

    /// Backs up, then saves; see [`StoreGuard::save_with_recovery`].
    pub fn save_with_recovery(&self, tasks: &[TaskRecord]) -> bool {
        self.lock().save_with_recovery(tasks)
    }
}

/// Exclusive access token for the task files.
///
/// Dropping the guard releases the file lock first, then the in-process gate.
pub struct StoreGuard<'a> {
    paths: &'a StorePaths,
    _file_lock: Option<File>,
    _gate: MutexGuard<'a, ()>,
}

impl StoreGuard<'_> {
    /// Returns the collection, or an empty one when nothing can be read.
    ///
    /// Never fails: primary errors fall back to `.bak`, and a failed backup
    /// read is logged before returning an empty collection.
    pub fn load(&self) -> Vec<TaskRecord> {
        match self.try_load() {
            Ok(tasks) => tasks,
            Err(err) => {
                error!(
                    "event=store_load module=store status=fallback_empty error={}",
                    err
                );
                Vec::new()
            }
        }
    }

    /// Returns the collection, reporting an error only when neither the
    /// primary nor the backup file is readable.
    ///
    /// A missing primary file is an empty collection, not an error.
    pub fn try_load(&self) -> StoreResult<Vec<TaskRecord>> {
        let started_at = Instant::now();
        let primary = self.paths.tasks_file();
        if !primary.exists() {
            debug!("event=store_load module=store status=ok source=none count=0");
            return Ok(Vec::new());
        }

        let primary_err = match read_task_file(&primary) {
            Ok(tasks) => {
                info!(
                    "event=store_load module=store status=ok source=primary count={} duration_ms={}",
                    tasks.len(),
                    started_at.elapsed().as_millis()
                );
                return Ok(tasks);
            }
            Err(err) => err,
        };
        warn!(
            "event=store_load module=store status=error source=primary error={}",
            primary_err
        );

        let backup = self.paths.backup_file();
        if !backup.exists() {
            return Err(primary_err);
        }

        match read_task_file(&backup) {
            Ok(tasks) => {
                warn!(
                    "event=store_load module=store status=recovered source=backup count={} duration_ms={}",
                    tasks.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(tasks)
            }
            Err(backup_err) => {
                error!(
                    "event=store_load module=store status=error source=backup error={}",
                    backup_err
                );
                Err(primary_err)
            }
        }
    }

    /// Serializes `tasks` and atomically replaces the primary file.
    pub fn save(&self, tasks: &[TaskRecord]) -> StoreResult<()> {
        let started_at = Instant::now();
        let primary = self.paths.tasks_file();
        let bytes = encode_tasks(tasks)?;

        if let Err(source) = write_atomic(&primary, &bytes) {
            error!(
                "event=store_save module=store status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                source
            );
            return Err(StoreError::Write {
                path: primary,
                source,
            });
        }

        info!(
            "event=store_save module=store status=ok count={} duration_ms={}",
            tasks.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    /// Copies the primary to `.bak`, saves, and restores from `.bak` when
    /// the save fails.
    ///
    /// Backup failures are logged and do not stop the save. Returns the
    /// save error after the restore attempt.
    pub fn commit(&self, tasks: &[TaskRecord]) -> StoreResult<()> {
        let primary = self.paths.tasks_file();
        let backup = self.paths.backup_file();

        if primary.exists() {
            if let Err(err) = copy_file(&primary, &backup) {
                warn!(
                    "event=store_backup module=store status=error error={}",
                    err
                );
            }
        }

        let err = match self.save(tasks) {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };

        if backup.exists() {
            match copy_file(&backup, &primary) {
                Ok(()) => warn!("event=store_restore module=store status=ok source=backup"),
                Err(restore_err) => error!(
                    "event=store_restore module=store status=error error={}",
                    restore_err
                ),
            }
        }
        Err(err)
    }

    /// Same as [`StoreGuard::commit`] but folds the outcome into a bool.
    pub fn save_with_recovery(&self, tasks: &[TaskRecord]) -> bool {
        self.commit(tasks).is_ok()
    }
}

fn copy_file(from: &Path, to: &Path) -> StoreResult<()> {
    fs::copy(from, to)
        .map(|_| ())
        .map_err(|source| StoreError::Backup {
            path: to.to_path_buf(),
            source,
        })
}

fn acquire_file_lock(path: &Path) -> Option<File> {
    let opened = ensure_parent_dir(path).and_then(|()| {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
    });

    let file = match opened {
        Ok(file) => file,
        Err(err) => {
            warn!(
                "event=store_lock module=store status=degraded path={} error={}",
                path.display(),
                err
            );
            return None;
        }
    };

    match file.lock_exclusive() {
        Ok(()) => Some(file),
        Err(err) => {
            warn!(
                "event=store_lock module=store status=degraded path={} error={}",
                path.display(),
                err
            );
            None
        }
    }
}

fn encode_tasks(tasks: &[TaskRecord]) -> StoreResult<Vec<u8>> {
    let document = TaskDocumentRef {
        version: TASK_FILE_VERSION,
        tasks,
    };
    Ok(serde_json::to_vec_pretty(&document)?)
}

fn read_task_file(path: &Path) -> StoreResult<Vec<TaskRecord>> {
    let bytes = fs::read(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    decode_tasks(path, &bytes)
}

fn decode_tasks(path: &Path, bytes: &[u8]) -> StoreResult<Vec<TaskRecord>> {
    let corrupt = |reason: String| StoreError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(corrupt("file is empty".to_string()));
    }

    let document: TaskDocument =
        serde_json::from_slice(bytes).map_err(|err| corrupt(err.to_string()))?;
    if document.version > TASK_FILE_VERSION {
        return Err(StoreError::UnsupportedVersion {
            path: path.to_path_buf(),
            file_version: document.version,
            latest_supported: TASK_FILE_VERSION,
        });
    }

    let total = document.tasks.len();
    let mut tasks = Vec::with_capacity(total);
    let mut seen = HashSet::with_capacity(total);
    for (index, raw) in document.tasks.into_iter().enumerate() {
        let task = match decode_record(path, index, raw) {
            Ok(task) => task,
            Err(reason) => {
                warn!(
                    "event=store_decode module=store status=skipped path={} index={} reason={}",
                    path.display(),
                    index,
                    reason
                );
                continue;
            }
        };
        if !seen.insert(task.id) {
            warn!(
                "event=store_decode module=store status=skipped path={} index={} reason=duplicate_id id={}",
                path.display(),
                index,
                task.id
            );
            continue;
        }
        tasks.push(task);
    }

    if tasks.is_empty() && total > 0 {
        return Err(corrupt(format!("none of {total} task records is readable")));
    }
    Ok(tasks)
}

/// Decodes one record, repairing fields that older or hand-edited files get
/// wrong: progress outside `0..=100` is clamped, a non-numeric
/// `reminder_time` is dropped.
fn decode_record(path: &Path, index: usize, mut raw: Value) -> Result<TaskRecord, String> {
    let progress = {
        let fields = raw
            .as_object_mut()
            .ok_or_else(|| "record is not an object".to_string())?;

        if fields
            .get("reminder_time")
            .is_some_and(|at| !at.is_null() && !at.is_number())
        {
            warn!(
                "event=store_decode module=store status=repaired path={} index={} field=reminder_time",
                path.display(),
                index
            );
            fields.remove("reminder_time");
        }

        match fields.remove("progress") {
            None | Some(Value::Null) => 0,
            Some(value) => value
                .as_i64()
                .or_else(|| value.as_f64().map(|wide| wide.round() as i64))
                .ok_or_else(|| format!("progress is not a number: {value}"))?,
        }
    };

    let mut task: TaskRecord = serde_json::from_value(raw).map_err(|err| err.to_string())?;
    task.set_progress_clamped(progress);
    task.normalize();
    task.validate()
        .map_err(|err| format!("task {}: {err}", task.id))?;
    Ok(task)
}
