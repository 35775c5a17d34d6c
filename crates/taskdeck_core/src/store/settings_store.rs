//! Settings file persistence.

use super::fs_util::write_atomic;
use super::{StoreError, StoreResult};
use crate::model::settings::Settings;
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// JSON settings file merged over built-in defaults on load.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    gate: Mutex<()>,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            gate: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns persisted settings merged with defaults.
    ///
    /// A missing file is created with defaults. Unreadable or malformed files
    /// are logged and yield defaults; this never fails. Groups are merged one
    /// at a time, so a malformed group falls back to its own defaults only.
    pub fn load(&self) -> Settings {
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        self.load_unlocked()
    }

    /// Writes `settings`, replacing the file atomically.
    pub fn save(&self, settings: &Settings) -> StoreResult<()> {
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        self.save_unlocked(settings)
    }

    /// Applies `change` to the current settings and persists the result.
    pub fn update<F>(&self, change: F) -> StoreResult<Settings>
    where
        F: FnOnce(&mut Settings),
    {
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        let mut settings = self.load_unlocked();
        change(&mut settings);
        self.save_unlocked(&settings)?;
        Ok(settings)
    }

    fn load_unlocked(&self) -> Settings {
        if !self.path.exists() {
            let defaults = Settings::default();
            if let Err(err) = self.save_unlocked(&defaults) {
                warn!(
                    "event=settings_init module=store status=error error={}",
                    err
                );
            }
            return defaults;
        }

        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(err) => {
                warn!(
                    "event=settings_load module=store status=fallback_default path={} error={}",
                    self.path.display(),
                    err
                );
                return Settings::default();
            }
        };

        match serde_json::from_slice::<Value>(&contents) {
            Ok(Value::Object(groups)) => merge_groups(&self.path, groups),
            Ok(_) => {
                warn!(
                    "event=settings_load module=store status=fallback_default path={} error=not_an_object",
                    self.path.display()
                );
                Settings::default()
            }
            Err(err) => {
                warn!(
                    "event=settings_load module=store status=fallback_default path={} error={}",
                    self.path.display(),
                    err
                );
                Settings::default()
            }
        }
    }

    fn save_unlocked(&self, settings: &Settings) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(settings)?;
        write_atomic(&self.path, &bytes).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        info!("event=settings_save module=store status=ok");
        Ok(())
    }
}

/// Builds settings group by group; a group that fails to decode keeps its
/// defaults and unknown top-level keys are ignored.
fn merge_groups(path: &Path, groups: Map<String, Value>) -> Settings {
    let mut settings = Settings::default();
    for (name, group) in groups {
        let merged = match name.as_str() {
            "colors" => decode_group(group).map(|value| settings.colors = value),
            "autosave" => decode_group(group).map(|value| settings.autosave = value),
            "notifications" => decode_group(group).map(|value| settings.notifications = value),
            "ui" => decode_group(group).map(|value| settings.ui = value),
            "cli" => decode_group(group).map(|value| settings.cli = value),
            _ => continue,
        };
        if let Err(err) = merged {
            warn!(
                "event=settings_load module=store status=group_default path={} group={} error={}",
                path.display(),
                name,
                err
            );
        }
    }
    settings
}

fn decode_group<T: DeserializeOwned>(group: Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(group)
}
