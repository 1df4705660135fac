//! Whole-file JSON persistence.
//!
//! Layout of `tasks.json`:
//!
//! ```text
//! { "last_id": 7, "tasks": [ { "id": 1, ... }, ... ] }
//! ```
//!
//! A bare array of tasks (older layout) is also accepted on read.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use taskbot_core::{error::TaskbotError, task::Task, traits::TaskStorage};
use tracing::{debug, warn};

#[derive(Debug, Default, Serialize, Deserialize)]
struct TaskFile {
    #[serde(default)]
    last_id: u64,
    #[serde(default)]
    tasks: Vec<Task>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OnDisk {
    Envelope(TaskFile),
    Bare(Vec<Task>),
}

impl From<OnDisk> for TaskFile {
    fn from(disk: OnDisk) -> Self {
        let mut file = match disk {
            OnDisk::Envelope(file) => file,
            OnDisk::Bare(tasks) => TaskFile { last_id: 0, tasks },
        };
        let max_id = file.tasks.iter().map(|t| t.id).max().unwrap_or(0);
        file.last_id = file.last_id.max(max_id);
        file
    }
}

/// Task storage backed by one JSON file, re-read on every access and
/// rewritten in full on every mutation.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> TaskFile {
        read_json_or_default::<OnDisk>(&self.path)
            .map(TaskFile::from)
            .unwrap_or_default()
    }

    fn save(&self, file: &TaskFile) -> Result<(), TaskbotError> {
        write_json_atomic(&self.path, file)
    }
}

impl TaskStorage for JsonFileStorage {
    fn name(&self) -> &str {
        "json-file"
    }

    fn list(&self) -> Vec<Task> {
        self.load().tasks
    }

    fn append(&mut self, task: Task) -> Result<(), TaskbotError> {
        let mut file = self.load();
        file.last_id = file.last_id.max(task.id);
        file.tasks.push(task);
        self.save(&file)
    }

    fn replace_all(&mut self, tasks: Vec<Task>) -> Result<(), TaskbotError> {
        let mut file = self.load();
        let max_id = tasks.iter().map(|t| t.id).max().unwrap_or(0);
        file.last_id = file.last_id.max(max_id);
        file.tasks = tasks;
        self.save(&file)
    }

    fn last_id(&self) -> u64 {
        self.load().last_id
    }
}

/// Read a JSON file. Missing or malformed content yields `None`.
pub(crate) fn read_json_or_default<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("{} not found, starting empty", path.display());
            return None;
        }
        Err(e) => {
            warn!("failed to read {}: {e}; starting empty", path.display());
            return None;
        }
    };
    if content.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("malformed {}: {e}; starting empty", path.display());
            None
        }
    }
}

/// Write JSON to a sibling temp file, then rename over the target.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, data: &T) -> Result<(), TaskbotError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                TaskbotError::Store(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
    }

    let json = serde_json::to_string_pretty(data)?;
    let temp_path = path.with_extension("json.tmp");
    let mut file = fs::File::create(&temp_path)
        .map_err(|e| TaskbotError::Store(format!("failed to create {}: {e}", temp_path.display())))?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    fs::rename(&temp_path, path)
        .map_err(|e| TaskbotError::Store(format!("failed to replace {}: {e}", path.display())))?;
    Ok(())
}
