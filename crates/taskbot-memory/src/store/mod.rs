//! Task store over an injectable [`TaskStorage`] backend.
//!
//! Split into focused submodules:
//! - `json`: whole-file JSON persistence (`tasks.json`) and the atomic write helper
//! - `memory`: ephemeral in-process backend

mod json;
mod memory;

pub use json::JsonFileStorage;
pub use memory::MemoryStorage;
pub(crate) use json::{read_json_or_default, write_json_atomic};

use chrono::{DateTime, Utc};
use std::path::Path;
use taskbot_core::{
    error::TaskbotError,
    normalize::fuzzy_match,
    task::{Task, TaskDraft},
    traits::TaskStorage,
};
use tracing::info;

/// File name of the task list inside the data directory.
pub const TASKS_FILE: &str = "tasks.json";

/// Counts shown by `/report` and `status`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub open: usize,
    pub done: usize,
}

/// Task list with sequence-id assignment and completion bookkeeping.
///
/// Every mutation is a read-modify-write of the whole collection. Two
/// processes sharing one backing file will lose each other's updates.
pub struct Store {
    storage: Box<dyn TaskStorage>,
}

impl Store {
    pub fn new(storage: Box<dyn TaskStorage>) -> Self {
        Self { storage }
    }

    /// JSON-file store at `{data_dir}/tasks.json`.
    pub fn open(data_dir: &Path) -> Self {
        let path = data_dir.join(TASKS_FILE);
        info!("Task store at {}", path.display());
        Self::new(Box::new(JsonFileStorage::new(path)))
    }

    /// Store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::default()))
    }

    /// Backend name.
    pub fn backend(&self) -> &str {
        self.storage.name()
    }

    /// All tasks in creation order.
    pub fn tasks(&self) -> Vec<Task> {
        self.storage.list()
    }

    /// Incomplete tasks in creation order.
    pub fn open_tasks(&self) -> Vec<Task> {
        self.storage
            .list()
            .into_iter()
            .filter(Task::is_open)
            .collect()
    }

    pub fn get(&self, id: u64) -> Option<Task> {
        self.storage.list().into_iter().find(|t| t.id == id)
    }

    /// Newest open task whose normalized text fuzzy-matches `normalized`.
    pub fn find_open_match(&self, normalized: &str) -> Option<Task> {
        self.storage
            .list()
            .into_iter()
            .rev()
            .find(|t| t.is_open() && fuzzy_match(normalized, &t.normalized))
    }

    /// Create an open task with the next sequence id.
    pub fn create_task(
        &mut self,
        draft: TaskDraft,
        now: DateTime<Utc>,
    ) -> Result<Task, TaskbotError> {
        let id = self.storage.last_id() + 1;
        let task = Task::from_draft(id, draft, now);
        self.storage.append(task.clone())?;
        Ok(task)
    }

    /// Create a task that is already complete, in a single write.
    pub fn create_closed(
        &mut self,
        draft: TaskDraft,
        closed_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Task, TaskbotError> {
        let id = self.storage.last_id() + 1;
        let mut task = Task::from_draft(id, draft, now);
        task.close(closed_by, now);
        self.storage.append(task.clone())?;
        Ok(task)
    }

    /// Close an open task. Returns `None` when the id is unknown or the
    /// task is already complete (nothing is written then).
    pub fn complete(
        &mut self,
        id: u64,
        closed_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>, TaskbotError> {
        self.complete_linked(id, closed_by, now, None)
    }

    /// Like [`Store::complete`], also linking the quoted message id `link`
    /// to the task in the same write.
    pub fn complete_linked(
        &mut self,
        id: u64,
        closed_by: &str,
        now: DateTime<Utc>,
        link: Option<&str>,
    ) -> Result<Option<Task>, TaskbotError> {
        self.update(id, |task| {
            if task.is_open() {
                task.close(closed_by, now);
                if let Some(msg_id) = link {
                    task.link(msg_id);
                }
                true
            } else {
                false
            }
        })
    }

    /// Re-stamp the completion time of a closed task.
    pub fn refresh_completion(
        &mut self,
        id: u64,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>, TaskbotError> {
        self.update(id, |task| {
            if task.done {
                task.refresh_completion(now);
                true
            } else {
                false
            }
        })
    }

    /// Drop every task. The id sequence keeps counting. Returns how many were removed.
    pub fn clear(&mut self) -> Result<usize, TaskbotError> {
        let removed = self.storage.list().len();
        self.storage.replace_all(Vec::new())?;
        info!("task store cleared ({removed} tasks)");
        Ok(removed)
    }

    pub fn stats(&self) -> TaskStats {
        let tasks = self.storage.list();
        let open = tasks.iter().filter(|t| t.is_open()).count();
        TaskStats {
            total: tasks.len(),
            open,
            done: tasks.len() - open,
        }
    }

    fn update(
        &mut self,
        id: u64,
        mutate: impl FnOnce(&mut Task) -> bool,
    ) -> Result<Option<Task>, TaskbotError> {
        let mut tasks = self.storage.list();
        let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        if !mutate(task) {
            return Ok(None);
        }
        let updated = task.clone();
        self.storage.replace_all(tasks)?;
        Ok(Some(updated))
    }
}
