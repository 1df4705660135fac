//! Task record model.

use crate::normalize::normalize;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tracked task.
///
/// `completed_at` is set exactly when `done` is true, and `normalized` is
/// always `normalize(&message)`. Only [`Task::close`] and
/// [`Task::refresh_completion`] mutate a stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub message: String,
    pub normalized: String,
    pub creator_id: String,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_by: Option<String>,
    #[serde(default)]
    pub src_msg_id: Option<String>,
    #[serde(default)]
    pub src_sender_id: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Quoted message ids whose completion replies closed this task
    /// without matching its source.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked_msg_ids: Vec<String>,
}

/// Everything needed to create a task except its sequence id.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub message: String,
    pub creator_id: String,
    pub assignee: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub src_msg_id: Option<String>,
    pub src_sender_id: Option<String>,
    pub conversation_id: Option<String>,
}

impl TaskDraft {
    /// Draft with the required fields; optional ones default to `None`.
    pub fn new(message: impl Into<String>, creator_id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            creator_id: creator_id.into(),
            ..Default::default()
        }
    }
}

impl Task {
    /// Materialize a draft into an open task.
    pub fn from_draft(id: u64, draft: TaskDraft, created_at: DateTime<Utc>) -> Self {
        let normalized = normalize(&draft.message);
        Self {
            id,
            message: draft.message,
            normalized,
            creator_id: draft.creator_id,
            assignee: draft.assignee,
            due_at: draft.due_at,
            created_at,
            done: false,
            completed_at: None,
            completed_by: None,
            src_msg_id: draft.src_msg_id,
            src_sender_id: draft.src_sender_id,
            conversation_id: draft.conversation_id,
            linked_msg_ids: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        !self.done
    }

    /// Mark complete. The assignee is back-filled with the closer when empty.
    pub fn close(&mut self, by: &str, at: DateTime<Utc>) {
        self.done = true;
        self.completed_at = Some(at);
        self.completed_by = Some(by.to_string());
        if self.assignee.is_none() {
            self.assignee = Some(by.to_string());
        }
    }

    /// Re-stamp the completion time of an already closed task.
    pub fn refresh_completion(&mut self, at: DateTime<Utc>) {
        if self.done {
            self.completed_at = Some(at);
        }
    }

    /// Remember a quoted message id that resolved to this task.
    pub fn link(&mut self, msg_id: &str) {
        if !self.came_from(msg_id) {
            self.linked_msg_ids.push(msg_id.to_string());
        }
    }

    /// Whether this task originated from, or was linked to, the given platform message.
    pub fn came_from(&self, msg_id: &str) -> bool {
        self.src_msg_id.as_deref() == Some(msg_id)
            || self.linked_msg_ids.iter().any(|id| id == msg_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_draft_normalizes_message() {
        let task = Task::from_draft(
            1,
            TaskDraft::new("  Sửa   ĐƯỜNG ống @Minh ", "u1"),
            Utc::now(),
        );
        assert_eq!(task.normalized, "sua duong ong");
        assert!(task.is_open());
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn test_close_sets_timestamp_and_backfills_assignee() {
        let now = Utc::now();
        let mut task = Task::from_draft(3, TaskDraft::new("thay bóng đèn", "u1"), now);
        task.close("u2", now);
        assert!(task.done);
        assert_eq!(task.completed_at, Some(now));
        assert_eq!(task.completed_by.as_deref(), Some("u2"));
        assert_eq!(task.assignee.as_deref(), Some("u2"));
    }

    #[test]
    fn test_close_keeps_existing_assignee() {
        let now = Utc::now();
        let mut draft = TaskDraft::new("kiểm tra máy bơm", "u1");
        draft.assignee = Some("Lan".into());
        let mut task = Task::from_draft(4, draft, now);
        task.close("u2", now);
        assert_eq!(task.assignee.as_deref(), Some("Lan"));
    }

    #[test]
    fn test_link_makes_task_answer_for_quoted_id() {
        let mut draft = TaskDraft::new("sửa van", "u1");
        draft.src_msg_id = Some("m1".into());
        let mut task = Task::from_draft(6, draft, Utc::now());
        task.link("m1");
        assert!(task.linked_msg_ids.is_empty());
        task.link("m99");
        task.link("m99");
        assert_eq!(task.linked_msg_ids, vec!["m99".to_string()]);
        assert!(task.came_from("m1"));
        assert!(task.came_from("m99"));
        assert!(!task.came_from("m2"));
    }

    #[test]
    fn test_refresh_ignores_open_task() {
        let now = Utc::now();
        let mut task = Task::from_draft(5, TaskDraft::new("x", "u1"), now);
        task.refresh_completion(now);
        assert!(task.completed_at.is_none());
    }
}
