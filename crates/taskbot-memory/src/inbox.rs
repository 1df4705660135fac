//! Bounded buffer of recent messages.
//!
//! Feeds the recency fallbacks of the completion resolver. One buffer is
//! shared by all conversations; lookups filter by conversation. Entries are
//! evicted once older than the retention window (relative to the newest
//! arrival) or when the buffer exceeds its capacity, oldest first, whatever
//! conversation they belong to.

use crate::store::{read_json_or_default, write_json_atomic};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use taskbot_core::error::TaskbotError;
use tracing::debug;

/// File name of the persisted inbox inside the data directory.
pub const INBOX_FILE: &str = "inbox.json";

/// A buffered inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxEntry {
    pub msg_id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

/// Ring buffer of recent messages, optionally mirrored to a JSON file.
#[derive(Debug)]
pub struct Inbox {
    entries: VecDeque<InboxEntry>,
    capacity: usize,
    retention: Duration,
    path: Option<PathBuf>,
}

impl Inbox {
    /// In-memory inbox.
    pub fn new(capacity: usize, retention: Duration) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            retention,
            path: None,
        }
    }

    /// Inbox persisted at `{data_dir}/inbox.json`. Unreadable state starts empty.
    pub fn open(data_dir: &Path, capacity: usize, retention: Duration) -> Self {
        let path = data_dir.join(INBOX_FILE);
        let entries: Vec<InboxEntry> = read_json_or_default(&path).unwrap_or_default();
        let mut inbox = Self {
            entries: entries.into(),
            capacity: capacity.max(1),
            retention,
            path: Some(path),
        };
        inbox.evict();
        inbox
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &InboxEntry> {
        self.entries.iter()
    }

    /// Buffer a message, evict, and persist when file-backed.
    pub fn push(&mut self, entry: InboxEntry) -> Result<(), TaskbotError> {
        self.entries.push_back(entry);
        self.evict();
        self.save()
    }

    /// Newest entry in `conversation_id` within `window` of `now` that
    /// passes `accept`, optionally restricted to one sender.
    pub fn latest(
        &self,
        conversation_id: &str,
        sender_id: Option<&str>,
        window: Duration,
        now: DateTime<Utc>,
        accept: impl Fn(&InboxEntry) -> bool,
    ) -> Option<&InboxEntry> {
        let cutoff = now
            .checked_sub_signed(window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.entries
            .iter()
            .rev()
            .filter(|e| e.conversation_id == conversation_id)
            .filter(|e| sender_id.is_none_or(|s| e.sender_id == s))
            .filter(|e| e.received_at >= cutoff && e.received_at <= now)
            .find(|e| accept(e))
    }

    fn evict(&mut self) {
        let newest = self.entries.iter().map(|e| e.received_at).max();
        if let Some(cutoff) = newest.and_then(|n| n.checked_sub_signed(self.retention)) {
            let before = self.entries.len();
            self.entries.retain(|e| e.received_at >= cutoff);
            if self.entries.len() < before {
                debug!("inbox evicted {} stale entries", before - self.entries.len());
            }
        }
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    fn save(&self) -> Result<(), TaskbotError> {
        match &self.path {
            Some(path) => write_json_atomic(path, &self.entries),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, conv: &str, sender: &str, text: &str, at: DateTime<Utc>) -> InboxEntry {
        InboxEntry {
            msg_id: id.into(),
            conversation_id: conv.into(),
            sender_id: sender.into(),
            text: text.into(),
            received_at: at,
        }
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let now = Utc::now();
        let mut inbox = Inbox::new(2, Duration::minutes(15));
        inbox.push(entry("m1", "g", "u1", "one", now)).unwrap();
        inbox.push(entry("m2", "g", "u1", "two", now)).unwrap();
        inbox.push(entry("m3", "g", "u1", "three", now)).unwrap();
        let ids: Vec<_> = inbox.entries().map(|e| e.msg_id.as_str()).collect();
        assert_eq!(ids, vec!["m2", "m3"]);
    }

    #[test]
    fn test_retention_evicts_stale_entries() {
        let now = Utc::now();
        let mut inbox = Inbox::new(100, Duration::minutes(15));
        inbox
            .push(entry("old", "g", "u1", "old", now - Duration::minutes(20)))
            .unwrap();
        inbox.push(entry("new", "g", "u1", "new", now)).unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox.entries().next().unwrap().msg_id, "new");
    }

    #[test]
    fn test_latest_filters_sender_window_and_predicate() {
        let now = Utc::now();
        let mut inbox = Inbox::new(100, Duration::minutes(15));
        inbox
            .push(entry("m1", "g", "u1", "sửa ống", now - Duration::minutes(12)))
            .unwrap();
        inbox
            .push(entry("m2", "g", "u2", "thay đèn", now - Duration::minutes(5)))
            .unwrap();
        inbox
            .push(entry("m3", "g", "u1", "/tasks", now - Duration::minutes(1)))
            .unwrap();
        inbox
            .push(entry("m4", "other", "u1", "khác", now))
            .unwrap();

        let not_command = |e: &InboxEntry| !e.text.starts_with('/');

        let same = inbox
            .latest("g", Some("u1"), Duration::minutes(15), now, not_command)
            .unwrap();
        assert_eq!(same.msg_id, "m1");

        assert!(inbox
            .latest("g", Some("u1"), Duration::minutes(10), now, not_command)
            .is_none());

        let any = inbox
            .latest("g", None, Duration::minutes(10), now, not_command)
            .unwrap();
        assert_eq!(any.msg_id, "m2");
    }

    #[test]
    fn test_huge_retention_does_not_overflow() {
        let now = Utc::now();
        let mut inbox = Inbox::new(10, Duration::seconds(1_000_000_000_000_000));
        inbox.push(entry("m1", "g", "u1", "một", now)).unwrap();
        inbox.push(entry("m2", "g", "u1", "hai", now)).unwrap();
        assert_eq!(inbox.len(), 2);
        let window = Duration::seconds(1_000_000_000_000_000);
        let hit = inbox.latest("g", None, window, now, |_| true).unwrap();
        assert_eq!(hit.msg_id, "m2");
    }

    #[test]
    fn test_capacity_is_shared_across_conversations() {
        let now = Utc::now();
        let mut inbox = Inbox::new(2, Duration::minutes(15));
        inbox.push(entry("q1", "quiet", "u1", "một", now)).unwrap();
        inbox.push(entry("b1", "busy", "u2", "hai", now)).unwrap();
        inbox.push(entry("b2", "busy", "u2", "ba", now)).unwrap();
        assert!(inbox
            .latest("quiet", None, Duration::minutes(15), now, |_| true)
            .is_none());
    }

    #[test]
    fn test_file_backed_roundtrip_and_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc::now();
        {
            let mut inbox = Inbox::open(dir.path(), 10, Duration::minutes(15));
            inbox.push(entry("m1", "g", "u1", "một", now)).unwrap();
        }
        let inbox = Inbox::open(dir.path(), 10, Duration::minutes(15));
        assert_eq!(inbox.len(), 1);

        std::fs::write(dir.path().join(INBOX_FILE), "[{broken").unwrap();
        let inbox = Inbox::open(dir.path(), 10, Duration::minutes(15));
        assert!(inbox.is_empty());
    }
}
