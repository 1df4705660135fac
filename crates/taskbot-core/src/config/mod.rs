use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::TaskbotError;

/// Top-level taskbot configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub tasks: TaskConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub inbox: InboxConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// General bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Directory holding `tasks.json`, `inbox.json` and `logs/`.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

impl BotConfig {
    /// Data directory with `~/` expanded.
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(shellexpand(&self.data_dir))
    }
}

/// Task creation rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Longest accepted task body, in characters.
    #[serde(default = "default_max_len")]
    pub max_len: usize,
    /// Reuse an open task whose normalized text fuzzy-matches instead of creating a new one.
    #[serde(default)]
    pub dedup_open: bool,
    /// Offset from UTC used to interpret due dates written in messages.
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            max_len: default_max_len(),
            dedup_open: false,
            utc_offset_hours: default_utc_offset_hours(),
        }
    }
}

/// What to do when a completion points at a task that is already done.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconfirmPolicy {
    /// Leave the task untouched and tell the sender it was already done.
    #[default]
    Report,
    /// Leave the task untouched and stay silent.
    Ignore,
    /// Re-stamp the completion time.
    Refresh,
}

/// Completion matcher tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Shortest normalized quoted text that may be turned into a new task.
    #[serde(default = "default_min_quote_len")]
    pub min_quote_len: usize,
    /// Lookback for the same-sender inbox fallback.
    #[serde(default = "default_same_sender_window")]
    pub same_sender_window_secs: u64,
    /// Lookback for the any-sender inbox fallback.
    #[serde(default = "default_any_sender_window")]
    pub any_sender_window_secs: u64,
    #[serde(default)]
    pub reconfirm: ReconfirmPolicy,
    /// When true the last-resort tier closes the newest open task of anyone,
    /// not only of the sender.
    #[serde(default)]
    pub lenient_last_open: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            min_quote_len: default_min_quote_len(),
            same_sender_window_secs: default_same_sender_window(),
            any_sender_window_secs: default_any_sender_window(),
            reconfirm: ReconfirmPolicy::default(),
            lenient_last_open: false,
        }
    }
}

/// Longest accepted recency window (one week).
pub const MAX_WINDOW_SECS: u64 = 7 * 24 * 3600;

/// Accepted range of `tasks.utc_offset_hours`.
pub const UTC_OFFSET_RANGE: std::ops::RangeInclusive<i32> = -12..=14;

impl ResolverConfig {
    /// Widest recency window, capped at [`MAX_WINDOW_SECS`].
    pub fn lookback_secs(&self) -> u64 {
        self.same_sender_window_secs
            .max(self.any_sender_window_secs)
            .min(MAX_WINDOW_SECS)
    }
}

/// Recent-message buffer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboxConfig {
    #[serde(default = "default_inbox_capacity")]
    pub capacity: usize,
    /// Conversations whose messages are buffered. Empty = all.
    #[serde(default)]
    pub tracked_conversations: Vec<String>,
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            capacity: default_inbox_capacity(),
            tracked_conversations: Vec::new(),
        }
    }
}

impl InboxConfig {
    pub fn is_tracked(&self, conversation_id: &str) -> bool {
        self.tracked_conversations.is_empty()
            || self
                .tracked_conversations
                .iter()
                .any(|c| c == conversation_id)
    }
}

/// Outbound reply settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Upper bound on a single send, in seconds.
    #[serde(default = "default_notify_timeout")]
    pub timeout_secs: u64,
    /// Destination used before any conversation has been observed.
    #[serde(default)]
    pub default_target: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: default_notify_timeout(),
            default_target: String::new(),
        }
    }
}

// --- Default value functions ---

fn default_name() -> String {
    "OA 206 taskbot".to_string()
}
fn default_data_dir() -> String {
    "~/.taskbot".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_max_len() -> usize {
    500
}
fn default_utc_offset_hours() -> i32 {
    7
}
fn default_min_quote_len() -> usize {
    4
}
fn default_same_sender_window() -> u64 {
    15 * 60
}
fn default_any_sender_window() -> u64 {
    10 * 60
}
fn default_inbox_capacity() -> usize {
    500
}
fn default_notify_timeout() -> u64 {
    10
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file, falling back to defaults when missing.
pub fn load(path: &str) -> Result<Config, TaskbotError> {
    let path = Path::new(path);
    if !path.exists() {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| TaskbotError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| TaskbotError::Config(format!("failed to parse config: {}", e)))?;

    if config.tasks.max_len == 0 {
        return Err(TaskbotError::Config("tasks.max_len must be positive".into()));
    }
    if config.inbox.capacity == 0 {
        return Err(TaskbotError::Config("inbox.capacity must be positive".into()));
    }
    for (key, value) in [
        ("resolver.same_sender_window_secs", config.resolver.same_sender_window_secs),
        ("resolver.any_sender_window_secs", config.resolver.any_sender_window_secs),
    ] {
        if value > MAX_WINDOW_SECS {
            return Err(TaskbotError::Config(format!(
                "{key} must be at most {MAX_WINDOW_SECS}"
            )));
        }
    }
    if !UTC_OFFSET_RANGE.contains(&config.tasks.utc_offset_hours) {
        return Err(TaskbotError::Config(format!(
            "tasks.utc_offset_hours must be within {}..={}",
            UTC_OFFSET_RANGE.start(),
            UTC_OFFSET_RANGE.end()
        )));
    }

    Ok(config)
}
