//! Slash commands: instant replies that never become tasks.

mod tasks;

pub(crate) use tasks::conversation_report;

#[cfg(test)]
mod tests;

use crate::replies;
use chrono::{DateTime, Utc};
use taskbot_memory::{Resolver, Store};

/// Grouped context for command execution.
pub struct CommandContext<'a> {
    pub store: &'a mut Store,
    pub resolver: &'a Resolver,
    pub conversation_id: &'a str,
    pub sender_id: &'a str,
    pub message_id: &'a str,
    pub text: &'a str,
    pub now: DateTime<Utc>,
    pub utc_offset_hours: i32,
}

/// Known bot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Tasks,
    Done,
    Report,
    Help,
}

impl Command {
    /// Parse a command from message text. Returns `None` for unknown `/` prefixes,
    /// which the gateway ignores.
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        // "/tasks@oa206bot" → "/tasks".
        let cmd = first.split('@').next().unwrap_or(first).to_lowercase();
        match cmd.as_str() {
            "/tasks" | "/list" => Some(Self::Tasks),
            "/done" => Some(Self::Done),
            "/report" => Some(Self::Report),
            "/help" => Some(Self::Help),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Tasks => "/tasks",
            Self::Done => "/done",
            Self::Report => "/report",
            Self::Help => "/help",
        }
    }
}

/// Handle a command and return the reply text.
pub fn handle(cmd: Command, ctx: &mut CommandContext<'_>) -> String {
    match cmd {
        Command::Tasks => tasks::handle_tasks(ctx),
        Command::Done => tasks::handle_done(ctx),
        Command::Report => tasks::handle_report(ctx),
        Command::Help => replies::t("help").to_string(),
    }
}
