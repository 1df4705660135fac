//! Event processing pipeline: the handle_event flow.

use super::{Gateway, State};
use crate::commands::{self, Command, CommandContext};
use crate::replies;
use taskbot_core::{
    message::{EventKind, InboundEvent},
    normalize::{char_len, is_command, is_completion_utterance, normalize},
    task::Task,
};
use taskbot_memory::{CompletionRequest, InboxEntry, Resolution};
use std::fmt;
use tracing::{debug, error, info, warn};

/// What the gateway did with an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Not acted on: non-text event, blank text, or an unknown command.
    Ignored,
    /// A slash command was answered.
    Command(Command),
    /// A new open task was recorded.
    Created(Task),
    /// De-duplication found an equivalent open task; nothing was written.
    Duplicate(Task),
    /// The body exceeds the configured maximum length.
    TooLong,
    /// A completion utterance was resolved.
    Completion(Resolution),
    /// Persisting the change failed.
    Failed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ignored => write!(f, "ignored"),
            Self::Command(cmd) => write!(f, "command {}", cmd.name()),
            Self::Created(task) => write!(f, "created #{}", task.id),
            Self::Duplicate(task) => write!(f, "duplicate of #{}", task.id),
            Self::TooLong => write!(f, "rejected: too long"),
            Self::Completion(resolution) => match (resolution, resolution.tier()) {
                (Resolution::Closed { task, .. }, Some(tier)) => {
                    write!(f, "closed #{} ({})", task.id, tier.as_str())
                }
                (Resolution::Created { task, .. }, Some(tier)) => {
                    write!(f, "created and closed #{} ({})", task.id, tier.as_str())
                }
                (Resolution::AlreadyDone { task, .. }, _) => {
                    write!(f, "#{} already done", task.id)
                }
                (Resolution::Reclosed { task, .. }, _) => write!(f, "re-closed #{}", task.id),
                _ => write!(f, "no task to close"),
            },
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl Gateway {
    /// Process one inbound event end to end. Never fails: errors are
    /// logged and reported as [`Outcome::Failed`].
    pub async fn handle_event(&self, event: InboundEvent) -> Outcome {
        // --- 1. IGNORE NON-TEXT EVENTS ---
        if event.kind != EventKind::Text {
            debug!("ignoring non-text event from {}", event.sender_id);
            return Outcome::Ignored;
        }
        let preview: String = event.text.chars().take(60).collect();
        info!(
            "[{}] {} says: {}",
            event.conversation_id,
            event.sender_name.as_deref().unwrap_or(&event.sender_id),
            preview
        );

        // --- 2. REMEMBER DESTINATION ---
        self.destination.observe(&event.conversation_id);

        // --- 3..5. BUFFER, CLASSIFY, PERSIST ---
        let (outcome, reply) = self.process(&event);

        // --- 6. REPLY ---
        if let Some(text) = reply {
            self.send_reply(&event.conversation_id, text).await;
        }
        outcome
    }

    /// Synchronous part of the pipeline, run under the state lock.
    fn process(&self, event: &InboundEvent) -> (Outcome, Option<String>) {
        let text = event.text.trim();
        if text.is_empty() {
            return (Outcome::Ignored, None);
        }

        let mut guard = self.lock();
        let State { store, inbox } = &mut *guard;
        let now = event.timestamp;

        // --- 3. BUFFER INTO INBOX ---
        // Over-long bodies never become tasks, not even through the inbox fallbacks.
        let too_long = char_len(text) > self.task_config.max_len;
        if !too_long && self.inbox_config.is_tracked(&event.conversation_id) {
            let entry = InboxEntry {
                msg_id: event.message_id.clone(),
                conversation_id: event.conversation_id.clone(),
                sender_id: event.sender_id.clone(),
                text: text.to_string(),
                received_at: now,
            };
            if let Err(e) = inbox.push(entry) {
                warn!("inbox write failed: {e}");
            }
        }

        // --- 4a. COMMAND ---
        if is_command(text) {
            let Some(cmd) = Command::parse(text) else {
                debug!("unknown command: {text}");
                return (Outcome::Ignored, None);
            };
            let mut ctx = CommandContext {
                store,
                resolver: &self.resolver,
                conversation_id: &event.conversation_id,
                sender_id: &event.sender_id,
                message_id: &event.message_id,
                text,
                now,
                utc_offset_hours: self.task_config.utc_offset_hours,
            };
            let reply = commands::handle(cmd, &mut ctx);
            return (Outcome::Command(cmd), Some(reply));
        }

        // --- 4b. COMPLETION ---
        if is_completion_utterance(text) {
            let req = CompletionRequest {
                sender_id: &event.sender_id,
                conversation_id: &event.conversation_id,
                message_id: &event.message_id,
                quote: event.quote.as_ref(),
                now,
            };
            return match self.resolver.resolve(store, inbox, &req) {
                Ok(resolution) => {
                    let reply = completion_reply(&resolution);
                    (Outcome::Completion(resolution), reply)
                }
                Err(e) => {
                    error!("failed to record completion from {}: {e}", event.sender_id);
                    (Outcome::Failed, Some(replies::t("store_failed").to_string()))
                }
            };
        }

        // --- 4c. NEW TASK ---
        if normalize(text).is_empty() {
            debug!("nothing left after normalization, not a task");
            return (Outcome::Ignored, None);
        }
        if too_long {
            return (
                Outcome::TooLong,
                Some(replies::task_too_long(self.task_config.max_len)),
            );
        }
        if self.task_config.dedup_open {
            if let Some(existing) = store.find_open_match(&normalize(text)) {
                debug!("message matches open task #{}", existing.id);
                let reply = replies::task_duplicate(&existing);
                return (Outcome::Duplicate(existing), Some(reply));
            }
        }

        // --- 5. PERSIST ---
        let mut draft = self.resolver.draft(text, &event.sender_id, now);
        draft.src_msg_id = Some(event.message_id.clone());
        draft.src_sender_id = Some(event.sender_id.clone());
        draft.conversation_id = Some(event.conversation_id.clone());
        match store.create_task(draft, now) {
            Ok(task) => {
                info!("task #{} created by {}", task.id, event.sender_id);
                let reply = replies::task_created(&task);
                (Outcome::Created(task), Some(reply))
            }
            Err(e) => {
                error!("failed to create task from {}: {e}", event.message_id);
                (Outcome::Failed, Some(replies::t("store_failed").to_string()))
            }
        }
    }
}

/// Reply for a resolution. Nothing is said when there was nothing to close
/// or the reconfirm policy is silent.
fn completion_reply(resolution: &Resolution) -> Option<String> {
    match resolution {
        Resolution::Closed { task, .. } => Some(replies::task_closed(task)),
        Resolution::Created { task, tier } => Some(replies::task_created_closed(task, *tier)),
        Resolution::AlreadyDone { silent: true, .. } => None,
        Resolution::AlreadyDone { task, .. } => Some(replies::task_already_done(task)),
        Resolution::Reclosed { task, .. } => Some(replies::task_reclosed(task)),
        Resolution::NoMatch => None,
    }
}
