//! Completion resolver: decides which task a "done" message closes.
//!
//! Tiers run in a fixed order and the first one that yields a task wins:
//!
//! 1. reply by quoted message id (exact)
//! 2. reply by quoted text (fuzzy, newest open task first)
//! 3. reply as new: the quoted text becomes an already-closed task
//! 4. newest recent inbox message of the same sender (15 min)
//! 5. newest recent inbox message of anyone (10 min)
//! 6. newest open task created by the sender (or anyone, when lenient)
//!
//! Tiers 4 and 5 only run when the message carries no usable quoted text.
//! At most one task is created or mutated per call.

use crate::due::parse_due;
use crate::inbox::{Inbox, InboxEntry};
use crate::store::Store;
use chrono::{DateTime, Duration, Utc};
use taskbot_core::{
    config::{ReconfirmPolicy, ResolverConfig, MAX_WINDOW_SECS},
    error::TaskbotError,
    message::QuoteRef,
    normalize::{
        char_len, extract_mentions, fuzzy_match, is_command, is_completion_utterance, normalize,
    },
    task::{Task, TaskDraft},
};
use tracing::{debug, info};

/// Which rule produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    ReplyById,
    ReplyByText,
    ReplyAsNew,
    SameSenderRecent,
    AnySenderRecent,
    LastOpenOfSender,
    /// `/done <id>`.
    ExplicitId,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReplyById => "reply-id",
            Self::ReplyByText => "reply-text",
            Self::ReplyAsNew => "reply-new",
            Self::SameSenderRecent => "same-sender-recent",
            Self::AnySenderRecent => "any-sender-recent",
            Self::LastOpenOfSender => "last-open",
            Self::ExplicitId => "explicit-id",
        }
    }
}

/// Outcome of resolving a completion message.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// An existing open task was closed.
    Closed { task: Task, tier: MatchTier },
    /// A new task was synthesized and closed in one step.
    Created { task: Task, tier: MatchTier },
    /// The matched task was already complete and left untouched.
    /// `silent` is set under [`ReconfirmPolicy::Ignore`].
    AlreadyDone {
        task: Task,
        tier: MatchTier,
        silent: bool,
    },
    /// The matched task was already complete and its completion time re-stamped.
    Reclosed { task: Task, tier: MatchTier },
    /// Nothing matched; nothing was mutated.
    NoMatch,
}

impl Resolution {
    /// The task this resolution refers to, if any.
    pub fn task(&self) -> Option<&Task> {
        match self {
            Self::Closed { task, .. }
            | Self::Created { task, .. }
            | Self::AlreadyDone { task, .. }
            | Self::Reclosed { task, .. } => Some(task),
            Self::NoMatch => None,
        }
    }

    pub fn tier(&self) -> Option<MatchTier> {
        match self {
            Self::Closed { tier, .. }
            | Self::Created { tier, .. }
            | Self::AlreadyDone { tier, .. }
            | Self::Reclosed { tier, .. } => Some(*tier),
            Self::NoMatch => None,
        }
    }
}

/// The completion message being resolved.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub sender_id: &'a str,
    pub conversation_id: &'a str,
    pub message_id: &'a str,
    pub quote: Option<&'a QuoteRef>,
    pub now: DateTime<Utc>,
}

/// Completion resolver configured with the matcher tunables.
#[derive(Debug, Clone)]
pub struct Resolver {
    config: ResolverConfig,
    utc_offset_hours: i32,
}

impl Resolver {
    pub fn new(config: ResolverConfig, utc_offset_hours: i32) -> Self {
        Self {
            config,
            utc_offset_hours,
        }
    }

    /// Resolve a completion message against the store and inbox.
    ///
    /// Errors only come from persisting the chosen mutation.
    pub fn resolve(
        &self,
        store: &mut Store,
        inbox: &Inbox,
        req: &CompletionRequest<'_>,
    ) -> Result<Resolution, TaskbotError> {
        let quote_id = req.quote.and_then(QuoteRef::usable_id);
        let quote_text = req.quote.and_then(QuoteRef::usable_text);

        if let Some(quote_id) = quote_id {
            if let Some(task) = self.by_source_id(store, quote_id) {
                return self.settle(store, task, MatchTier::ReplyById, req, None);
            }
        }

        if let Some(text) = quote_text {
            let quoted = normalize(text);
            if let Some(task) = self.by_text(store, &quoted) {
                return self.settle(store, task, MatchTier::ReplyByText, req, quote_id);
            }

            if char_len(&quoted) >= self.config.min_quote_len {
                let quoted_sender = req
                    .quote
                    .and_then(|q| q.sender_id.as_deref())
                    .filter(|s| !s.is_empty());
                let mut draft = self.draft(text, quoted_sender.unwrap_or(req.sender_id), req.now);
                draft.src_msg_id = quote_id.map(str::to_string);
                draft.src_sender_id = quoted_sender.map(str::to_string);
                draft.conversation_id = Some(req.conversation_id.to_string());
                let task = store.create_closed(draft, req.sender_id, req.now)?;
                info!("task #{} created from quoted message and closed", task.id);
                return Ok(Resolution::Created {
                    task,
                    tier: MatchTier::ReplyAsNew,
                });
            }
            debug!("quoted text too short to become a task ({} chars)", char_len(&quoted));
        } else {
            let same_window = secs(self.config.same_sender_window_secs);
            if let Some(resolution) = self.from_inbox(
                store,
                inbox,
                req,
                Some(req.sender_id),
                same_window,
                MatchTier::SameSenderRecent,
            )? {
                return Ok(resolution);
            }

            let any_window = secs(self.config.any_sender_window_secs);
            if let Some(resolution) = self.from_inbox(
                store,
                inbox,
                req,
                None,
                any_window,
                MatchTier::AnySenderRecent,
            )? {
                return Ok(resolution);
            }
        }

        let last_open = store.tasks().into_iter().rev().find(|t| {
            t.is_open() && (self.config.lenient_last_open || t.creator_id == req.sender_id)
        });
        if let Some(task) = last_open {
            return self.settle(store, task, MatchTier::LastOpenOfSender, req, quote_id);
        }

        debug!("no task to close for {}", req.sender_id);
        Ok(Resolution::NoMatch)
    }

    /// Close a task by id (`/done <id>`), honoring the reconfirm policy.
    pub fn close_by_id(
        &self,
        store: &mut Store,
        id: u64,
        req: &CompletionRequest<'_>,
    ) -> Result<Resolution, TaskbotError> {
        match store.get(id) {
            Some(task) => self.settle(store, task, MatchTier::ExplicitId, req, None),
            None => Ok(Resolution::NoMatch),
        }
    }

    /// Open task from `msg_id` first, otherwise a closed one (for the reconfirm policy).
    fn by_source_id(&self, store: &Store, msg_id: &str) -> Option<Task> {
        let tasks = store.tasks();
        let open = tasks
            .iter()
            .rev()
            .find(|t| t.is_open() && t.came_from(msg_id));
        open.or_else(|| tasks.iter().rev().find(|t| t.came_from(msg_id)))
            .cloned()
    }

    /// Newest open task matching `normalized`, otherwise the newest closed one.
    fn by_text(&self, store: &Store, normalized: &str) -> Option<Task> {
        let tasks = store.tasks();
        let matches = |t: &&Task| fuzzy_match(normalized, &t.normalized);
        let open = tasks.iter().rev().filter(|t| t.is_open()).find(matches);
        open.or_else(|| tasks.iter().rev().find(matches)).cloned()
    }

    fn from_inbox(
        &self,
        store: &mut Store,
        inbox: &Inbox,
        req: &CompletionRequest<'_>,
        sender: Option<&str>,
        window: Duration,
        tier: MatchTier,
    ) -> Result<Option<Resolution>, TaskbotError> {
        let Some(entry) = inbox.latest(req.conversation_id, sender, window, req.now, |e| {
            is_candidate(e, req.message_id)
        }) else {
            return Ok(None);
        };
        debug!(
            "{} candidate {} from {}",
            tier.as_str(),
            entry.msg_id,
            entry.sender_id
        );

        let normalized = normalize(&entry.text);
        let tasks = store.tasks();
        let open = tasks
            .iter()
            .rev()
            .filter(|t| t.is_open())
            .find(|t| t.came_from(&entry.msg_id))
            .or_else(|| {
                if char_len(&normalized) < self.config.min_quote_len {
                    return None;
                }
                tasks
                    .iter()
                    .rev()
                    .filter(|t| t.is_open())
                    .find(|t| fuzzy_match(&normalized, &t.normalized))
            });
        if let Some(task) = open.cloned() {
            return self.settle(store, task, tier, req, None).map(Some);
        }

        if let Some(task) = tasks.iter().rev().find(|t| t.came_from(&entry.msg_id)).cloned() {
            return self.settle(store, task, tier, req, None).map(Some);
        }

        let mut draft = self.draft(&entry.text, &entry.sender_id, req.now);
        draft.src_msg_id = Some(entry.msg_id.clone());
        draft.src_sender_id = Some(entry.sender_id.clone());
        draft.conversation_id = Some(entry.conversation_id.clone());
        let task = store.create_closed(draft, req.sender_id, req.now)?;
        info!(
            "task #{} created from recent message {} and closed",
            task.id, entry.msg_id
        );
        Ok(Some(Resolution::Created { task, tier }))
    }

    /// Close an open task, or apply the reconfirm policy to a closed one.
    /// `link` is a quoted id that did not match the task's source; it is
    /// recorded so a repeated reply resolves to the same task.
    fn settle(
        &self,
        store: &mut Store,
        task: Task,
        tier: MatchTier,
        req: &CompletionRequest<'_>,
        link: Option<&str>,
    ) -> Result<Resolution, TaskbotError> {
        if task.is_open() {
            return Ok(match store.complete_linked(task.id, req.sender_id, req.now, link)? {
                Some(task) => {
                    info!("task #{} closed by {} ({})", task.id, req.sender_id, tier.as_str());
                    Resolution::Closed { task, tier }
                }
                None => Resolution::NoMatch,
            });
        }

        match self.config.reconfirm {
            ReconfirmPolicy::Report | ReconfirmPolicy::Ignore => Ok(Resolution::AlreadyDone {
                silent: self.config.reconfirm == ReconfirmPolicy::Ignore,
                task,
                tier,
            }),
            ReconfirmPolicy::Refresh => Ok(match store.refresh_completion(task.id, req.now)? {
                Some(task) => Resolution::Reclosed { task, tier },
                None => Resolution::NoMatch,
            }),
        }
    }

    /// Draft for `text` with the first mention as assignee and the parsed due date.
    pub fn draft(&self, text: &str, creator_id: &str, now: DateTime<Utc>) -> TaskDraft {
        let mut draft = TaskDraft::new(text.trim(), creator_id);
        draft.assignee = extract_mentions(text).into_iter().next();
        draft.due_at = parse_due(text, self.utc_offset_hours, now);
        draft
    }
}

/// Inbox entries that may stand for a task: not the completion message
/// itself, not a command, not another completion, not empty.
fn is_candidate(entry: &InboxEntry, current_msg_id: &str) -> bool {
    entry.msg_id != current_msg_id
        && !is_command(&entry.text)
        && !is_completion_utterance(&entry.text)
        && !normalize(&entry.text).is_empty()
}

fn secs(value: u64) -> Duration {
    let capped = value.min(MAX_WINDOW_SECS);
    Duration::seconds(i64::try_from(capped).unwrap_or(0))
}
