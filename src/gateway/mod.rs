//! Gateway: routes decoded webhook events through classification, the
//! task store and the notifier.

mod destination;
mod pipeline;


pub use destination::Destination;

use crate::commands;
use chrono::Duration;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use taskbot_core::{
    config::{Config, InboxConfig, NotifyConfig, TaskConfig},
    message::OutgoingMessage,
    traits::Notifier,
};
use taskbot_memory::{Inbox, Resolver, Store};
use tracing::{debug, info, warn};

/// Mutable state guarded by the gateway lock.
pub(crate) struct State {
    pub(crate) store: Store,
    pub(crate) inbox: Inbox,
}

/// The central gateway that turns inbound events into task changes and replies.
pub struct Gateway {
    pub(super) state: Mutex<State>,
    pub(super) resolver: Resolver,
    pub(super) notifier: Arc<dyn Notifier>,
    pub(super) destination: Destination,
    pub(super) task_config: TaskConfig,
    pub(super) inbox_config: InboxConfig,
    pub(super) notify_config: NotifyConfig,
}

impl Gateway {
    /// Create a new gateway.
    pub fn new(config: &Config, store: Store, inbox: Inbox, notifier: Arc<dyn Notifier>) -> Self {
        info!(
            "{} gateway ready | store: {} | notifier: {} | replies: {}",
            config.bot.name,
            store.backend(),
            notifier.name(),
            if config.notify.enabled { "on" } else { "off" },
        );
        Self {
            state: Mutex::new(State { store, inbox }),
            resolver: Resolver::new(config.resolver.clone(), config.tasks.utc_offset_hours),
            notifier,
            destination: Destination::new(&config.notify.default_target),
            task_config: config.tasks.clone(),
            inbox_config: config.inbox.clone(),
            notify_config: config.notify.clone(),
        }
    }

    /// Replace the in-memory destination, e.g. with a persisted one.
    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// Inbox retention matching the widest recency window in `config`.
    pub fn inbox_retention(config: &Config) -> Duration {
        Duration::seconds(i64::try_from(config.resolver.lookback_secs()).unwrap_or(0))
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    /// Send the conversation report to the destination conversation.
    /// Returns `false` when no destination is known yet.
    pub async fn report_to_destination(&self) -> bool {
        let Some(target) = self.destination.get() else {
            warn!("no destination known, report not sent");
            return false;
        };
        let text = {
            let state = self.lock();
            commands::conversation_report(&state.store, target, self.task_config.utc_offset_hours)
        };
        self.send_reply(target, text).await;
        true
    }

    /// Lock the state, recovering from a poisoned lock.
    pub(super) fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver a reply within the configured time bound. Failures are only logged.
    pub(super) async fn send_reply(&self, target: &str, text: String) {
        if !self.notify_config.enabled {
            debug!("replies disabled, dropping reply to {target}");
            return;
        }
        let message = OutgoingMessage {
            target: target.to_string(),
            text,
        };
        let limit = std::time::Duration::from_secs(self.notify_config.timeout_secs.max(1));
        match tokio::time::timeout(limit, self.notifier.send_text(message)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("reply via {} to {target} failed: {e}", self.notifier.name()),
            Err(_) => warn!(
                "reply via {} to {target} timed out after {}s",
                self.notifier.name(),
                limit.as_secs()
            ),
        }
    }
}
