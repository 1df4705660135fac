//! [`Notifier`] implementations.

use async_trait::async_trait;
use taskbot_core::{error::TaskbotError, message::OutgoingMessage, traits::Notifier};
use tokio::sync::mpsc;
use tracing::info;

/// Writes replies to the log instead of a platform API.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn send_text(&self, message: OutgoingMessage) -> Result<(), TaskbotError> {
        if message.target.is_empty() {
            return Err(TaskbotError::Channel("no destination for reply".into()));
        }
        info!("reply -> {}: {}", message.target, message.text);
        Ok(())
    }
}

/// Hands replies to an in-process consumer over an mpsc channel.
#[derive(Debug, Clone)]
pub struct QueueNotifier {
    tx: mpsc::Sender<OutgoingMessage>,
}

impl QueueNotifier {
    /// Create a notifier and the receiving end of its queue.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<OutgoingMessage>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Notifier for QueueNotifier {
    fn name(&self) -> &str {
        "queue"
    }

    async fn send_text(&self, message: OutgoingMessage) -> Result<(), TaskbotError> {
        self.tx
            .send(message)
            .await
            .map_err(|_| TaskbotError::Channel("reply queue closed".into()))
    }
}
