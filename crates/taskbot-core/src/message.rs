use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of inbound webhook event. Only text messages feed the task pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A text message (private or group).
    Text,
    /// Follow/unfollow, stickers, images, and anything the bot does not act on.
    Other,
}

/// Reference to an earlier message that the inbound message replies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRef {
    /// Platform message id of the quoted message.
    #[serde(default)]
    pub message_id: Option<String>,
    /// Text of the quoted message, as delivered by the client.
    #[serde(default)]
    pub text: Option<String>,
    /// Sender of the quoted message.
    #[serde(default)]
    pub sender_id: Option<String>,
}

impl QuoteRef {
    /// Quoted text, trimmed, or `None` when empty or whitespace-only.
    pub fn usable_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Quoted message id, or `None` when empty.
    pub fn usable_id(&self) -> Option<&str> {
        self.message_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// An inbound event decoded from a channel webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    pub kind: EventKind,
    /// Platform-specific user ID.
    pub sender_id: String,
    /// Human-readable sender name.
    #[serde(default)]
    pub sender_name: Option<String>,
    /// Group id for group messages, the sender's id for private chats.
    pub conversation_id: String,
    /// Platform message id.
    pub message_id: String,
    /// Message text content.
    #[serde(default)]
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Present when the message was sent as a reply.
    #[serde(default)]
    pub quote: Option<QuoteRef>,
}

/// An outgoing text message for the notifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Destination conversation (group id or user id).
    pub target: String,
    pub text: String,
}
