//! Zalo OA webhook deserialization types.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub(crate) struct ZaloWebhook {
    #[serde(default)]
    pub event_name: String,
    /// Milliseconds since epoch, sent as a string or a number.
    #[serde(default)]
    pub timestamp: Option<Value>,
    pub sender: Option<ZaloUser>,
    pub recipient: Option<ZaloUser>,
    pub message: Option<ZaloMessage>,
    #[serde(default)]
    pub group_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ZaloUser {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ZaloMessage {
    #[serde(default)]
    pub msg_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    /// Flat quote fields, as sent by some client versions.
    #[serde(default, alias = "quote_message_id")]
    pub quote_msg_id: Option<String>,
    #[serde(default, alias = "quote_content")]
    pub quote_text: Option<String>,
    #[serde(default, alias = "quote_from_id")]
    pub quote_sender_id: Option<String>,
    /// Nested quote object, as sent by others.
    #[serde(default)]
    pub quote: Option<ZaloQuote>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ZaloQuote {
    #[serde(default, alias = "message_id")]
    pub msg_id: Option<String>,
    #[serde(default, alias = "content")]
    pub text: Option<String>,
    #[serde(default, alias = "from_id")]
    pub sender_id: Option<String>,
}
