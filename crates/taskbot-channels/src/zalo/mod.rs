//! Zalo Official Account webhook decoding.
//!
//! Only text events become [`EventKind::Text`]. Group messages carry the
//! group id either at the top level or inside `message`; private messages
//! use the sender as the conversation.

mod types;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use taskbot_core::{
    error::TaskbotError,
    message::{EventKind, InboundEvent, QuoteRef},
};
use tracing::debug;
use types::{ZaloMessage, ZaloWebhook};

/// Event names that carry user text.
const TEXT_EVENTS: &[&str] = &["user_send_text", "user_send_group_text"];

/// Decode a webhook body into an [`InboundEvent`].
///
/// Fails only on malformed JSON or a payload without a sender.
pub fn parse_webhook(body: &str) -> Result<InboundEvent, TaskbotError> {
    let hook: ZaloWebhook = serde_json::from_str(body)
        .map_err(|e| TaskbotError::Channel(format!("invalid webhook payload: {e}")))?;

    let sender = hook
        .sender
        .filter(|s| !s.id.trim().is_empty())
        .ok_or_else(|| TaskbotError::Channel("webhook payload has no sender".into()))?;

    let kind = if TEXT_EVENTS.contains(&hook.event_name.as_str()) {
        EventKind::Text
    } else {
        debug!("zalo: non-text event '{}'", hook.event_name);
        EventKind::Other
    };

    let timestamp = hook
        .timestamp
        .as_ref()
        .and_then(parse_timestamp)
        .unwrap_or_else(Utc::now);
    let message = hook.message.unwrap_or_default();

    let group_id = non_empty(hook.group_id).or_else(|| non_empty(message.group_id.clone()));
    let conversation_id = match group_id {
        Some(id) => id,
        None if hook.event_name == "user_send_group_text" => hook
            .recipient
            .map(|r| r.id)
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| sender.id.clone()),
        None => sender.id.clone(),
    };

    let message_id = non_empty(message.msg_id.clone())
        .unwrap_or_else(|| format!("{}-{}", sender.id, timestamp.timestamp_millis()));

    Ok(InboundEvent {
        kind,
        sender_id: sender.id,
        sender_name: non_empty(sender.display_name),
        conversation_id,
        message_id,
        text: message.text.clone().unwrap_or_default(),
        timestamp,
        quote: quote_of(message),
    })
}

/// Flat quote fields win over the nested object, field by field.
fn quote_of(message: ZaloMessage) -> Option<QuoteRef> {
    let nested = message.quote.unwrap_or_default();
    let quote = QuoteRef {
        message_id: non_empty(message.quote_msg_id).or_else(|| non_empty(nested.msg_id)),
        text: message.quote_text.or(nested.text),
        sender_id: non_empty(message.quote_sender_id).or_else(|| non_empty(nested.sender_id)),
    };
    if quote.message_id.is_none() && quote.text.is_none() {
        None
    } else {
        Some(quote)
    }
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let millis = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }?;
    Utc.timestamp_millis_opt(millis).single()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests;
