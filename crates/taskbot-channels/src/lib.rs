//! # taskbot-channels
//!
//! Messaging platform integrations: webhook payload decoding and the
//! notifiers that deliver replies.

pub mod notify;
pub mod zalo;

pub use notify::{LogNotifier, QueueNotifier};
