//! # taskbot-memory
//!
//! File-backed task store, recent-message inbox, and the completion
//! resolver that ties them together.

pub mod due;
pub mod inbox;
pub mod resolver;
pub mod store;

pub use inbox::{Inbox, InboxEntry};
pub use resolver::{CompletionRequest, MatchTier, Resolution, Resolver};
pub use store::{Store, TaskStats};
