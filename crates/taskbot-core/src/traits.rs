use crate::{error::TaskbotError, message::OutgoingMessage, task::Task};
use async_trait::async_trait;

/// Persistence seam for task records.
///
/// Every mutation rewrites the whole collection. Implementations degrade
/// unreadable state to an empty list instead of failing.
pub trait TaskStorage: Send {
    /// Short backend name for logs and `status`.
    fn name(&self) -> &str;

    /// All records in creation order.
    fn list(&self) -> Vec<Task>;

    /// Append one record and persist.
    fn append(&mut self, task: Task) -> Result<(), TaskbotError>;

    /// Replace the whole collection and persist.
    fn replace_all(&mut self, tasks: Vec<Task>) -> Result<(), TaskbotError>;

    /// Highest id ever stored. Survives a bulk clear so ids are never reused.
    fn last_id(&self) -> u64;
}

/// Outbound "send text to conversation" capability.
///
/// Delivery failures are returned to the caller, which only logs them.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Human-readable notifier name.
    fn name(&self) -> &str;

    /// Send a text body to a destination.
    async fn send_text(&self, message: OutgoingMessage) -> Result<(), TaskbotError>;
}
