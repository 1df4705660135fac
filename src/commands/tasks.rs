//! Task command handlers: /tasks, /done, /report.

use super::CommandContext;
use crate::replies;
use taskbot_core::task::Task;
use taskbot_memory::{CompletionRequest, Resolution, Store, TaskStats};
use tracing::error;

/// Tasks stated in this conversation. Tasks without a recorded
/// conversation are shown everywhere.
fn in_conversation(tasks: Vec<Task>, conversation_id: &str) -> Vec<Task> {
    tasks
        .into_iter()
        .filter(|t| {
            t.conversation_id
                .as_deref()
                .is_none_or(|c| c == conversation_id)
        })
        .collect()
}

pub(super) fn handle_tasks(ctx: &CommandContext<'_>) -> String {
    let open = in_conversation(ctx.store.open_tasks(), ctx.conversation_id);
    replies::open_tasks(&open, ctx.utc_offset_hours)
}

pub(super) fn handle_done(ctx: &mut CommandContext<'_>) -> String {
    let arg = ctx.text.split_whitespace().nth(1).unwrap_or("");
    let Ok(id) = arg.trim_start_matches('#').parse::<u64>() else {
        return replies::t("done_usage").to_string();
    };

    let req = CompletionRequest {
        sender_id: ctx.sender_id,
        conversation_id: ctx.conversation_id,
        message_id: ctx.message_id,
        quote: None,
        now: ctx.now,
    };
    match ctx.resolver.close_by_id(ctx.store, id, &req) {
        Ok(Resolution::Closed { task, .. }) => replies::task_closed(&task),
        Ok(Resolution::Reclosed { task, .. }) => replies::task_reclosed(&task),
        Ok(Resolution::AlreadyDone { task, .. }) => replies::task_already_done(&task),
        Ok(Resolution::Created { task, .. }) => replies::task_closed(&task),
        Ok(Resolution::NoMatch) => replies::unknown_task(id),
        Err(e) => {
            error!("failed to close task #{id}: {e}");
            replies::t("store_failed").to_string()
        }
    }
}

pub(super) fn handle_report(ctx: &CommandContext<'_>) -> String {
    conversation_report(ctx.store, ctx.conversation_id, ctx.utc_offset_hours)
}

/// Counts and open list for one conversation. Never mutates the store.
pub(crate) fn conversation_report(
    store: &Store,
    conversation_id: &str,
    utc_offset_hours: i32,
) -> String {
    let tasks = in_conversation(store.tasks(), conversation_id);
    let open: Vec<Task> = tasks.iter().filter(|t| t.is_open()).cloned().collect();
    let stats = TaskStats {
        total: tasks.len(),
        open: open.len(),
        done: tasks.len() - open.len(),
    };
    replies::report(stats, &open, utc_offset_hours)
}
