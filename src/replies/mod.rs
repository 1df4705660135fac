//! Reply texts sent back to the conversation.
//!
//! Static strings go through [`t`]; anything with interpolation has its
//! own `format_*`-style helper below.

#[cfg(test)]
mod tests;

use chrono::{DateTime, FixedOffset, Utc};
use taskbot_core::task::Task;
use taskbot_memory::{MatchTier, TaskStats};

/// Static reply text for `key`.
pub fn t(key: &str) -> &'static str {
    match key {
        "no_open_tasks" => "Không có việc nào đang mở.",
        "open_tasks_header" => "📋 Việc đang mở:",
        "report_header" => "📊 Báo cáo công việc",
        "done_usage" => "Cú pháp: /done <số việc>",
        "store_failed" => "⚠️ Không lưu được dữ liệu, vui lòng thử lại.",
        "help" => "Lệnh:\n\
            /tasks: danh sách việc đang mở\n\
            /done <số>: đánh dấu việc đã xong\n\
            /report: báo cáo tổng hợp\n\
            /help: hướng dẫn\n\
            Nhắn nội dung để tạo việc mới. Trả lời tin nhắn giao việc bằng \"xong\" để hoàn thành.",
        _ => "???",
    }
}

/// One task as a list line: `#id body (@assignee, hạn dd/mm HH:MM)`.
pub fn task_line(task: &Task, utc_offset_hours: i32) -> String {
    let mut extras = Vec::new();
    if let Some(assignee) = &task.assignee {
        extras.push(format!("@{assignee}"));
    }
    if let Some(due) = task.due_at {
        extras.push(format!("hạn {}", local_time(due, utc_offset_hours)));
    }
    if extras.is_empty() {
        format!("#{} {}", task.id, task.message)
    } else {
        format!("#{} {} ({})", task.id, task.message, extras.join(", "))
    }
}

/// Open-task list, or the "nothing open" text.
pub fn open_tasks(tasks: &[Task], utc_offset_hours: i32) -> String {
    if tasks.is_empty() {
        return t("no_open_tasks").to_string();
    }
    let mut out = t("open_tasks_header").to_string();
    for task in tasks {
        out.push('\n');
        out.push_str(&task_line(task, utc_offset_hours));
    }
    out
}

/// Counts plus the open list.
pub fn report(stats: TaskStats, open: &[Task], utc_offset_hours: i32) -> String {
    format!(
        "{}\nTổng: {} | Đang mở: {} | Đã xong: {}\n{}",
        t("report_header"),
        stats.total,
        stats.open,
        stats.done,
        open_tasks(open, utc_offset_hours)
    )
}

pub fn task_created(task: &Task) -> String {
    format!("📝 Đã ghi nhận việc #{}: {}", task.id, task.message)
}

pub fn task_duplicate(task: &Task) -> String {
    format!("Việc này đã có: #{} {}", task.id, task.message)
}

pub fn task_too_long(max_len: usize) -> String {
    format!("Nội dung việc quá dài (tối đa {max_len} ký tự).")
}

pub fn task_closed(task: &Task) -> String {
    format!("✅ Đã hoàn thành việc #{}: {}", task.id, task.message)
}

/// A task synthesized from a quoted or recent message and closed at once.
pub fn task_created_closed(task: &Task, tier: MatchTier) -> String {
    let source = match tier {
        MatchTier::ReplyAsNew => "tin được trả lời",
        _ => "tin nhắn gần nhất",
    };
    format!(
        "✅ Đã ghi nhận và hoàn thành việc #{} (từ {source}): {}",
        task.id, task.message
    )
}

pub fn task_already_done(task: &Task) -> String {
    format!("Việc #{} đã được hoàn thành trước đó.", task.id)
}

pub fn task_reclosed(task: &Task) -> String {
    format!("🔁 Đã cập nhật thời gian hoàn thành việc #{}.", task.id)
}

pub fn unknown_task(id: u64) -> String {
    format!("Không có việc #{id}.")
}

fn local_time(at: DateTime<Utc>, utc_offset_hours: i32) -> String {
    match utc_offset_hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
    {
        Some(offset) => at.with_timezone(&offset).format("%d/%m %H:%M").to_string(),
        None => at.format("%d/%m %H:%M").to_string(),
    }
}
