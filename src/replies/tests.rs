use super::*;
use taskbot_core::task::TaskDraft;

fn task(id: u64, text: &str) -> Task {
    let now = DateTime::parse_from_rfc3339("2026-10-18T03:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    Task::from_draft(id, TaskDraft::new(text, "u1"), now)
}

#[test]
fn test_all_keys_resolve() {
    for key in [
        "no_open_tasks",
        "open_tasks_header",
        "report_header",
        "done_usage",
        "store_failed",
        "help",
    ] {
        assert_ne!(t(key), "???", "missing reply text for {key}");
    }
    assert_eq!(t("nope"), "???");
}

#[test]
fn test_task_line_with_assignee_and_due() {
    let mut task = task(3, "Sửa đường ống A");
    task.assignee = Some("Minh".into());
    task.due_at = Some(
        DateTime::parse_from_rfc3339("2026-10-25T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc),
    );
    assert_eq!(
        task_line(&task, 7),
        "#3 Sửa đường ống A (@Minh, hạn 25/10 17:00)"
    );
}

#[test]
fn test_task_line_plain() {
    assert_eq!(task_line(&task(1, "lau kính"), 7), "#1 lau kính");
}

#[test]
fn test_open_tasks_empty_and_listed() {
    assert_eq!(open_tasks(&[], 7), t("no_open_tasks"));
    let text = open_tasks(&[task(1, "một"), task(2, "hai")], 7);
    assert!(text.starts_with(t("open_tasks_header")));
    assert!(text.contains("#1 một"));
    assert!(text.contains("#2 hai"));
}

#[test]
fn test_report_counts() {
    let stats = TaskStats {
        total: 3,
        open: 1,
        done: 2,
    };
    let text = report(stats, &[task(4, "kiểm tra van")], 7);
    assert!(text.contains("Tổng: 3 | Đang mở: 1 | Đã xong: 2"));
    assert!(text.contains("#4 kiểm tra van"));
}

#[test]
fn test_task_line_with_out_of_range_offset_falls_back_to_utc() {
    let mut task = task(5, "kiểm tra van");
    task.due_at = Some(
        DateTime::parse_from_rfc3339("2026-10-25T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc),
    );
    assert_eq!(task_line(&task, i32::MAX), "#5 kiểm tra van (hạn 25/10 10:00)");
}
