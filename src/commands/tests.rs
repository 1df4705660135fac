use super::*;
use taskbot_core::config::{ReconfirmPolicy, ResolverConfig};
use taskbot_core::task::TaskDraft;

fn ctx<'a>(
    store: &'a mut Store,
    resolver: &'a Resolver,
    conversation_id: &'a str,
    text: &'a str,
) -> CommandContext<'a> {
    CommandContext {
        store,
        resolver,
        conversation_id,
        sender_id: "u2",
        message_id: "cmd-1",
        text,
        now: Utc::now(),
        utc_offset_hours: 7,
    }
}

fn seeded() -> Store {
    let mut store = Store::in_memory();
    let now = Utc::now();
    for (text, conv) in [("sửa ống", "g1"), ("thay đèn", "g1"), ("lau kính", "g2")] {
        let mut draft = TaskDraft::new(text, "u1");
        draft.conversation_id = Some(conv.into());
        store.create_task(draft, now).unwrap();
    }
    store
}

#[test]
fn test_parse_all_commands() {
    assert_eq!(Command::parse("/tasks"), Some(Command::Tasks));
    assert_eq!(Command::parse("/list"), Some(Command::Tasks));
    assert_eq!(Command::parse("/done 3"), Some(Command::Done));
    assert_eq!(Command::parse("/report"), Some(Command::Report));
    assert_eq!(Command::parse("/help"), Some(Command::Help));
    assert_eq!(Command::parse("/HELP"), Some(Command::Help));
}

#[test]
fn test_parse_commands_with_botname_suffix() {
    assert_eq!(Command::parse("/tasks@oa206bot"), Some(Command::Tasks));
    assert_eq!(Command::parse("/done@oa206bot 2"), Some(Command::Done));
}

#[test]
fn test_parse_unknown_and_plain_text() {
    assert!(Command::parse("/weather").is_none());
    assert!(Command::parse("tasks").is_none());
    assert!(Command::parse("").is_none());
}

#[test]
fn test_tasks_lists_conversation_only() {
    let mut store = seeded();
    let resolver = Resolver::new(ResolverConfig::default(), 7);
    let reply = handle(Command::Tasks, &mut ctx(&mut store, &resolver, "g1", "/tasks"));
    assert!(reply.contains("#1 sửa ống"));
    assert!(reply.contains("#2 thay đèn"));
    assert!(!reply.contains("lau kính"));
}

#[test]
fn test_done_closes_by_id() {
    let mut store = seeded();
    let resolver = Resolver::new(ResolverConfig::default(), 7);
    let reply = handle(Command::Done, &mut ctx(&mut store, &resolver, "g1", "/done #2"));
    assert!(reply.contains("#2"));
    let task = store.get(2).unwrap();
    assert!(task.done);
    assert_eq!(task.completed_by.as_deref(), Some("u2"));
}

#[test]
fn test_done_twice_reports_already_done() {
    let mut store = seeded();
    let resolver = Resolver::new(ResolverConfig::default(), 7);
    handle(Command::Done, &mut ctx(&mut store, &resolver, "g1", "/done 1"));
    let reply = handle(Command::Done, &mut ctx(&mut store, &resolver, "g1", "/done 1"));
    assert_eq!(reply, replies::task_already_done(&store.get(1).unwrap()));
}

#[test]
fn test_done_refresh_policy() {
    let mut store = seeded();
    let config = ResolverConfig {
        reconfirm: ReconfirmPolicy::Refresh,
        ..Default::default()
    };
    let resolver = Resolver::new(config, 7);
    handle(Command::Done, &mut ctx(&mut store, &resolver, "g1", "/done 1"));
    let reply = handle(Command::Done, &mut ctx(&mut store, &resolver, "g1", "/done 1"));
    assert!(reply.starts_with("🔁"));
}

#[test]
fn test_done_usage_and_unknown_id() {
    let mut store = seeded();
    let resolver = Resolver::new(ResolverConfig::default(), 7);
    let reply = handle(Command::Done, &mut ctx(&mut store, &resolver, "g1", "/done"));
    assert_eq!(reply, replies::t("done_usage"));
    let reply = handle(Command::Done, &mut ctx(&mut store, &resolver, "g1", "/done abc"));
    assert_eq!(reply, replies::t("done_usage"));
    let reply = handle(Command::Done, &mut ctx(&mut store, &resolver, "g1", "/done 99"));
    assert_eq!(reply, replies::unknown_task(99));
}

#[test]
fn test_report_counts_conversation() {
    let mut store = seeded();
    let resolver = Resolver::new(ResolverConfig::default(), 7);
    store.complete(1, "u1", Utc::now()).unwrap();
    let reply = handle(Command::Report, &mut ctx(&mut store, &resolver, "g1", "/report"));
    assert!(reply.contains("Tổng: 2 | Đang mở: 1 | Đã xong: 1"));
    assert!(reply.contains("#2 thay đèn"));
    // Report never clears.
    assert_eq!(store.tasks().len(), 3);
}

#[test]
fn test_help_lists_commands() {
    let mut store = Store::in_memory();
    let resolver = Resolver::new(ResolverConfig::default(), 7);
    let reply = handle(Command::Help, &mut ctx(&mut store, &resolver, "g1", "/help"));
    for cmd in ["/tasks", "/done", "/report", "/help"] {
        assert!(reply.contains(cmd));
    }
}
