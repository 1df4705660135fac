use super::*;

#[test]
fn test_private_text_event() {
    let body = r#"{
        "app_id": "42",
        "event_name": "user_send_text",
        "timestamp": "1760745600000",
        "sender": { "id": "u1", "display_name": "Minh" },
        "recipient": { "id": "oa" },
        "message": { "msg_id": "m1", "text": "Sửa đường ống A" }
    }"#;
    let event = parse_webhook(body).unwrap();
    assert_eq!(event.kind, EventKind::Text);
    assert_eq!(event.sender_id, "u1");
    assert_eq!(event.sender_name.as_deref(), Some("Minh"));
    assert_eq!(event.conversation_id, "u1");
    assert_eq!(event.message_id, "m1");
    assert_eq!(event.text, "Sửa đường ống A");
    assert_eq!(event.timestamp.timestamp_millis(), 1_760_745_600_000);
    assert!(event.quote.is_none());
}

#[test]
fn test_group_event_with_flat_quote() {
    let body = r#"{
        "event_name": "user_send_group_text",
        "timestamp": 1760745600000,
        "group_id": "g1",
        "sender": { "id": "u2" },
        "recipient": { "id": "oa" },
        "message": {
            "msg_id": "m2",
            "text": "xong",
            "quote_msg_id": "m100",
            "quote_text": "thay bóng đèn",
            "quote_sender_id": "u1"
        }
    }"#;
    let event = parse_webhook(body).unwrap();
    assert_eq!(event.conversation_id, "g1");
    let quote = event.quote.unwrap();
    assert_eq!(quote.message_id.as_deref(), Some("m100"));
    assert_eq!(quote.text.as_deref(), Some("thay bóng đèn"));
    assert_eq!(quote.sender_id.as_deref(), Some("u1"));
}

#[test]
fn test_nested_quote_and_group_recipient() {
    let body = r#"{
        "event_name": "user_send_group_text",
        "sender": { "id": "u2" },
        "recipient": { "id": "g7" },
        "message": {
            "msg_id": "m3",
            "text": "done",
            "quote": { "message_id": "m99", "content": "kiểm tra van" }
        }
    }"#;
    let event = parse_webhook(body).unwrap();
    assert_eq!(event.conversation_id, "g7");
    let quote = event.quote.unwrap();
    assert_eq!(quote.usable_id(), Some("m99"));
    assert_eq!(quote.usable_text(), Some("kiểm tra van"));
    assert!(quote.sender_id.is_none());
}

#[test]
fn test_group_id_inside_message() {
    let body = r#"{
        "event_name": "user_send_text",
        "sender": { "id": "u1" },
        "message": { "msg_id": "m4", "text": "hi", "group_id": "g2" }
    }"#;
    assert_eq!(parse_webhook(body).unwrap().conversation_id, "g2");
}

#[test]
fn test_unknown_event_is_other() {
    let body = r#"{
        "event_name": "user_send_sticker",
        "sender": { "id": "u1" },
        "message": { "msg_id": "m5" }
    }"#;
    let event = parse_webhook(body).unwrap();
    assert_eq!(event.kind, EventKind::Other);
    assert!(event.text.is_empty());
}

#[test]
fn test_missing_timestamp_and_msg_id() {
    let before = Utc::now();
    let body = r#"{
        "event_name": "user_send_text",
        "sender": { "id": "u1" },
        "message": { "text": "hello" }
    }"#;
    let event = parse_webhook(body).unwrap();
    assert!(event.timestamp >= before);
    assert!(event.message_id.starts_with("u1-"));
}

#[test]
fn test_empty_quote_is_dropped() {
    let body = r#"{
        "event_name": "user_send_text",
        "sender": { "id": "u1" },
        "message": { "msg_id": "m6", "text": "ok", "quote_msg_id": "" }
    }"#;
    assert!(parse_webhook(body).unwrap().quote.is_none());
}

#[test]
fn test_malformed_payloads() {
    assert!(matches!(
        parse_webhook("{ not json"),
        Err(TaskbotError::Channel(_))
    ));
    let no_sender = r#"{ "event_name": "user_send_text", "message": { "text": "x" } }"#;
    assert!(matches!(
        parse_webhook(no_sender),
        Err(TaskbotError::Channel(_))
    ));
}
