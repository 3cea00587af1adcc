use chrono::Utc;
use threadline_store::{sequence, ConversationStore, ToolResult};
use threadline_types::{Attachment, Message, Role, Thread, ToolCall};

fn ids(messages: &[Message]) -> Vec<String> {
    sequence(messages).into_iter().map(|e| e.message.id).collect()
}

#[test]
fn test_sequence_order_with_unsequenced_last() {
    let messages = vec![
        Message::new("three", Role::User, "c").with_sequence(3),
        Message::new("one", Role::User, "a").with_sequence(1),
        Message::new("pending", Role::User, "d"),
        Message::new("two", Role::Assistant, "b").with_sequence(2),
    ];
    assert_eq!(ids(&messages), vec!["one", "two", "three", "pending"]);
}

fn tool_thread(result: Message) -> Vec<Message> {
    vec![
        Message::new("u1", Role::User, "run it").with_sequence(1),
        Message::new("a1", Role::Assistant, "")
            .with_sequence(2)
            .with_tool_calls(vec![ToolCall::new("x", "render_chart", "{}")]),
        result.with_sequence(3),
    ]
}

#[test]
fn test_answered_tool_result_is_inlined() {
    let messages = tool_thread(Message::new("t1", Role::Tool, "{'ok': True}").with_tool_call_id("x"));
    let entries = sequence(&messages);

    assert_eq!(
        entries.iter().map(|e| e.message.id.as_str()).collect::<Vec<_>>(),
        vec!["u1", "a1"]
    );
    let exchange = &entries[1].tool_exchanges[0];
    assert_eq!(exchange.call.id, "x");
    assert!(matches!(&exchange.result, ToolResult::Inline(m) if m.id == "t1"));
}

#[test]
fn test_tool_result_with_attachment_is_shown() {
    let result = Message::new("t1", Role::Tool, "chart ready")
        .with_tool_call_id("x")
        .with_attachments(vec![Attachment::inline("chart.png", "image/png", b"png")]);
    let entries = sequence(&tool_thread(result));

    assert_eq!(
        entries.iter().map(|e| e.message.id.as_str()).collect::<Vec<_>>(),
        vec!["u1", "a1", "t1"]
    );
    assert_eq!(
        entries[1].tool_exchanges[0].result,
        ToolResult::Shown { message_id: "t1".to_string() }
    );
}

#[test]
fn test_replace_threads_keeps_in_flight_state() {
    let store = ConversationStore::new();
    let provisional = Thread::provisional("New Chat");
    let provisional_id = provisional.id.clone();
    store.insert_and_select(provisional);
    store.upsert_thread(Thread::new("t1", Some("Server".to_string())));
    let pending = Message::provisional_user("in flight", Vec::new());
    let pending_id = pending.id.clone();
    store.append_message("t1", pending);

    let mut fresh = Thread::new("t1", Some("Server".to_string()));
    fresh.messages.push(Message::new("m1", Role::User, "hi").with_sequence(1));
    store.replace_threads(vec![fresh, Thread::new("t2", None)]);

    let snap = store.snapshot();
    assert_eq!(snap.threads.len(), 3);
    assert!(snap.thread(&provisional_id).is_some());
    let t1 = snap.thread("t1").unwrap();
    assert_eq!(t1.messages.len(), 2);
    assert!(t1.message(&pending_id).is_some());
    assert_eq!(snap.selected.as_deref(), Some(provisional_id.as_str()));
}

#[test]
fn test_confirm_send_swaps_identity_atomically() {
    let store = ConversationStore::new();
    let provisional = Thread::provisional("New Chat");
    let local_id = provisional.id.clone();
    store.insert_and_select(provisional);
    let msg = Message::provisional_user("hello", Vec::new());
    let attempt = vec![msg.id.clone()];
    store.append_message(&local_id, msg);
    store.begin_processing(&local_id);

    let mut rx = store.subscribe();
    let mut confirmed = Thread::new("srv-1", Some("New Chat".to_string()));
    confirmed.messages.push(Message::new("m1", Role::User, "hello").with_sequence(1));
    assert!(store.confirm_send(&local_id, &attempt, confirmed));

    // Exactly one publish carries the whole swap
    assert!(rx.has_changed().unwrap());
    let snap = rx.borrow_and_update().clone();
    assert_eq!(snap.threads.len(), 1);
    assert_eq!(snap.threads[0].id, "srv-1");
    assert_eq!(snap.threads[0].messages.len(), 1);
    assert_eq!(snap.selected.as_deref(), Some("srv-1"));
    assert!(snap.is_processing("srv-1"));
    assert!(!snap.is_processing(&local_id));
}

#[test]
fn test_confirm_send_for_removed_thread_is_dropped() {
    let store = ConversationStore::new();
    let provisional = Thread::provisional("New Chat");
    let local_id = provisional.id.clone();
    store.insert_and_select(provisional);
    store.remove_thread(&local_id);

    let rx = store.subscribe();
    let applied = store.confirm_send(&local_id, &[], Thread::new("srv-1", None));

    assert!(!applied);
    assert!(!rx.has_changed().unwrap());
    assert!(store.snapshot().threads.is_empty());
}

#[test]
fn test_title_update_requires_selection() {
    let store = ConversationStore::new();
    store.upsert_thread(Thread::new("t1", None));

    assert!(!store.apply_title_update("t1", Some("Ignored".to_string()), Utc::now()));
    assert_eq!(store.snapshot().thread("t1").unwrap().title, None);

    store.select_thread(Some("t1".to_string()));
    assert!(store.apply_title_update("t1", Some("Weekend plans".to_string()), Utc::now()));
    assert_eq!(
        store.snapshot().thread("t1").unwrap().title.as_deref(),
        Some("Weekend plans")
    );
}

#[test]
fn test_materialize_unknown_thread_is_none() {
    let store = ConversationStore::new();
    store.select_thread(Some("not-loaded".to_string()));
    assert!(store.materialize("not-loaded").is_none());
}
