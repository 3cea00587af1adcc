use serde_json::json;
use threadline_content::{
    classify_message, classify_text, parse_structured, resolve_tool_label, Rendering, TextMode,
};
use threadline_types::{Attachment, Message, Role, ToolCall};

#[test]
fn test_dialect_dictionary_is_structured() {
    let rendering = classify_text("{'a': True, 'b': None}", TextMode::Rich);
    assert_eq!(
        rendering,
        Rendering::Structured { value: json!({"a": true, "b": null}), label: None }
    );
}

#[test]
fn test_malformed_text_stays_plain() {
    let text = "{'a': True, 'b':";
    assert_eq!(parse_structured(text), None);
    assert_eq!(
        classify_text(text, TextMode::Rich),
        Rendering::PlainText { text: text.to_string(), mode: TextMode::Rich }
    );
}

#[test]
fn test_bare_literals_are_structured() {
    assert_eq!(parse_structured("42"), Some(json!(42)));
    assert_eq!(parse_structured("true"), Some(json!(true)));
    assert_eq!(parse_structured("hello there"), None);
}

fn weather_thread() -> Vec<Message> {
    vec![
        Message::new("m1", Role::User, "weather?").with_sequence(1),
        Message::new("m2", Role::Assistant, "")
            .with_sequence(2)
            .with_tool_calls(vec![ToolCall::new("call_1", "get_weather", r#"{"city":"Lisbon"}"#)]),
        Message::new("m3", Role::Tool, "{'temp': 21, 'sunny': True}")
            .with_sequence(3)
            .with_tool_call_id("call_1"),
    ]
}

#[test]
fn test_tool_result_is_labelled_with_function_name() {
    let messages = weather_thread();
    let rendering = classify_message(&messages[2], &messages, TextMode::Rich);

    assert_eq!(rendering.label.as_deref(), Some("get_weather"));
    assert_eq!(
        rendering.parts,
        vec![Rendering::Structured {
            value: json!({"temp": 21, "sunny": true}),
            label: Some("get_weather".to_string()),
        }]
    );
}

#[test]
fn test_tool_label_falls_back_to_name() {
    let mut orphan = Message::new("t1", Role::Tool, "done").with_tool_call_id("missing");
    orphan.name = Some("cleanup".to_string());
    let messages = vec![orphan.clone()];

    assert_eq!(resolve_tool_label(&orphan, &messages).as_deref(), Some("cleanup"));
}

#[test]
fn test_tool_label_ignores_later_assistant_messages() {
    let mut messages = weather_thread();
    messages.push(
        Message::new("m4", Role::Assistant, "")
            .with_tool_calls(vec![ToolCall::new("call_9", "other", "{}")]),
    );
    let early = Message::new("t0", Role::Tool, "x").with_tool_call_id("call_9");
    messages.insert(0, early.clone());

    assert_eq!(resolve_tool_label(&early, &messages), None);
}

#[test]
fn test_non_tool_messages_have_no_label() {
    let messages = weather_thread();
    let rendering = classify_message(&messages[0], &messages, TextMode::Literal);
    assert_eq!(rendering.label, None);
    assert_eq!(
        rendering.parts,
        vec![Rendering::PlainText { text: "weather?".to_string(), mode: TextMode::Literal }]
    );
}

#[test]
fn test_tool_message_with_attachment_still_classified() {
    let msg = Message::new("t2", Role::Tool, "")
        .with_attachments(vec![Attachment::inline("chart.png", "image/png", b"png")]);
    let rendering = classify_message(&msg, std::slice::from_ref(&msg), TextMode::Rich);
    assert_eq!(rendering.parts.len(), 1);
}
