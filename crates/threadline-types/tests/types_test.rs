use serde_json::json;
use threadline_types::{Content, ContentPart, Message, PushFrame, Role, Thread};

#[test]
fn test_content_text_creation() {
    let content = Content::text("Hello, world!");
    assert_eq!(content.as_text(), Some("Hello, world!"));
}

#[test]
fn test_content_parts_single_text() {
    let content = Content::Parts(vec![ContentPart::text("Hello")]);
    assert_eq!(content.as_text(), Some("Hello"));
}

#[test]
fn test_content_parts_with_image_has_no_plain_text() {
    let content = Content::Parts(vec![
        ContentPart::text("Look"),
        ContentPart::image("https://example.com/cat.png"),
    ]);
    assert_eq!(content.as_text(), None);
}

#[test]
fn test_content_part_wire_format() {
    let json = r#"[{"type":"text","text":"hi"},{"type":"image_url","image_url":{"url":"data:image/png;base64,AA=="}}]"#;
    let content: Content = serde_json::from_str(json).unwrap();
    match content {
        Content::Parts(parts) => {
            assert_eq!(parts.len(), 2);
            assert!(matches!(&parts[1], ContentPart::ImageUrl { image_url } if image_url.url.starts_with("data:")));
        }
        Content::Text(_) => panic!("Expected Parts variant"),
    }
}

#[test]
fn test_message_deserialization_from_server() {
    let json = json!({
        "id": "msg-1",
        "role": "assistant",
        "content": null,
        "name": null,
        "tool_call_id": null,
        "tool_calls": [
            {"id": "call_1", "type": "function", "function": {"name": "get_weather", "arguments": "{\"city\":\"NYC\"}"}}
        ],
        "attributes": {},
        "source": null,
        "attachments": [],
        "sequence": 4,
        "timestamp": "2024-05-01T10:00:00Z",
        "metrics": {"model": "gpt-4o", "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}}
    });

    let msg: Message = serde_json::from_value(json).unwrap();
    assert_eq!(msg.role, Role::Assistant);
    assert!(msg.content.is_empty());
    assert_eq!(msg.sequence, Some(4));
    assert_eq!(msg.tool_calls[0].function_name(), "get_weather");
    assert_eq!(msg.metrics.unwrap().usage.unwrap().total_tokens, 15);
}

#[test]
fn test_message_without_sequence() {
    let json = r#"{"id":"m","role":"user","content":"Hi"}"#;
    let msg: Message = serde_json::from_str(json).unwrap();
    assert_eq!(msg.sequence, None);
    assert!(msg.tool_calls.is_empty());
}

#[test]
fn test_thread_deserialization_with_null_collections() {
    let json = r#"{"id":"t1","title":null,"messages":null,"attributes":null,
                   "created_at":"2024-05-01T10:00:00Z","updated_at":"2024-05-01T10:00:00Z"}"#;
    let thread: Thread = serde_json::from_str(json).unwrap();
    assert!(thread.messages.is_empty());
    assert_eq!(thread.display_title(), "Untitled Chat");
}

#[test]
fn test_title_update_frame() {
    let data = r#"{"type":"title_update","thread":{"id":"t1","title":"Trip planning"}}"#;
    match PushFrame::parse(data).unwrap() {
        PushFrame::TitleUpdate { thread } => {
            assert_eq!(thread.id, "t1");
            assert_eq!(thread.title.as_deref(), Some("Trip planning"));
        }
        PushFrame::Unknown => panic!("Expected TitleUpdate variant"),
    }
}

#[test]
fn test_unknown_frame_type_is_not_an_error() {
    let frame = PushFrame::parse(r#"{"type":"new_message","thread_id":"t1"}"#).unwrap();
    assert_eq!(frame, PushFrame::Unknown);
}
