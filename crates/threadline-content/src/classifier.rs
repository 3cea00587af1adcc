use serde_json::Value;
use threadline_types::{Content, ContentPart, Message, Role, ToolCall};

use crate::dialect;
use crate::modes::TextMode;

/// Render instruction for one piece of content
#[derive(Debug, Clone, PartialEq)]
pub enum Rendering {
    /// Text shown either rich (formatted) or literal (monospace)
    PlainText { text: String, mode: TextMode },

    /// Parsed structured data, optionally tagged (e.g. with the producing function name)
    Structured { value: Value, label: Option<String> },

    /// Embedded media reference
    Media { url: String },
}

/// Classification of a whole message
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRendering {
    /// Function name for tool results, when it can be resolved
    pub label: Option<String>,
    pub parts: Vec<Rendering>,
}

/// Parse strict JSON first, then fall back to dialect recovery.
pub fn parse_structured(text: &str) -> Option<Value> {
    serde_json::from_str(text)
        .ok()
        .or_else(|| dialect::recover(text))
}

/// Classify a single text value. Never fails: unrecognized input becomes plain text.
pub fn classify_text(text: &str, mode: TextMode) -> Rendering {
    match parse_structured(text) {
        Some(value) => Rendering::Structured { value, label: None },
        None => Rendering::PlainText {
            text: text.to_string(),
            mode,
        },
    }
}

/// Tool output is structured-or-literal, never rich.
fn classify_tool_text(text: &str, label: Option<&str>) -> Rendering {
    match parse_structured(text) {
        Some(value) => Rendering::Structured {
            value,
            label: label.map(str::to_string),
        },
        None => Rendering::PlainText {
            text: text.to_string(),
            mode: TextMode::Literal,
        },
    }
}

/// Classify raw content produced by `role`.
///
/// `label` is only attached for tool-role content.
pub fn classify_content(
    content: &Content,
    role: Role,
    mode: TextMode,
    label: Option<&str>,
) -> Vec<Rendering> {
    let is_tool = role == Role::Tool;

    match content {
        Content::Text(text) if is_tool => vec![classify_tool_text(text, label)],
        Content::Text(text) => vec![classify_text(text, mode)],
        Content::Parts(parts) => {
            let mut out: Vec<Rendering> = parts
                .iter()
                .map(|part| match part {
                    ContentPart::Text { text } if is_tool => classify_tool_text(text, label),
                    ContentPart::Text { text } => classify_text(text, mode),
                    ContentPart::ImageUrl { image_url } => Rendering::Media {
                        url: image_url.url.clone(),
                    },
                })
                .collect();

            // A tool result is never dropped, even when it has nothing in it
            if is_tool && out.is_empty() {
                out.push(Rendering::PlainText {
                    text: String::new(),
                    mode: TextMode::Literal,
                });
            }
            out
        }
    }
}

/// Resolve the function name a tool-role message answers.
///
/// Scans backward from the message's position for the assistant message whose
/// tool calls contain the matching id, then falls back to the message's own name.
pub fn resolve_tool_label(message: &Message, messages: &[Message]) -> Option<String> {
    if message.role != Role::Tool {
        return None;
    }

    let from_call = message.tool_call_id.as_deref().and_then(|call_id| {
        let end = messages
            .iter()
            .position(|m| m.id == message.id)
            .unwrap_or(messages.len());

        messages[..end]
            .iter()
            .rev()
            .filter(|m| m.role == Role::Assistant)
            .find_map(|m| m.tool_call(call_id))
            .map(|call| call.function.name.clone())
    });

    from_call.or_else(|| message.name.clone())
}

/// Classify a message in the context of its thread
pub fn classify_message(message: &Message, messages: &[Message], mode: TextMode) -> MessageRendering {
    let label = resolve_tool_label(message, messages);
    let parts = classify_content(&message.content, message.role, mode, label.as_deref());
    MessageRendering { label, parts }
}

/// Tool call arguments: structured when recoverable, literal otherwise
pub fn classify_tool_arguments(call: &ToolCall) -> Rendering {
    classify_tool_text(&call.function.arguments, Some(&call.function.name))
}
