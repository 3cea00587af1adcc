//! Display ordering for a thread's messages.

use threadline_types::{Message, Role, Thread, ToolCall};

/// What a tool call's answer looks like in the rendered thread
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    /// No tool-role message answers this call yet
    Pending,
    /// Answer rendered inline with the call
    Inline(Message),
    /// Answer carries attachments and is displayed as its own entry
    Shown { message_id: String },
}

/// A tool call paired with its answer
#[derive(Debug, Clone, PartialEq)]
pub struct ToolExchange {
    pub call: ToolCall,
    pub result: ToolResult,
}

/// One directly displayed message
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayEntry {
    pub message: Message,
    /// Populated for assistant messages that made tool calls
    pub tool_exchanges: Vec<ToolExchange>,
}

/// Render-ready view of a thread
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadView {
    pub thread_id: String,
    pub title: String,
    pub entries: Vec<DisplayEntry>,
}

/// Messages in display order.
///
/// Sequenced messages ascend by sequence; unsequenced ones follow in insertion order.
pub fn display_order(messages: &[Message]) -> Vec<&Message> {
    let mut ordered: Vec<&Message> = messages.iter().collect();
    // Stable sort keeps insertion order among equal keys
    ordered.sort_by_key(|m| (m.sequence.is_none(), m.sequence));
    ordered
}

/// Whether a tool-role message is rendered inline with the call it answers
/// rather than as its own entry.
///
/// Only an answer that comes after the calling assistant message in display order counts.
pub fn is_inline_tool_result(message: &Message, messages: &[Message]) -> bool {
    let ordered = display_order(messages);
    match ordered.iter().position(|m| m.id == message.id) {
        Some(pos) => answers_earlier_call(message, &ordered[..pos]),
        None => false,
    }
}

fn answers_earlier_call(message: &Message, earlier: &[&Message]) -> bool {
    if message.role != Role::Tool || message.has_attachments() {
        return false;
    }
    let Some(call_id) = message.tool_call_id.as_deref() else {
        return false;
    };
    earlier
        .iter()
        .any(|m| m.role == Role::Assistant && m.tool_call(call_id).is_some())
}

fn answer_for<'a>(call: &ToolCall, later: &[&'a Message]) -> Option<&'a Message> {
    later
        .iter()
        .copied()
        .find(|m| m.role == Role::Tool && m.tool_call_id.as_deref() == Some(call.id.as_str()))
}

/// Ordered, filtered display entries with tool exchanges attached
pub fn sequence(messages: &[Message]) -> Vec<DisplayEntry> {
    let ordered = display_order(messages);

    ordered
        .iter()
        .enumerate()
        .filter(|(pos, m)| !answers_earlier_call(m, &ordered[..*pos]))
        .map(|(pos, message)| {
            let tool_exchanges = if message.role == Role::Assistant {
                message
                    .tool_calls
                    .iter()
                    .map(|call| {
                        let result = match answer_for(call, &ordered[pos + 1..]) {
                            None => ToolResult::Pending,
                            Some(answer) if answer.has_attachments() => ToolResult::Shown {
                                message_id: answer.id.clone(),
                            },
                            Some(answer) => ToolResult::Inline(answer.clone()),
                        };
                        ToolExchange {
                            call: call.clone(),
                            result,
                        }
                    })
                    .collect()
            } else {
                Vec::new()
            };

            DisplayEntry {
                message: (*message).clone(),
                tool_exchanges,
            }
        })
        .collect()
}

/// Sequence a whole thread
pub fn thread_view(thread: &Thread) -> ThreadView {
    ThreadView {
        thread_id: thread.id.clone(),
        title: thread.display_title().to_string(),
        entries: sequence(&thread.messages),
    }
}
