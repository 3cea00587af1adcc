use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::de::null_as_default;
use crate::ids::{is_provisional_id, provisional_id};
use crate::message::{Message, Role};
use crate::tool::ToolCall;

/// Title given to threads created before the server names them
pub const DEFAULT_THREAD_TITLE: &str = "New Chat";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,

    #[serde(default)]
    pub title: Option<String>,

    /// Stored in arrival order; display order comes from the sequencer.
    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: Vec<Message>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: Map<String, Value>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Thread {
    pub fn new(id: impl Into<String>, title: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title,
            messages: Vec::new(),
            attributes: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Client-side thread materialized before the server has created it
    pub fn provisional(title: impl Into<String>) -> Self {
        Self::new(provisional_id(), Some(title.into()))
    }

    pub fn is_provisional(&self) -> bool {
        is_provisional_id(&self.id)
    }

    /// A thread is untitled while it has no title or still carries the placeholder.
    pub fn is_untitled(&self, placeholder: &str) -> bool {
        match self.title.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(title) => title == placeholder,
        }
    }

    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title,
            _ => "Untitled Chat",
        }
    }

    pub fn message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Locate the assistant message and tool call with the given call id
    pub fn find_tool_call(&self, call_id: &str) -> Option<(&Message, &ToolCall)> {
        self.messages
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .find_map(|m| m.tool_call(call_id).map(|call| (m, call)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untitled_detection() {
        let mut thread = Thread::new("t1", None);
        assert!(thread.is_untitled(DEFAULT_THREAD_TITLE));

        thread.title = Some(DEFAULT_THREAD_TITLE.to_string());
        assert!(thread.is_untitled(DEFAULT_THREAD_TITLE));

        thread.title = Some("Weather in Lisbon".to_string());
        assert!(!thread.is_untitled(DEFAULT_THREAD_TITLE));
    }

    #[test]
    fn test_provisional_thread() {
        let thread = Thread::provisional(DEFAULT_THREAD_TITLE);
        assert!(thread.is_provisional());
        assert!(thread.messages.is_empty());
    }

    #[test]
    fn test_find_tool_call_ignores_non_assistant_messages() {
        let mut thread = Thread::new("t1", None);
        thread.messages.push(
            Message::new("m1", Role::Assistant, "")
                .with_tool_calls(vec![ToolCall::new("call_1", "search", "{}")]),
        );

        let (message, call) = thread.find_tool_call("call_1").unwrap();
        assert_eq!(message.id, "m1");
        assert_eq!(call.function_name(), "search");
        assert!(thread.find_tool_call("call_2").is_none());
    }
}
