use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::attachment::Attachment;
use crate::content::Content;
use crate::de::null_as_default;
use crate::ids::{is_provisional_id, provisional_id};
use crate::tool::ToolCall;

/// Closed set of message producers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,

    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Content,

    /// Tool identifier (tool-role messages)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Links a tool-role message to the call it answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tool_calls: Vec<ToolCall>,

    /// Server-assigned position within the thread. Absent until acknowledged.
    #[serde(default)]
    pub sequence: Option<u64>,

    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: Map<String, Value>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub attachments: Vec<Attachment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
}

/// Observational data reported by the server; never used for ordering or identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<Timing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    /// Milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl Message {
    /// Create an acknowledged message with the given id
    pub fn new(id: impl Into<String>, role: Role, content: impl Into<Content>) -> Self {
        Self {
            id: id.into(),
            role,
            content: content.into(),
            name: None,
            tool_call_id: None,
            tool_calls: Vec::new(),
            sequence: None,
            timestamp: Utc::now(),
            attributes: Map::new(),
            attachments: Vec::new(),
            metrics: None,
        }
    }

    /// Create a client-side user message that has not reached the server yet
    pub fn provisional_user(content: impl Into<Content>, attachments: Vec<Attachment>) -> Self {
        Self {
            attachments,
            ..Self::new(provisional_id(), Role::User, content)
        }
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = Some(sequence);
        self
    }

    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCall>) -> Self {
        self.tool_calls = tool_calls;
        self
    }

    pub fn with_tool_call_id(mut self, tool_call_id: impl Into<String>) -> Self {
        self.tool_call_id = Some(tool_call_id.into());
        self
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn is_provisional(&self) -> bool {
        is_provisional_id(&self.id)
    }

    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }

    /// Find one of this message's tool calls by id
    pub fn tool_call(&self, call_id: &str) -> Option<&ToolCall> {
        self.tool_calls.iter().find(|call| call.id == call_id)
    }
}
