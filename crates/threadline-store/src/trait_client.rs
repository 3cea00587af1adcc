use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use threadline_types::{AttachmentCandidate, Role, Thread};

use crate::error::Result;

/// Body of `POST /threads`
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewThread {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}

impl NewThread {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            attributes: Map::new(),
        }
    }
}

/// Body of `PATCH /threads/{id}`. Absent fields are left untouched by the server.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ThreadUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,
}

/// A message on its way to the server, attachments still as raw bytes
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub role: Role,
    pub content: String,
    pub attachments: Vec<AttachmentCandidate>,
}

impl OutgoingMessage {
    pub fn user(content: impl Into<String>, attachments: Vec<AttachmentCandidate>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            attachments,
        }
    }
}

/// Remote thread API
///
/// Implementations talk to the conversation server; tests substitute in-process fakes.
#[async_trait]
pub trait ThreadApi: Send + Sync {
    /// `GET /threads`
    async fn list_threads(&self) -> Result<Vec<Thread>>;

    /// `GET /threads/{id}`
    async fn get_thread(&self, thread_id: &str) -> Result<Thread>;

    /// `POST /threads`
    async fn create_thread(&self, request: NewThread) -> Result<Thread>;

    /// `PATCH /threads/{id}`
    async fn update_thread(&self, thread_id: &str, update: ThreadUpdate) -> Result<Thread>;

    /// `DELETE /threads/{id}`. Deleting a thread that is already gone succeeds.
    async fn delete_thread(&self, thread_id: &str) -> Result<()>;

    /// `POST /threads/{id}/messages`, returning the updated thread.
    ///
    /// With `process` set the server also runs the assistant turn before answering.
    async fn send_message(
        &self,
        thread_id: &str,
        message: OutgoingMessage,
        process: bool,
    ) -> Result<Thread>;

    /// `POST /threads/{id}/process`
    async fn process_thread(&self, thread_id: &str) -> Result<Thread>;

    /// Raw bytes of a stored attachment, by storage-relative path
    async fn fetch_attachment(&self, storage_path: &str) -> Result<Vec<u8>>;
}
