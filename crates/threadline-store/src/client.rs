use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use threadline_types::{Role, Thread};

use crate::builder::HttpThreadApiBuilder;
use crate::error::{ClientError, Result};
use crate::trait_client::{NewThread, OutgoingMessage, ThreadApi, ThreadUpdate};

/// JSON part of a message send (the whole body when there are no attachments)
#[derive(Debug, Serialize)]
struct MessagePayload<'a> {
    role: Role,
    content: &'a str,
    process: bool,
}

/// Thread API over HTTP (reqwest)
pub struct HttpThreadApi {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpThreadApi {
    /// Client with default settings against `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::builder().base_url(base_url).build()
    }

    pub fn builder() -> HttpThreadApiBuilder {
        HttpThreadApiBuilder::new()
    }

    pub(crate) fn from_parts(http_client: reqwest::Client, base_url: String) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Map non-success statuses to errors; a 404 on a thread route becomes `ThreadNotFound`.
    async fn check(response: Response, thread_id: Option<&str>) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read response body".to_string());

        tracing::debug!(status = status.as_u16(), body = %body, "Thread API request failed");

        match thread_id {
            Some(id) if status == StatusCode::NOT_FOUND => Err(ClientError::ThreadNotFound(id.to_string())),
            _ => Err(ClientError::Status {
                status: status.as_u16(),
                body,
            }),
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response, thread_id: Option<&str>) -> Result<T> {
        let response = Self::check(response, thread_id).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn message_form(message: OutgoingMessage, process: bool) -> Result<Form> {
        let payload = serde_json::to_string(&MessagePayload {
            role: message.role,
            content: &message.content,
            process,
        })?;

        let mut form = Form::new().part("message", Part::text(payload).mime_str("application/json")?);

        for candidate in message.attachments {
            let mut part = Part::bytes(candidate.data).file_name(candidate.filename);
            if !candidate.mime_type.is_empty() {
                part = part.mime_str(&candidate.mime_type)?;
            }
            form = form.part("files", part);
        }

        Ok(form)
    }
}

#[async_trait]
impl ThreadApi for HttpThreadApi {
    async fn list_threads(&self) -> Result<Vec<Thread>> {
        let response = self.http_client.get(self.url("threads")).send().await?;
        Self::read_json(response, None).await
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Thread> {
        let response = self
            .http_client
            .get(self.url(&format!("threads/{}", thread_id)))
            .send()
            .await?;
        Self::read_json(response, Some(thread_id)).await
    }

    async fn create_thread(&self, request: NewThread) -> Result<Thread> {
        let response = self
            .http_client
            .post(self.url("threads"))
            .json(&request)
            .send()
            .await?;
        Self::read_json(response, None).await
    }

    async fn update_thread(&self, thread_id: &str, update: ThreadUpdate) -> Result<Thread> {
        let response = self
            .http_client
            .patch(self.url(&format!("threads/{}", thread_id)))
            .json(&update)
            .send()
            .await?;
        Self::read_json(response, Some(thread_id)).await
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let response = self
            .http_client
            .delete(self.url(&format!("threads/{}", thread_id)))
            .send()
            .await?;

        match Self::check(response, Some(thread_id)).await {
            Ok(_) => Ok(()),
            Err(ClientError::ThreadNotFound(_)) => {
                tracing::debug!(thread_id = %thread_id, "Thread already deleted");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn send_message(
        &self,
        thread_id: &str,
        message: OutgoingMessage,
        process: bool,
    ) -> Result<Thread> {
        let request = self
            .http_client
            .post(self.url(&format!("threads/{}/messages", thread_id)));

        let request = if message.attachments.is_empty() {
            request.json(&MessagePayload {
                role: message.role,
                content: &message.content,
                process,
            })
        } else {
            request.multipart(Self::message_form(message, process)?)
        };

        let response = request.send().await?;
        Self::read_json(response, Some(thread_id)).await
    }

    async fn process_thread(&self, thread_id: &str) -> Result<Thread> {
        let response = self
            .http_client
            .post(self.url(&format!("threads/{}/process", thread_id)))
            .send()
            .await?;
        Self::read_json(response, Some(thread_id)).await
    }

    async fn fetch_attachment(&self, storage_path: &str) -> Result<Vec<u8>> {
        let response = self
            .http_client
            .get(self.url(&format!("files/{}", storage_path.trim_start_matches('/'))))
            .send()
            .await?;
        let response = Self::check(response, None).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let api = HttpThreadApi::new("http://localhost:8000/").unwrap();
        assert_eq!(api.base_url(), "http://localhost:8000");
        assert_eq!(api.url("threads"), "http://localhost:8000/threads");
        assert_eq!(api.url("/files/a.png"), "http://localhost:8000/files/a.png");
    }

    #[test]
    fn test_payload_shape() {
        let payload = MessagePayload {
            role: Role::User,
            content: "hi",
            process: true,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value, serde_json::json!({"role": "user", "content": "hi", "process": true}));
    }
}
