use std::fmt::Display;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::header::{HeaderValue, ACCEPT, CACHE_CONTROL};
use threadline_store::{ClientError, Result};

use crate::buffering::{CircularLineBuffer, SseEventAssembler};

/// Raw text frames from a push channel. The stream ending means the channel closed.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

pub const DEFAULT_EVENTS_PATH: &str = "/threads/{id}/events";

/// Opens the thread-scoped push channel
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Establish the channel for `thread_id`. Returning `Ok` means the channel is open.
    async fn connect(&self, thread_id: &str) -> Result<FrameStream>;
}

/// Push channel over server-sent events
pub struct SseTransport {
    http_client: reqwest::Client,
    base_url: String,
    events_path: String,
}

impl SseTransport {
    /// `events_path` is a template; `{id}` is replaced with the thread id.
    pub fn new(base_url: impl Into<String>, events_path: impl Into<String>) -> Result<Self> {
        Self::with_connect_timeout(base_url, events_path, None)
    }

    pub fn with_connect_timeout(
        base_url: impl Into<String>,
        events_path: impl Into<String>,
        connect_timeout: Option<Duration>,
    ) -> Result<Self> {
        let base_url = base_url.into();
        reqwest::Url::parse(&base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        // No overall timeout: the stream is long-lived
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        Ok(Self {
            http_client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            events_path: events_path.into(),
        })
    }

    pub fn url(&self, thread_id: &str) -> String {
        let path = self.events_path.replace("{id}", thread_id);
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl PushTransport for SseTransport {
    async fn connect(&self, thread_id: &str) -> Result<FrameStream> {
        let response = self
            .http_client
            .get(self.url(thread_id))
            .header(ACCEPT, HeaderValue::from_static("text/event-stream"))
            .header(CACHE_CONTROL, HeaderValue::from_static("no-cache"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(sse_frames(response.bytes_stream()))
    }
}

/// Turn a byte stream into server-sent event payloads
pub fn sse_frames<S, B, E>(bytes: S) -> FrameStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut chunks = Box::pin(bytes);
        let mut buffer = CircularLineBuffer::with_capacity(4096);
        let mut events = SseEventAssembler::new();

        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(bytes) => {
                    buffer.extend(bytes.as_ref());

                    while let Some(line) = buffer.next_line() {
                        match line {
                            Ok(line) => {
                                if let Some(payload) = events.push_line(&line) {
                                    yield Ok(payload);
                                }
                            }
                            Err(e) => yield Err(e),
                        }
                    }
                }
                Err(e) => {
                    yield Err(ClientError::Channel(format!("Stream error: {}", e)));
                    return;
                }
            }
        }

        if let Some(payload) = events.flush() {
            yield Ok(payload);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_template() {
        let transport = SseTransport::new("http://localhost:8000/", DEFAULT_EVENTS_PATH).unwrap();
        assert_eq!(transport.url("t1"), "http://localhost:8000/threads/t1/events");
    }

    #[tokio::test]
    async fn test_frames_split_across_chunks() {
        let chunks: Vec<std::result::Result<&'static [u8], String>> = vec![
            Ok(&b"data: {\"type\":\"ti"[..]),
            Ok(&b"tle_update\"}\n\ndata: second\n"[..]),
        ];
        let frames: Vec<_> = sse_frames(futures::stream::iter(chunks)).collect().await;

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].as_ref().unwrap(), "{\"type\":\"title_update\"}");
        assert_eq!(frames[1].as_ref().unwrap(), "second");
    }

    #[tokio::test]
    async fn test_stream_error_ends_frames() {
        let chunks: Vec<std::result::Result<&'static [u8], String>> =
            vec![Ok(&b"data: a\n\n"[..]), Err("reset".to_string()), Ok(&b"data: b\n\n"[..])];
        let frames: Vec<_> = sse_frames(futures::stream::iter(chunks)).collect().await;

        assert_eq!(frames.len(), 2);
        assert!(matches!(frames[1], Err(ClientError::Channel(_))));
    }
}
