use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};

use crate::client::HttpThreadApi;
use crate::error::{ClientError, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

pub struct HttpThreadApiBuilder {
    base_url: String,
    request_timeout: Option<Duration>,
}

impl HttpThreadApiBuilder {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: None,
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Per-request timeout. Unset means requests are bounded only by the transport.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<HttpThreadApi> {
        let parsed = reqwest::Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl(format!(
                "{}: unsupported scheme {}",
                self.base_url,
                parsed.scheme()
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        Ok(HttpThreadApi::from_parts(http_client, self.base_url))
    }
}

impl Default for HttpThreadApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}
