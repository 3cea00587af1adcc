use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Thread {0} has not been confirmed by the server yet")]
    ThreadPending(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// 404 from the server, or a thread the client knows is gone
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ThreadNotFound(_) | Self::Status { status: 404, .. })
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
