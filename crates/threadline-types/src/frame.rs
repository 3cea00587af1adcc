use serde::{Deserialize, Serialize};

use crate::thread::Thread;

/// Frame pushed by the server on a thread's channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushFrame {
    /// The server renamed a thread; carries the new snapshot
    TitleUpdate { thread: Thread },

    /// Any frame type this client does not interpret
    #[serde(other)]
    Unknown,
}

impl PushFrame {
    pub fn parse(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}
