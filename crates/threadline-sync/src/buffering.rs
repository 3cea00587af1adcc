use std::collections::VecDeque;

use threadline_store::{ClientError, Result};

/// Byte buffer that hands out complete lines as chunks arrive
pub struct CircularLineBuffer {
    buffer: VecDeque<u8>,
}

impl CircularLineBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Next complete line without its terminator (`\n` or `\r\n`).
    /// Returns None until a newline has arrived.
    pub fn next_line(&mut self) -> Option<Result<String>> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();

        match String::from_utf8(line_bytes) {
            Ok(line) => Some(Ok(line.trim_end_matches(['\n', '\r']).to_string())),
            Err(e) => Some(Err(ClientError::Channel(format!("Invalid UTF-8 in push frame: {}", e)))),
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Collects `data:` lines into complete server-sent events.
///
/// An event is dispatched on a blank line; multi-line data is joined with `\n`.
/// Comments and the `event`, `id` and `retry` fields are ignored.
#[derive(Debug, Default)]
pub struct SseEventAssembler {
    data: Vec<String>,
}

impl SseEventAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line; returns the event payload when the line completes an event
    pub fn push_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.flush();
        }
        if let Some(value) = line.strip_prefix("data:") {
            self.data.push(value.strip_prefix(' ').unwrap_or(value).to_string());
        }
        None
    }

    /// Dispatch whatever is pending (end of stream)
    pub fn flush(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.data).join("\n"))
    }
}
