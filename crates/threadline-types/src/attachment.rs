use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// File carried by a message.
///
/// The wire format may populate more than one content location; `location()`
/// resolves them with the priority storage reference > processing result > inline bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    /// Inline bytes, base64 encoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Server storage reference (storage-relative path)
    #[serde(default, alias = "url", skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,

    /// Processing result descriptor (extracted text, overview, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_content: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttachmentLocation<'a> {
    Stored(&'a str),
    Processed(&'a Value),
    Inline(&'a str),
}

impl Attachment {
    /// Build an attachment whose bytes travel inline
    pub fn inline(filename: impl Into<String>, mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            filename: filename.into(),
            mime_type: Some(mime_type.into()),
            content: Some(STANDARD.encode(bytes)),
            storage_path: None,
            processed_content: None,
        }
    }

    /// The only mutation an attachment ever receives: its storage reference after upload.
    pub fn with_storage_path(mut self, path: impl Into<String>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    /// Where the bytes live
    pub fn location(&self) -> Option<AttachmentLocation<'_>> {
        if let Some(path) = self.storage_path.as_deref().filter(|p| !p.is_empty()) {
            return Some(AttachmentLocation::Stored(path));
        }
        if let Some(processed) = self.processed_content.as_ref().filter(|v| !v.is_null()) {
            return Some(AttachmentLocation::Processed(processed));
        }
        self.content
            .as_deref()
            .filter(|c| !c.is_empty())
            .map(AttachmentLocation::Inline)
    }

    /// Decode inline bytes, if this attachment has any
    pub fn decode_inline(&self) -> Option<Result<Vec<u8>, base64::DecodeError>> {
        self.content.as_deref().map(|data| STANDARD.decode(data))
    }
}

/// A file the user picked, before validation and upload
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentCandidate {
    pub filename: String,
    /// Declared MIME type (may be empty when the platform could not tell)
    pub mime_type: String,
    /// Declared size in bytes
    pub size: u64,
    pub data: Vec<u8>,
}

impl AttachmentCandidate {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            size: data.len() as u64,
            data,
        }
    }

    /// Provisional attachment shown on the optimistic message
    pub fn to_attachment(&self) -> Attachment {
        Attachment::inline(&self.filename, &self.mime_type, &self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_location_priority() {
        let mut attachment = Attachment::inline("a.txt", "text/plain", b"hello");
        assert!(matches!(attachment.location(), Some(AttachmentLocation::Inline(_))));

        attachment.processed_content = Some(json!({"type": "text", "text": "hello"}));
        assert!(matches!(attachment.location(), Some(AttachmentLocation::Processed(_))));

        let attachment = attachment.with_storage_path("files/a.txt");
        assert_eq!(attachment.location(), Some(AttachmentLocation::Stored("files/a.txt")));
    }

    #[test]
    fn test_inline_decode() {
        let attachment = Attachment::inline("a.bin", "application/zip", &[1, 2, 3]);
        assert_eq!(attachment.decode_inline().unwrap().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_no_location() {
        let attachment = Attachment {
            filename: "ghost.pdf".to_string(),
            mime_type: None,
            content: None,
            storage_path: None,
            processed_content: None,
        };
        assert!(attachment.location().is_none());
    }
}
