use serde::{Deserialize, Serialize};
use thiserror::Error;
use threadline_types::AttachmentCandidate;

/// Per-file size ceiling (50 MiB)
pub const MAX_ATTACHMENT_BYTES: u64 = 50 * 1024 * 1024;

pub const DEFAULT_ALLOWED_MIME_TYPES: &[&str] = &[
    // Documents
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
    "text/csv",
    "application/json",
    // Images
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    // Archives
    "application/zip",
    "application/x-tar",
    "application/gzip",
    // Audio
    "audio/mpeg",
    "audio/mp3",
    "audio/mp4",
    "audio/wav",
    "audio/x-wav",
    "audio/ogg",
    "audio/webm",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentRejection {
    #[error("File {filename} is too large. Maximum size is {}MB", .limit / (1024 * 1024))]
    TooLarge { filename: String, size: u64, limit: u64 },

    #[error("File type {} is not supported for {filename}", display_type(.mime_type))]
    UnsupportedType { filename: String, mime_type: String },
}

fn display_type(mime_type: &str) -> &str {
    if mime_type.trim().is_empty() {
        "unknown"
    } else {
        mime_type
    }
}

impl AttachmentRejection {
    pub fn filename(&self) -> &str {
        match self {
            Self::TooLarge { filename, .. } | Self::UnsupportedType { filename, .. } => filename,
        }
    }
}

/// Outcome of validating several candidates at once. Partial acceptance, never all-or-nothing.
#[derive(Debug, Clone, Default)]
pub struct BatchValidation {
    pub accepted: Vec<AttachmentCandidate>,
    pub rejected: Vec<AttachmentRejection>,
}

/// Size ceiling and MIME allow-list applied before anything leaves the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentPolicy {
    pub max_size_bytes: u64,
    pub allowed_mime_types: Vec<String>,
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self {
            max_size_bytes: MAX_ATTACHMENT_BYTES,
            allowed_mime_types: DEFAULT_ALLOWED_MIME_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

impl AttachmentPolicy {
    /// Whether a declared MIME type is on the allow-list.
    ///
    /// Comparison ignores case and parameters such as `; charset=utf-8`.
    pub fn allows_type(&self, mime_type: &str) -> bool {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        if essence.is_empty() {
            return false;
        }
        self.allowed_mime_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(essence))
    }

    /// Size is checked before type, so an oversized file is rejected whatever it claims to be.
    pub fn validate(&self, candidate: &AttachmentCandidate) -> Result<(), AttachmentRejection> {
        if candidate.size > self.max_size_bytes {
            return Err(AttachmentRejection::TooLarge {
                filename: candidate.filename.clone(),
                size: candidate.size,
                limit: self.max_size_bytes,
            });
        }
        if !self.allows_type(&candidate.mime_type) {
            return Err(AttachmentRejection::UnsupportedType {
                filename: candidate.filename.clone(),
                mime_type: candidate.mime_type.clone(),
            });
        }
        Ok(())
    }

    pub fn validate_batch(
        &self,
        candidates: impl IntoIterator<Item = AttachmentCandidate>,
    ) -> BatchValidation {
        let mut batch = BatchValidation::default();
        for candidate in candidates {
            match self.validate(&candidate) {
                Ok(()) => batch.accepted.push(candidate),
                Err(rejection) => {
                    tracing::debug!(filename = %candidate.filename, reason = %rejection, "Attachment rejected");
                    batch.rejected.push(rejection);
                }
            }
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_parameters_and_case_ignored() {
        let policy = AttachmentPolicy::default();
        assert!(policy.allows_type("text/plain; charset=utf-8"));
        assert!(policy.allows_type("IMAGE/PNG"));
        assert!(!policy.allows_type(""));
        assert!(!policy.allows_type("application/x-msdownload"));
    }

    #[test]
    fn test_rejection_messages() {
        let too_large = AttachmentRejection::TooLarge {
            filename: "big.zip".to_string(),
            size: MAX_ATTACHMENT_BYTES + 1,
            limit: MAX_ATTACHMENT_BYTES,
        };
        assert_eq!(too_large.to_string(), "File big.zip is too large. Maximum size is 50MB");

        let unknown = AttachmentRejection::UnsupportedType {
            filename: "blob".to_string(),
            mime_type: String::new(),
        };
        assert_eq!(unknown.to_string(), "File type unknown is not supported for blob");
        assert_eq!(unknown.filename(), "blob");
    }

    #[test]
    fn test_limit_is_inclusive() {
        let policy = AttachmentPolicy::default();
        let mut candidate = AttachmentCandidate::new("edge.pdf", "application/pdf", Vec::new());
        candidate.size = MAX_ATTACHMENT_BYTES;
        assert!(policy.validate(&candidate).is_ok());
    }
}
