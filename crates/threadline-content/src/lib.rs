//! Pure helpers that turn raw conversation data into render-ready shapes.
//!
//! Nothing in this crate performs I/O or holds state beyond what the caller passes in.

pub mod attachments;
pub mod classifier;
pub mod dialect;
pub mod modes;
pub mod time;

pub use attachments::{
    AttachmentPolicy, AttachmentRejection, BatchValidation, DEFAULT_ALLOWED_MIME_TYPES,
    MAX_ATTACHMENT_BYTES,
};
pub use classifier::{
    classify_content, classify_message, classify_text, classify_tool_arguments,
    parse_structured, resolve_tool_label, MessageRendering, Rendering,
};
pub use modes::{RenderModes, TextMode};
pub use time::{format_timestamp, time_ago, TimestampStyle};
