pub mod attachment;
pub mod content;
pub mod frame;
pub mod ids;
pub mod message;
pub mod thread;
pub mod tool;

mod de;

pub use attachment::{Attachment, AttachmentCandidate, AttachmentLocation};
pub use content::{Content, ContentPart, ImageDetail, ImageUrl};
pub use frame::PushFrame;
pub use ids::{is_provisional_id, provisional_id, PROVISIONAL_ID_PREFIX};
pub use message::{Message, Metrics, Role, Timing, TokenUsage};
pub use thread::{Thread, DEFAULT_THREAD_TITLE};
pub use tool::{FunctionCall, ToolCall};
