//! # Threadline
//!
//! Client core for a threaded conversation UI talking to a remote agent server.
//!
//! ## Overview
//!
//! - **Conversation store** with atomic, snapshot-published mutations
//! - **Optimistic sends**: threads and messages appear immediately and are reconciled
//!   (or rolled back) when the server answers
//! - **Realtime titles** over a per-thread push channel with bounded reconnects
//! - **Content classification**: structured data, recovered dictionary literals and plain text
//! - **Attachment validation** before anything leaves the client
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use threadline::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ClientConfig::load()?;
//!     let session = Session::builder().config(config).build()?;
//!
//!     session.mutations().load_threads().await?;
//!     let report = session.send(None, "Hello!", Vec::new()).await?;
//!
//!     if let Some(thread) = report.thread {
//!         let view = session.render_thread(&thread.id, &RenderModes::new(), threadline::chrono::Utc::now());
//!         println!("{:#?}", view);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`threadline-types`**: threads, messages, attachments and push frames
//! - **`threadline-content`**: classifier, attachment policy, relative timestamps
//! - **`threadline-store`**: store, sequencer, remote API and optimistic mutations
//! - **`threadline-sync`**: push transport and realtime sync controller

pub mod config;
pub mod prelude;
pub mod session;
pub mod telemetry;
pub mod ticker;

pub use threadline_content::{
    classify_content, classify_message, classify_text, classify_tool_arguments, format_timestamp,
    parse_structured, resolve_tool_label, time_ago, AttachmentPolicy, AttachmentRejection,
    BatchValidation, MessageRendering, RenderModes, Rendering, TextMode, TimestampStyle,
    DEFAULT_ALLOWED_MIME_TYPES, MAX_ATTACHMENT_BYTES,
};
pub use threadline_store::{
    display_order, sequence, thread_view, ClientError, ConversationStore, DisplayEntry,
    HttpThreadApi, HttpThreadApiBuilder, MutationManager, MutationOptions, NewThread,
    OutgoingMessage, Result as ClientResult, StoreSnapshot, ThreadApi, ThreadUpdate, ThreadView,
    ToolExchange, ToolResult,
};
pub use threadline_sync::{
    ChannelState, ChannelStatus, FrameStream, PushTransport, SseTransport, SyncController,
    SyncHandle, SyncOptions,
};
pub use threadline_types::{
    is_provisional_id, Attachment, AttachmentCandidate, AttachmentLocation, Content, ContentPart,
    Message, Metrics, PushFrame, Role, Thread, ToolCall, DEFAULT_THREAD_TITLE,
};

pub use config::ClientConfig;
pub use session::{RenderedEntry, RenderedThread, RenderedToolCall, SendReport, Session, SessionBuilder};
pub use telemetry::init_logging;
pub use ticker::TimestampTicker;

// Re-export common dependencies
pub use anyhow;
pub use chrono;
