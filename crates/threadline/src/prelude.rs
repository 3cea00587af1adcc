//! Prelude module for convenient imports
//!
//! ```rust
//! use threadline::prelude::*;
//! ```

pub use crate::{
    AttachmentCandidate, AttachmentPolicy, AttachmentRejection, ChannelState, ChannelStatus,
    ClientConfig, ClientError, ConversationStore, Content, Message, MessageRendering,
    MutationManager, NewThread, RenderModes, RenderedThread, Rendering, Role, SendReport, Session,
    SessionBuilder, StoreSnapshot, TextMode, Thread, ThreadApi, TimestampTicker,
};
