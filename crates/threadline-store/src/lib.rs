pub mod builder;
pub mod client;
pub mod error;
pub mod mutations;
pub mod sequencer;
pub mod store;
pub mod trait_client;

pub use builder::{HttpThreadApiBuilder, DEFAULT_BASE_URL};
pub use client::HttpThreadApi;
pub use error::{ClientError, Result};
pub use mutations::{MutationManager, MutationOptions};
pub use sequencer::{
    display_order, is_inline_tool_result, sequence, thread_view, DisplayEntry, ThreadView,
    ToolExchange, ToolResult,
};
pub use store::{ConversationStore, StoreSnapshot};
pub use trait_client::{NewThread, OutgoingMessage, ThreadApi, ThreadUpdate};
