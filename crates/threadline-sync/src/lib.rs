//! Realtime synchronisation: a push channel per selected, still-untitled thread whose
//! title updates are merged into the conversation store.

pub mod buffering;
pub mod controller;
pub mod transport;

pub use buffering::{CircularLineBuffer, SseEventAssembler};
pub use controller::{ChannelState, ChannelStatus, SyncController, SyncHandle, SyncOptions};
pub use transport::{sse_frames, FrameStream, PushTransport, SseTransport, DEFAULT_EVENTS_PATH};
