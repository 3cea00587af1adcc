use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use threadline_store::{ConversationStore, StoreSnapshot};
use threadline_types::{PushFrame, Thread, DEFAULT_THREAD_TITLE};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::transport::PushTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    #[default]
    Closed,
    Connecting,
    Open,
}

/// Observable channel status
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelStatus {
    /// Thread the channel is tracking, if any
    pub thread_id: Option<String>,
    pub state: ChannelState,
    /// Reconnection gave up for the tracked thread; updates arrive only via request/response
    pub degraded: bool,
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Wait between a channel closing and the next connection attempt
    pub reconnect_backoff: Duration,
    /// Consecutive failed attempts before giving up on a thread
    pub max_reconnect_attempts: u32,
    /// How long a pushed title stays marked as fresh
    pub title_fresh_window: Duration,
    /// Title that still counts as "untitled"
    pub untitled_placeholder: String,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            reconnect_backoff: Duration::from_millis(3000),
            max_reconnect_attempts: 10,
            title_fresh_window: Duration::from_millis(3000),
            untitled_placeholder: DEFAULT_THREAD_TITLE.to_string(),
        }
    }
}

struct Inner {
    store: Arc<ConversationStore>,
    transport: Arc<dyn PushTransport>,
    options: SyncOptions,
    status: watch::Sender<ChannelStatus>,
    /// Bumped whenever the tracked thread changes; channel tasks only report under their own
    generation: AtomicU64,
}

/// Background channel task for one thread; aborted when dropped
struct ActiveChannel {
    thread_id: String,
    task: JoinHandle<()>,
}

impl Drop for ActiveChannel {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Keeps one push channel open for the selected thread while it is still untitled.
///
/// The controller only reads the store through snapshots and writes through its
/// mutation methods.
pub struct SyncController {
    inner: Arc<Inner>,
}

/// Handle to a running controller. Dropping it stops the controller and closes its channel.
pub struct SyncHandle {
    status: watch::Receiver<ChannelStatus>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    pub fn status(&self) -> ChannelStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ChannelStatus> {
        self.status.clone()
    }

    pub fn shutdown(self) {
        // Drop does the work
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl SyncController {
    pub fn new(store: Arc<ConversationStore>, transport: Arc<dyn PushTransport>) -> Self {
        Self::with_options(store, transport, SyncOptions::default())
    }

    pub fn with_options(
        store: Arc<ConversationStore>,
        transport: Arc<dyn PushTransport>,
        options: SyncOptions,
    ) -> Self {
        let (status, _) = watch::channel(ChannelStatus::default());
        Self {
            inner: Arc::new(Inner {
                store,
                transport,
                options,
                status,
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Start following the store's selection in the background
    pub fn spawn(self) -> SyncHandle {
        let status = self.inner.status.subscribe();
        let inner = self.inner;
        let task = tokio::spawn(async move { inner.run().await });
        SyncHandle { status, task }
    }
}

impl Inner {
    /// The thread that should have an open channel right now
    fn eligible_thread(&self, snapshot: &StoreSnapshot) -> Option<String> {
        let thread = snapshot.selected_thread()?;
        if thread.is_provisional() || !thread.is_untitled(&self.options.untitled_placeholder) {
            return None;
        }
        Some(thread.id.clone())
    }

    /// Start tracking `thread_id` (or nothing). Reports from older channel tasks are ignored from here on.
    fn track(&self, thread_id: Option<&str>) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.status.send_modify(|status| {
            if status.thread_id.as_deref() != thread_id {
                status.degraded = false;
            }
            status.thread_id = thread_id.map(str::to_string);
            status.state = ChannelState::Closed;
        });
        generation
    }

    /// Update the status on behalf of the channel task started under `generation`
    fn report(&self, generation: u64, update: impl FnOnce(&mut ChannelStatus)) {
        self.status.send_if_modified(|status| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            update(status);
            true
        });
    }

    async fn run(self: Arc<Self>) {
        let mut changes = self.store.subscribe();
        let mut active: Option<ActiveChannel> = None;

        loop {
            let target = self.eligible_thread(&changes.borrow_and_update());
            let current = active.as_ref().map(|c| c.thread_id.as_str());

            if current != target.as_deref() {
                if let Some(channel) = active.take() {
                    tracing::info!(thread_id = %channel.thread_id, "Closing push channel");
                    drop(channel);
                }

                let generation = self.track(target.as_deref());

                if let Some(thread_id) = target {
                    let inner = Arc::clone(&self);
                    let id = thread_id.clone();
                    let task = tokio::spawn(async move { inner.run_channel(generation, id).await });
                    active = Some(ActiveChannel { thread_id, task });
                }
            }

            if changes.changed().await.is_err() {
                tracing::debug!("Store dropped, stopping sync controller");
                break;
            }
        }
    }

    /// Connect, pump frames, and reconnect after a fixed backoff until the attempt budget runs out
    async fn run_channel(self: Arc<Self>, generation: u64, thread_id: String) {
        let mut failures: u32 = 0;

        loop {
            self.report(generation, |status| status.state = ChannelState::Connecting);

            match self.transport.connect(&thread_id).await {
                Ok(mut frames) => {
                    failures = 0;
                    self.report(generation, |status| status.state = ChannelState::Open);
                    tracing::info!(thread_id = %thread_id, "Push channel open");

                    while let Some(frame) = frames.next().await {
                        match frame {
                            Ok(text) => self.handle_frame(&thread_id, &text),
                            Err(e) => {
                                tracing::warn!(thread_id = %thread_id, error = %e, "Push channel error");
                                break;
                            }
                        }
                    }
                    tracing::warn!(thread_id = %thread_id, "Push channel closed");
                }
                Err(e) => {
                    tracing::warn!(thread_id = %thread_id, error = %e, "Push channel connect failed");
                }
            }

            self.report(generation, |status| status.state = ChannelState::Closed);
            failures += 1;

            if failures >= self.options.max_reconnect_attempts {
                tracing::error!(
                    thread_id = %thread_id,
                    attempts = failures,
                    "Giving up on push channel; continuing without realtime updates"
                );
                self.report(generation, |status| status.degraded = true);
                return;
            }

            tracing::debug!(
                thread_id = %thread_id,
                attempt = failures,
                backoff_ms = self.options.reconnect_backoff.as_millis() as u64,
                "Reconnecting push channel"
            );
            tokio::time::sleep(self.options.reconnect_backoff).await;
        }
    }

    fn handle_frame(&self, tracked: &str, text: &str) {
        match PushFrame::parse(text) {
            Ok(PushFrame::TitleUpdate { thread }) => self.apply_title(tracked, thread),
            Ok(PushFrame::Unknown) => {
                tracing::debug!(thread_id = %tracked, "Ignoring unknown push frame");
            }
            Err(e) => {
                tracing::debug!(thread_id = %tracked, error = %e, "Ignoring malformed push frame");
            }
        }
    }

    fn apply_title(&self, tracked: &str, thread: Thread) {
        if thread.id != tracked {
            tracing::debug!(thread_id = %thread.id, tracked = %tracked, "Title update for untracked thread");
            return;
        }

        if !self.store.apply_title_update(tracked, thread.title.clone(), thread.updated_at) {
            return;
        }
        tracing::info!(thread_id = %tracked, title = ?thread.title, "Title updated");

        self.store.mark_title_fresh(tracked);
        let store = Arc::clone(&self.store);
        let id = tracked.to_string();
        let window = self.options.title_fresh_window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            store.clear_title_fresh(&id);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use threadline_store::{ClientError, Result};

    use crate::transport::FrameStream;

    struct Unreachable;

    #[async_trait]
    impl PushTransport for Unreachable {
        async fn connect(&self, _thread_id: &str) -> Result<FrameStream> {
            Err(ClientError::Channel("unreachable".to_string()))
        }
    }

    fn inner() -> Arc<Inner> {
        let store = Arc::new(ConversationStore::new());
        SyncController::new(store, Arc::new(Unreachable)).inner
    }

    #[test]
    fn test_superseded_channel_cannot_report() {
        let inner = inner();

        let first = inner.track(Some("t1"));
        inner.report(first, |status| status.state = ChannelState::Open);
        assert_eq!(inner.status.borrow().state, ChannelState::Open);

        let idle = inner.track(None);
        inner.report(first, |status| status.state = ChannelState::Open);
        inner.report(first, |status| status.degraded = true);

        let status = inner.status.borrow().clone();
        assert_eq!(status, ChannelStatus::default());

        inner.report(idle, |status| status.state = ChannelState::Connecting);
        assert_eq!(inner.status.borrow().state, ChannelState::Connecting);
    }

    #[test]
    fn test_reselecting_starts_a_new_generation() {
        let inner = inner();

        let first = inner.track(Some("t1"));
        inner.track(None);
        let second = inner.track(Some("t1"));
        assert_ne!(first, second);

        inner.report(first, |status| status.degraded = true);
        assert!(!inner.status.borrow().degraded);

        inner.report(second, |status| status.state = ChannelState::Open);
        assert_eq!(inner.status.borrow().state, ChannelState::Open);
    }
}
