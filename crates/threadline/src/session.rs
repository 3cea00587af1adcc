use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Local, Utc};
use threadline_content::{
    classify_message, classify_tool_arguments, format_timestamp, AttachmentPolicy,
    AttachmentRejection, BatchValidation, MessageRendering, RenderModes, Rendering,
    TimestampStyle,
};
use threadline_store::{
    sequence, ClientError, ConversationStore, HttpThreadApi, MutationManager, MutationOptions,
    StoreSnapshot, ThreadApi, ToolResult,
};
use threadline_sync::{ChannelStatus, PushTransport, SseTransport, SyncController, SyncHandle, SyncOptions};
use threadline_types::{Attachment, AttachmentCandidate, Role, Thread};

use crate::config::ClientConfig;
use crate::ticker::TimestampTicker;

/// Result of a send: the settled thread (if anything was sent) and files refused up front
#[derive(Debug)]
pub struct SendReport {
    pub thread: Option<Thread>,
    pub rejected: Vec<AttachmentRejection>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedToolCall {
    pub call_id: String,
    pub name: String,
    pub arguments: Rendering,
    /// Inline answer; `None` while pending or when the answer is its own entry
    pub result: Option<MessageRendering>,
    /// Answered by a message displayed separately (it carries attachments)
    pub answered_separately: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEntry {
    pub message_id: String,
    pub role: Role,
    pub rendering: MessageRendering,
    pub tool_calls: Vec<RenderedToolCall>,
    pub attachments: Vec<Attachment>,
    /// Human-relative label, e.g. `5m`
    pub timestamp: String,
    /// Not yet confirmed by the server
    pub pending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedThread {
    pub thread_id: String,
    pub title: String,
    pub title_fresh: bool,
    pub processing: bool,
    pub entries: Vec<RenderedEntry>,
}

/// One client session: store, optimistic mutations, attachment policy and the
/// realtime title channel wired together from configuration.
pub struct Session {
    config: ClientConfig,
    store: Arc<ConversationStore>,
    mutations: Arc<MutationManager>,
    sync: Option<SyncHandle>,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    pub fn mutations(&self) -> &Arc<MutationManager> {
        &self.mutations
    }

    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.store.snapshot()
    }

    pub fn attachment_policy(&self) -> &AttachmentPolicy {
        &self.config.attachments
    }

    pub fn select_thread(&self, thread_id: Option<String>) {
        self.store.select_thread(thread_id);
    }

    /// Channel status, or `None` when realtime sync is disabled
    pub fn sync_status(&self) -> Option<ChannelStatus> {
        self.sync.as_ref().map(SyncHandle::status)
    }

    /// Check candidates against the attachment policy without sending anything
    pub fn validate_attachments(&self, candidates: Vec<AttachmentCandidate>) -> BatchValidation {
        self.config.attachments.validate_batch(candidates)
    }

    /// Validate attachments, then send what passed.
    ///
    /// Rejections are reported before any network call; valid files still go out.
    pub async fn send(
        &self,
        thread_id: Option<&str>,
        text: &str,
        candidates: Vec<AttachmentCandidate>,
    ) -> Result<SendReport, ClientError> {
        let BatchValidation { accepted, rejected } = self.validate_attachments(candidates);
        for rejection in &rejected {
            tracing::warn!(filename = %rejection.filename(), reason = %rejection, "Attachment rejected");
        }

        let thread = self.mutations.send_message(thread_id, text, accepted).await?;
        Ok(SendReport { thread, rejected })
    }

    /// Render-ready view of a loaded thread. Timestamp labels use the local calendar day.
    pub fn render_thread(
        &self,
        thread_id: &str,
        modes: &RenderModes,
        now: DateTime<Utc>,
    ) -> Option<RenderedThread> {
        let snapshot = self.store.snapshot();
        let thread = snapshot.thread(thread_id)?;
        let messages = &thread.messages;
        let local_now = now.with_timezone(&Local);

        let entries = sequence(messages)
            .into_iter()
            .map(|entry| {
                let message = &entry.message;
                let tool_calls = entry
                    .tool_exchanges
                    .iter()
                    .map(|exchange| {
                        let (result, answered_separately) = match &exchange.result {
                            ToolResult::Inline(answer) => (
                                Some(classify_message(answer, messages, modes.mode_for(&answer.id))),
                                false,
                            ),
                            ToolResult::Shown { .. } => (None, true),
                            ToolResult::Pending => (None, false),
                        };
                        RenderedToolCall {
                            call_id: exchange.call.id.clone(),
                            name: exchange.call.function.name.clone(),
                            arguments: classify_tool_arguments(&exchange.call),
                            result,
                            answered_separately,
                        }
                    })
                    .collect();

                RenderedEntry {
                    message_id: message.id.clone(),
                    role: message.role,
                    rendering: classify_message(message, messages, modes.mode_for(&message.id)),
                    tool_calls,
                    attachments: message.attachments.clone(),
                    timestamp: format_timestamp(message.timestamp, local_now, TimestampStyle::Short),
                    pending: message.is_provisional(),
                }
            })
            .collect();

        Some(RenderedThread {
            thread_id: thread.id.clone(),
            title: thread.display_title().to_string(),
            title_fresh: snapshot.is_title_fresh(&thread.id),
            processing: snapshot.is_processing(&thread.id),
            entries,
        })
    }

    /// Ticker for refreshing relative timestamps at the configured period
    pub fn timestamp_ticker(&self) -> TimestampTicker {
        TimestampTicker::spawn(self.config.timestamp_refresh())
    }
}

pub struct SessionBuilder {
    config: ClientConfig,
    api: Option<Arc<dyn ThreadApi>>,
    transport: Option<Arc<dyn PushTransport>>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            api: None,
            transport: None,
        }
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom thread API instead of HTTP
    pub fn api(mut self, api: Arc<dyn ThreadApi>) -> Self {
        self.api = Some(api);
        self
    }

    /// Use a custom push transport instead of server-sent events
    pub fn transport(mut self, transport: Arc<dyn PushTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the session. Must run inside a Tokio runtime when sync is enabled.
    pub fn build(self) -> anyhow::Result<Session> {
        let config = self.config;

        let api: Arc<dyn ThreadApi> = match self.api {
            Some(api) => api,
            None => {
                let mut builder = HttpThreadApi::builder().base_url(config.api.base_url.clone());
                if let Some(timeout) = config.request_timeout() {
                    builder = builder.request_timeout(timeout);
                }
                Arc::new(builder.build().context("Failed to create thread API client")?)
            }
        };

        let store = Arc::new(ConversationStore::new());
        let mutations = Arc::new(MutationManager::with_options(
            Arc::clone(&store),
            api,
            MutationOptions::from(&config.session),
        ));

        let sync = if config.sync.enabled {
            let transport: Arc<dyn PushTransport> = match self.transport {
                Some(transport) => transport,
                None => Arc::new(
                    SseTransport::new(config.api.base_url.clone(), config.sync.events_path.clone())
                        .context("Failed to create push transport")?,
                ),
            };
            let options = SyncOptions {
                untitled_placeholder: config.session.default_thread_title.clone(),
                ..SyncOptions::from(&config.sync)
            };
            Some(SyncController::with_options(Arc::clone(&store), transport, options).spawn())
        } else {
            tracing::info!("Realtime sync disabled");
            None
        };

        tracing::info!(base_url = %config.api.base_url, "Session ready");

        Ok(Session {
            config,
            store,
            mutations,
            sync,
        })
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
