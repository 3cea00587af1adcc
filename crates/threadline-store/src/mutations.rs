use std::sync::Arc;

use threadline_types::{
    is_provisional_id, Attachment, AttachmentCandidate, AttachmentLocation, Content, Message, Thread,
    DEFAULT_THREAD_TITLE,
};

use crate::error::{ClientError, Result};
use crate::store::ConversationStore;
use crate::trait_client::{NewThread, OutgoingMessage, ThreadApi, ThreadUpdate};

/// Knobs for optimistic sends
#[derive(Debug, Clone)]
pub struct MutationOptions {
    /// Title given to threads created implicitly by a send
    pub default_thread_title: String,
    /// Ask the server to run the assistant turn as part of the send
    pub process_on_send: bool,
}

impl Default for MutationOptions {
    fn default() -> Self {
        Self {
            default_thread_title: DEFAULT_THREAD_TITLE.to_string(),
            process_on_send: true,
        }
    }
}

/// How a create-then-send attempt went wrong
enum SendFailure {
    /// The thread itself could not be created
    Create(ClientError),
    /// The thread exists (perhaps freshly created) but the message was not accepted
    Send {
        created: Option<Thread>,
        error: ClientError,
    },
}

/// Applies local changes before the server answers and reconciles afterwards.
///
/// Each operation either settles with the authoritative server state or rolls back
/// exactly what it added. Nothing else in the store is touched.
pub struct MutationManager {
    store: Arc<ConversationStore>,
    api: Arc<dyn ThreadApi>,
    options: MutationOptions,
}

impl MutationManager {
    pub fn new(store: Arc<ConversationStore>, api: Arc<dyn ThreadApi>) -> Self {
        Self::with_options(store, api, MutationOptions::default())
    }

    pub fn with_options(
        store: Arc<ConversationStore>,
        api: Arc<dyn ThreadApi>,
        options: MutationOptions,
    ) -> Self {
        Self { store, api, options }
    }

    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    /// Log a failed operation, surface it on the snapshot and hand it back
    fn fail<T>(&self, action: &str, thread_id: Option<&str>, error: ClientError) -> Result<T> {
        tracing::error!(thread_id = ?thread_id, error = %error, "{} failed", action);
        self.store.set_error(Some(format!("{}: {}", action, error)));
        Err(error)
    }

    /// Send a message, creating the thread first when `thread_id` is `None`.
    ///
    /// Returns `Ok(None)` when there is nothing to send, or when the thread was deleted
    /// before the send settled. Attachments must already have passed validation.
    pub async fn send_message(
        &self,
        thread_id: Option<&str>,
        text: impl Into<String>,
        attachments: Vec<AttachmentCandidate>,
    ) -> Result<Option<Thread>> {
        let text = text.into();
        if text.trim().is_empty() && attachments.is_empty() {
            tracing::debug!("Ignoring empty send");
            return Ok(None);
        }

        if let Some(id) = thread_id.filter(|id| is_provisional_id(id)) {
            return self.fail("Send message", Some(id), ClientError::ThreadPending(id.to_string()));
        }

        // Optimistic state, visible before any network call
        let local_id = match thread_id {
            Some(id) => id.to_string(),
            None => {
                let thread = Thread::provisional(self.options.default_thread_title.clone());
                let id = thread.id.clone();
                self.store.insert_and_select(thread);
                id
            }
        };

        let message = Message::provisional_user(
            Content::text(text.clone()),
            attachments.iter().map(AttachmentCandidate::to_attachment).collect(),
        );
        let attempt = vec![message.id.clone()];
        self.store.append_message(&local_id, message);
        self.store.begin_processing(&local_id);

        tracing::debug!(
            thread_id = %local_id,
            attachments = attachments.len(),
            "Message added optimistically"
        );

        let outgoing = OutgoingMessage::user(text, attachments);
        let outcome = self.create_and_send(thread_id, outgoing).await;

        let created_here = thread_id.is_none();

        match outcome {
            Ok(thread) => {
                let confirmed_id = thread.id.clone();
                if !self.store.confirm_send(&local_id, &attempt, thread.clone()) {
                    if created_here {
                        self.discard_created(&confirmed_id).await;
                    }
                    return Ok(None);
                }
                self.store.end_processing(&confirmed_id);
                tracing::info!(thread_id = %confirmed_id, "Message sent");
                Ok(Some(thread))
            }
            Err(SendFailure::Create(error)) => {
                tracing::warn!(thread_id = %local_id, "Rolling back provisional thread");
                self.store.remove_thread(&local_id);
                self.fail("Create thread", None, error)
            }
            Err(SendFailure::Send {
                created: Some(created),
                error,
            }) => {
                // The server thread exists; keep it and drop only this attempt's message
                let created_id = created.id.clone();
                tracing::warn!(thread_id = %created_id, "Rolling back provisional message");
                if self.store.confirm_send(&local_id, &attempt, created) {
                    self.store.end_processing(&created_id);
                } else {
                    self.discard_created(&created_id).await;
                }
                self.fail("Send message", Some(&created_id), error)
            }
            Err(SendFailure::Send { created: None, error }) => {
                tracing::warn!(thread_id = %local_id, "Rolling back provisional message");
                self.store.remove_messages(&local_id, &attempt);
                self.store.end_processing(&local_id);
                self.fail("Send message", Some(&local_id), error)
            }
        }
    }

    /// The user deleted a provisional thread while its server copy was being created
    async fn discard_created(&self, thread_id: &str) {
        tracing::info!(thread_id = %thread_id, "Thread deleted during send, removing server copy");
        if let Err(e) = self.api.delete_thread(thread_id).await {
            tracing::warn!(thread_id = %thread_id, error = %e, "Failed to remove server copy of deleted thread");
        }
    }

    async fn create_and_send(
        &self,
        thread_id: Option<&str>,
        message: OutgoingMessage,
    ) -> std::result::Result<Thread, SendFailure> {
        let (target, created) = match thread_id {
            Some(id) => (id.to_string(), None),
            None => {
                let request = NewThread::titled(self.options.default_thread_title.clone());
                let thread = self
                    .api
                    .create_thread(request)
                    .await
                    .map_err(SendFailure::Create)?;
                tracing::info!(thread_id = %thread.id, "Thread created");
                (thread.id.clone(), Some(thread))
            }
        };

        self.api
            .send_message(&target, message, self.options.process_on_send)
            .await
            .map_err(|error| SendFailure::Send { created, error })
    }

    /// Reload the thread list, keeping provisional state that is still in flight
    pub async fn load_threads(&self) -> Result<Vec<Thread>> {
        self.store.set_error(None);
        self.store.set_loading(true);
        let result = self.api.list_threads().await;
        self.store.set_loading(false);

        match result {
            Ok(threads) => {
                tracing::info!(count = threads.len(), "Threads loaded");
                self.store.replace_threads(threads.clone());
                Ok(threads)
            }
            Err(e) => self.fail("Load threads", None, e),
        }
    }

    /// Fetch one thread, e.g. to resolve a deep-linked selection.
    ///
    /// A thread the server does not know is `Ok(None)`; the selection stays as it is.
    pub async fn refresh_thread(&self, thread_id: &str) -> Result<Option<Thread>> {
        match self.api.get_thread(thread_id).await {
            Ok(thread) => {
                self.store.upsert_thread(thread.clone());
                Ok(Some(thread))
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!(thread_id = %thread_id, "Thread not found on server");
                Ok(None)
            }
            Err(e) => self.fail("Refresh thread", Some(thread_id), e),
        }
    }

    /// Create an empty thread and select it
    pub async fn create_thread(&self, request: NewThread) -> Result<Thread> {
        match self.api.create_thread(request).await {
            Ok(thread) => {
                tracing::info!(thread_id = %thread.id, "Thread created");
                self.store.insert_and_select(thread.clone());
                Ok(thread)
            }
            Err(e) => self.fail("Create thread", None, e),
        }
    }

    /// Run the assistant turn on a thread. The processing flag clears however it ends.
    pub async fn process_thread(&self, thread_id: &str) -> Result<Thread> {
        if is_provisional_id(thread_id) {
            return self.fail(
                "Process thread",
                Some(thread_id),
                ClientError::ThreadPending(thread_id.to_string()),
            );
        }

        self.store.begin_processing(thread_id);
        let result = self.api.process_thread(thread_id).await;
        self.store.end_processing(thread_id);

        match result {
            Ok(thread) => {
                self.store.upsert_thread(thread.clone());
                Ok(thread)
            }
            Err(e) => self.fail("Process thread", Some(thread_id), e),
        }
    }

    /// Rename a thread (request-first)
    pub async fn rename_thread(&self, thread_id: &str, title: impl Into<String>) -> Result<Thread> {
        let update = ThreadUpdate {
            title: Some(title.into()),
            attributes: None,
        };
        self.update_thread(thread_id, update).await
    }

    /// Patch title and/or attributes (request-first)
    pub async fn update_thread(&self, thread_id: &str, update: ThreadUpdate) -> Result<Thread> {
        match self.api.update_thread(thread_id, update).await {
            Ok(thread) => {
                self.store.upsert_thread(thread.clone());
                Ok(thread)
            }
            Err(e) => self.fail("Update thread", Some(thread_id), e),
        }
    }

    /// Delete a thread (request-first). Clears the selection if it pointed at the thread.
    pub async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        // A provisional thread never reached the server
        if !is_provisional_id(thread_id) {
            if let Err(e) = self.api.delete_thread(thread_id).await {
                return self.fail("Delete thread", Some(thread_id), e);
            }
        }

        self.store.remove_thread(thread_id);
        tracing::info!(thread_id = %thread_id, "Thread deleted");
        Ok(())
    }

    /// Bytes of an attachment, from the server's file store or decoded from inline data
    pub async fn fetch_attachment(&self, attachment: &Attachment) -> Result<Vec<u8>> {
        match attachment.location() {
            Some(AttachmentLocation::Stored(path)) => self.api.fetch_attachment(path).await,
            Some(AttachmentLocation::Inline(_)) => match attachment.decode_inline() {
                Some(Ok(bytes)) => Ok(bytes),
                Some(Err(e)) => Err(ClientError::Internal(format!(
                    "Invalid inline data for {}: {}",
                    attachment.filename, e
                ))),
                None => Err(ClientError::Internal(format!("No data for {}", attachment.filename))),
            },
            Some(AttachmentLocation::Processed(_)) | None => Err(ClientError::Internal(format!(
                "Attachment {} has no retrievable bytes",
                attachment.filename
            ))),
        }
    }
}
