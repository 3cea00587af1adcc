use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use threadline_types::{Message, Thread};

use crate::sequencer::{thread_view, ThreadView};

/// Immutable view of the whole conversation state
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    /// Most recently created first
    pub threads: Vec<Thread>,
    /// May name a thread that is not loaded yet (deep link)
    pub selected: Option<String>,
    /// In-flight operations per thread id
    pub processing: HashMap<String, usize>,
    /// Threads whose title arrived by push within the display window
    pub fresh_titles: HashSet<String>,
    pub loading: bool,
    pub error: Option<String>,
}

impl StoreSnapshot {
    pub fn thread(&self, id: &str) -> Option<&Thread> {
        self.threads.iter().find(|t| t.id == id)
    }

    /// The selected thread, if it is loaded
    pub fn selected_thread(&self) -> Option<&Thread> {
        self.selected.as_deref().and_then(|id| self.thread(id))
    }

    pub fn is_processing(&self, thread_id: &str) -> bool {
        self.processing.get(thread_id).is_some_and(|n| *n > 0)
    }

    pub fn is_title_fresh(&self, thread_id: &str) -> bool {
        self.fresh_titles.contains(thread_id)
    }

    fn thread_mut(&mut self, id: &str) -> Option<&mut Thread> {
        self.threads.iter_mut().find(|t| t.id == id)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.threads.iter().position(|t| t.id == id)
    }
}

/// Single source of truth for threads and selection.
///
/// Every mutation runs to completion under the channel lock and is published as a
/// new snapshot; readers only ever hold whole snapshots.
pub struct ConversationStore {
    state: watch::Sender<Arc<StoreSnapshot>>,
}

/// Keep local provisional messages that the server copy does not know about yet
fn carry_provisional(local: &Thread, incoming: &mut Thread) {
    let pending: Vec<Message> = local
        .messages
        .iter()
        .filter(|m| m.is_provisional() && incoming.message(&m.id).is_none())
        .cloned()
        .collect();
    incoming.messages.extend(pending);
}

impl ConversationStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Arc::new(StoreSnapshot::default()));
        Self { state }
    }

    /// Current state
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.state.borrow().clone()
    }

    /// Change notifications; each received value is a complete snapshot
    pub fn subscribe(&self) -> watch::Receiver<Arc<StoreSnapshot>> {
        self.state.subscribe()
    }

    fn mutate(&self, f: impl FnOnce(&mut StoreSnapshot)) {
        self.state.send_modify(|state| f(Arc::make_mut(state)));
    }

    /// Like `mutate`, but only notifies subscribers when `f` reports a change
    fn mutate_if(&self, f: impl FnOnce(&mut StoreSnapshot) -> bool) -> bool {
        self.state.send_if_modified(|state| f(Arc::make_mut(state)))
    }

    /// Sequenced view of a thread, or `None` when it is not loaded
    pub fn materialize(&self, thread_id: &str) -> Option<ThreadView> {
        self.snapshot().thread(thread_id).map(thread_view)
    }

    /// Replace server threads with a fresh listing.
    ///
    /// Provisional threads and in-flight provisional messages survive the reload.
    pub fn replace_threads(&self, threads: Vec<Thread>) {
        self.mutate(|state| {
            let mut next: Vec<Thread> = state
                .threads
                .iter()
                .filter(|t| t.is_provisional())
                .cloned()
                .collect();

            for mut incoming in threads {
                if let Some(local) = state.thread(&incoming.id) {
                    carry_provisional(local, &mut incoming);
                }
                next.push(incoming);
            }

            tracing::debug!(count = next.len(), "Threads replaced");
            state.threads = next;
        });
    }

    /// Insert or replace one thread, keeping its in-flight provisional messages
    pub fn upsert_thread(&self, mut thread: Thread) {
        self.mutate(|state| match state.position(&thread.id) {
            Some(idx) => {
                carry_provisional(&state.threads[idx], &mut thread);
                state.threads[idx] = thread;
            }
            None => state.threads.insert(0, thread),
        });
    }

    /// Insert a thread at the top of the list and select it in one step
    pub fn insert_and_select(&self, thread: Thread) {
        self.mutate(|state| {
            state.selected = Some(thread.id.clone());
            match state.position(&thread.id) {
                Some(idx) => state.threads[idx] = thread,
                None => state.threads.insert(0, thread),
            }
        });
    }

    /// Selecting an id that is not loaded is valid and renders as "no thread"
    pub fn select_thread(&self, thread_id: Option<String>) {
        self.mutate_if(|state| {
            if state.selected == thread_id {
                return false;
            }
            tracing::debug!(thread_id = ?thread_id, "Thread selected");
            state.selected = thread_id;
            true
        });
    }

    /// Append a message to a loaded thread. Returns false when the thread is missing.
    pub fn append_message(&self, thread_id: &str, message: Message) -> bool {
        self.mutate_if(|state| match state.thread_mut(thread_id) {
            Some(thread) => {
                thread.messages.push(message);
                true
            }
            None => false,
        })
    }

    /// Reconcile a successful send in one atomic step.
    ///
    /// The local thread `local_id` (provisional or real) takes the identity and messages of
    /// `confirmed`. This attempt's provisional messages are dropped; confirmed local messages
    /// missing from the response and provisional messages of other sends are kept.
    /// Selection and in-flight counters follow the thread to its new id.
    ///
    /// Returns false, leaving the store untouched, when `local_id` was removed while the
    /// send was in flight. A deleted thread stays deleted.
    pub fn confirm_send(&self, local_id: &str, attempt_message_ids: &[String], confirmed: Thread) -> bool {
        self.mutate_if(|state| {
            let Some(local) = state.thread(local_id) else {
                tracing::debug!(local_id = %local_id, "Send settled for a removed thread, dropping result");
                return false;
            };

            let mut merged = confirmed;
            let kept: Vec<Message> = local
                .messages
                .iter()
                .filter(|m| merged.message(&m.id).is_none())
                .filter(|m| !attempt_message_ids.contains(&m.id))
                .cloned()
                .collect();
            merged.messages.extend(kept);

            let new_id = merged.id.clone();

            if local_id != new_id {
                if let Some(dup) = state.position(&new_id) {
                    state.threads.remove(dup);
                }
                if state.selected.as_deref() == Some(local_id) {
                    state.selected = Some(new_id.clone());
                }
                if let Some(count) = state.processing.remove(local_id) {
                    *state.processing.entry(new_id.clone()).or_insert(0) += count;
                }
            }

            if let Some(idx) = state.position(local_id) {
                state.threads[idx] = merged;
            }

            tracing::debug!(local_id = %local_id, thread_id = %new_id, "Send confirmed");
            true
        })
    }

    /// Roll back specific provisional messages. Returns how many were removed.
    pub fn remove_messages(&self, thread_id: &str, message_ids: &[String]) -> usize {
        let mut removed = 0;
        self.mutate_if(|state| {
            if let Some(thread) = state.thread_mut(thread_id) {
                let before = thread.messages.len();
                thread.messages.retain(|m| !message_ids.contains(&m.id));
                removed = before - thread.messages.len();
            }
            removed > 0
        });
        removed
    }

    /// Remove a thread and every piece of state keyed by it; clears selection if it was selected
    pub fn remove_thread(&self, thread_id: &str) -> Option<Thread> {
        let mut removed = None;
        self.mutate(|state| {
            if state.selected.as_deref() == Some(thread_id) {
                state.selected = None;
            }
            state.processing.remove(thread_id);
            state.fresh_titles.remove(thread_id);
            removed = state.position(thread_id).map(|idx| state.threads.remove(idx));
        });
        removed
    }

    pub fn begin_processing(&self, thread_id: &str) {
        self.mutate(|state| {
            *state.processing.entry(thread_id.to_string()).or_insert(0) += 1;
        });
    }

    pub fn end_processing(&self, thread_id: &str) {
        self.mutate_if(|state| match state.processing.get_mut(thread_id) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                state.processing.remove(thread_id);
                true
            }
            None => false,
        });
    }

    /// Merge a pushed title, but only while `thread_id` is still selected.
    ///
    /// The selection check happens inside the mutation, so a push racing a deselection is dropped.
    pub fn apply_title_update(
        &self,
        thread_id: &str,
        title: Option<String>,
        updated_at: DateTime<Utc>,
    ) -> bool {
        self.mutate_if(|state| {
            if state.selected.as_deref() != Some(thread_id) {
                return false;
            }
            match state.thread_mut(thread_id) {
                Some(thread) if thread.title != title => {
                    thread.title = title;
                    thread.updated_at = updated_at;
                    true
                }
                _ => false,
            }
        })
    }

    pub fn mark_title_fresh(&self, thread_id: &str) {
        self.mutate_if(|state| state.fresh_titles.insert(thread_id.to_string()));
    }

    pub fn clear_title_fresh(&self, thread_id: &str) {
        self.mutate_if(|state| state.fresh_titles.remove(thread_id));
    }

    pub fn set_loading(&self, loading: bool) {
        self.mutate_if(|state| {
            let changed = state.loading != loading;
            state.loading = loading;
            changed
        });
    }

    pub fn set_error(&self, error: Option<String>) {
        self.mutate_if(|state| {
            let changed = state.error != error;
            state.error = error;
            changed
        });
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use threadline_types::Role;

    #[test]
    fn test_subscribers_see_whole_mutations() {
        let store = ConversationStore::new();
        let mut rx = store.subscribe();

        store.insert_and_select(Thread::new("t1", None));
        assert!(rx.has_changed().unwrap());
        let snap = rx.borrow_and_update().clone();
        assert_eq!(snap.threads.len(), 1);
        assert_eq!(snap.selected.as_deref(), Some("t1"));
    }

    #[test]
    fn test_noop_mutations_do_not_notify() {
        let store = ConversationStore::new();
        let rx = store.subscribe();

        store.select_thread(None);
        store.clear_title_fresh("nope");
        assert!(!store.append_message("missing", Message::new("m1", Role::User, "x")));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_processing_is_counted() {
        let store = ConversationStore::new();
        store.begin_processing("t1");
        store.begin_processing("t1");
        store.end_processing("t1");
        assert!(store.snapshot().is_processing("t1"));
        store.end_processing("t1");
        assert!(!store.snapshot().is_processing("t1"));
    }

    #[test]
    fn test_old_snapshots_are_unaffected() {
        let store = ConversationStore::new();
        store.upsert_thread(Thread::new("t1", None));
        let before = store.snapshot();
        store.append_message("t1", Message::new("m1", Role::User, "hi"));

        assert!(before.thread("t1").unwrap().messages.is_empty());
        assert_eq!(store.snapshot().thread("t1").unwrap().messages.len(), 1);
    }
}
