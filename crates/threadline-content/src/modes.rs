use std::collections::HashSet;

/// How plain text is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextMode {
    /// Formatted (markdown) rendering
    #[default]
    Rich,
    /// Literal monospace rendering
    Literal,
}

/// Per-message rich/literal toggles.
///
/// Client-local and never persisted; lives beside the conversation store, not in it.
#[derive(Debug, Clone, Default)]
pub struct RenderModes {
    literal: HashSet<String>,
}

impl RenderModes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip a message between rich and literal rendering, returning the new mode
    pub fn toggle(&mut self, message_id: &str) -> TextMode {
        if self.literal.remove(message_id) {
            TextMode::Rich
        } else {
            self.literal.insert(message_id.to_string());
            TextMode::Literal
        }
    }

    pub fn mode_for(&self, message_id: &str) -> TextMode {
        if self.literal.contains(message_id) {
            TextMode::Literal
        } else {
            TextMode::Rich
        }
    }

    /// Drop toggles for messages that no longer exist (e.g. a deleted thread)
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.literal.retain(|id| keep(id));
    }
}
