//! Which prompt each session has already answered.
//!
//! A prompt stays on screen for a moment after its answer is sent, and every
//! capture rebuilds it as a fresh pending [`PromptData`]. This registry keeps
//! the settled prompt's content key per `(session id, tool)` so the manual
//! answer path and the auto-yes loop both refuse to answer it again. The key
//! is dropped as soon as a capture shows no prompt.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::{PromptData, ToolVariant};

type Key = (String, ToolVariant);

#[derive(Debug, Default)]
pub struct AnsweredPrompts {
    settled: Mutex<HashMap<Key, u64>>,
}

impl AnsweredPrompts {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Key, u64>> {
        self.settled.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reserve `prompt` for answering. Returns false if it was already answered.
    ///
    /// Check and insert happen under one lock, so two concurrent answers to
    /// the same prompt cannot both be sent.
    pub fn claim(&self, session_id: &str, tool: ToolVariant, prompt: &PromptData) -> bool {
        let key = prompt.content_key();
        let mut settled = self.lock();
        let previous = settled.insert((session_id.to_string(), tool), key);
        previous != Some(key)
    }

    /// Undo a [`claim`](Self::claim) whose answer was never delivered.
    pub fn release(&self, session_id: &str, tool: ToolVariant, prompt: &PromptData) {
        let key = (session_id.to_string(), tool);
        let mut settled = self.lock();
        if settled.get(&key) == Some(&prompt.content_key()) {
            settled.remove(&key);
        }
    }

    pub fn is_answered(&self, session_id: &str, tool: ToolVariant, prompt: &PromptData) -> bool {
        self.lock().get(&(session_id.to_string(), tool)) == Some(&prompt.content_key())
    }

    /// The screen no longer shows a prompt, so the next one is new even if
    /// it looks the same.
    pub fn clear(&self, session_id: &str, tool: ToolVariant) {
        if self.lock().remove(&(session_id.to_string(), tool)).is_some() {
            debug!(session_id, tool = %tool, "answered prompt cleared");
        }
    }
}
