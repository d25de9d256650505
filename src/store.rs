//! Session state persistence contract.
//!
//! The poller reports its capture cursor and in-progress message marker here
//! so a restarted poller resumes where the previous one stopped. The real
//! store lives with the application's database; [`MemoryStateStore`] backs
//! the CLI and tests.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::ToolVariant;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Capture cursor: how many lines of output have been processed.
    pub last_captured_line: usize,
    /// Id of a response that is still being written, if any.
    pub in_progress_message_id: Option<String>,
}

pub trait SessionStateStore: Send + Sync {
    fn get_session_state(&self, session_id: &str, tool: ToolVariant) -> Option<SessionState>;

    fn update_session_state(&self, session_id: &str, tool: ToolVariant, last_captured_line: usize);

    fn set_in_progress_message_id(&self, session_id: &str, tool: ToolVariant, message_id: &str);

    fn clear_in_progress_message_id(&self, session_id: &str, tool: ToolVariant);
}

type Key = (String, ToolVariant);

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    states: Mutex<HashMap<Key, SessionState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entry<R>(
        &self,
        session_id: &str,
        tool: ToolVariant,
        f: impl FnOnce(&mut SessionState) -> R,
    ) -> R {
        let mut guard = self.states.lock().unwrap_or_else(|e| e.into_inner());
        let entry = guard.entry((session_id.to_string(), tool)).or_default();
        f(entry)
    }
}

impl SessionStateStore for MemoryStateStore {
    fn get_session_state(&self, session_id: &str, tool: ToolVariant) -> Option<SessionState> {
        let guard = self.states.lock().unwrap_or_else(|e| e.into_inner());
        guard.get(&(session_id.to_string(), tool)).cloned()
    }

    fn update_session_state(&self, session_id: &str, tool: ToolVariant, last_captured_line: usize) {
        self.with_entry(session_id, tool, |s| s.last_captured_line = last_captured_line);
    }

    fn set_in_progress_message_id(&self, session_id: &str, tool: ToolVariant, message_id: &str) {
        self.with_entry(session_id, tool, |s| {
            s.in_progress_message_id = Some(message_id.to_string())
        });
    }

    fn clear_in_progress_message_id(&self, session_id: &str, tool: ToolVariant) {
        self.with_entry(session_id, tool, |s| s.in_progress_message_id = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_state_is_none() {
        let store = MemoryStateStore::new();
        assert!(store.get_session_state("a", ToolVariant::Claude).is_none());
    }

    #[test]
    fn test_state_is_keyed_by_session_and_tool() {
        let store = MemoryStateStore::new();
        store.update_session_state("a", ToolVariant::Claude, 12);
        store.update_session_state("a", ToolVariant::Codex, 3);
        assert_eq!(
            store
                .get_session_state("a", ToolVariant::Claude)
                .unwrap()
                .last_captured_line,
            12
        );
        assert_eq!(
            store
                .get_session_state("a", ToolVariant::Codex)
                .unwrap()
                .last_captured_line,
            3
        );
    }

    #[test]
    fn test_in_progress_marker() {
        let store = MemoryStateStore::new();
        store.set_in_progress_message_id("a", ToolVariant::Gemini, "m1");
        assert_eq!(
            store
                .get_session_state("a", ToolVariant::Gemini)
                .unwrap()
                .in_progress_message_id
                .as_deref(),
            Some("m1")
        );
        store.clear_in_progress_message_id("a", ToolVariant::Gemini);
        assert!(
            store
                .get_session_state("a", ToolVariant::Gemini)
                .unwrap()
                .in_progress_message_id
                .is_none()
        );
    }
}
