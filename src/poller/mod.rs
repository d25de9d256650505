//! Response polling.
//!
//! One repeating capture-and-classify cycle runs per `(session id, tool)`
//! key. Each cycle:
//!
//! 1. confirms the session still exists (the loop ends when it is gone)
//! 2. captures scrollback and classifies it
//! 3. emits a [`PollEvent::Prompt`] the first time a given prompt appears
//! 4. otherwise emits in-progress and completed responses for output past
//!    the capture cursor, advancing the cursor once a response completes
//!
//! Per-key state (cursor, in-progress marker, dedup keys) lives in the
//! poller and is mirrored to the [`SessionStateStore`] so a restarted poller
//! does not re-read old output.

pub(crate) mod tasks;

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::answered::AnsweredPrompts;
use crate::config::PollerSettings;
use crate::detect::{
    classify_capture, extract_partial_response, extract_response, transcript_before_prompt,
};
use crate::error::{CaptureError, SessionNameError};
use crate::patterns::content_lines;
use crate::store::SessionStateStore;
use crate::terminal::{CaptureOptions, Multiplexer, SessionNaming};
use crate::{PromptData, ToolVariant};

use tasks::{Gate, TaskRegistry};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PollerKey {
    pub session_id: String,
    pub tool: ToolVariant,
}

impl PollerKey {
    pub fn new(session_id: impl Into<String>, tool: ToolVariant) -> Self {
        Self {
            session_id: session_id.into(),
            tool,
        }
    }
}

/// Per-key progress through a session's output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollerState {
    pub last_captured_line: usize,
    pub in_progress_message_id: Option<String>,
    last_prompt_key: Option<u64>,
    last_progress_key: Option<u64>,
    /// Transcript above the input prompt when the last response was emitted.
    last_response_screen: Option<u64>,
}

/// Published by the poller for downstream handling.
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    /// A prompt appeared. Emitted once per distinct prompt content.
    Prompt {
        session_id: String,
        tool: ToolVariant,
        prompt: PromptData,
    },
    /// A response that is still being written.
    Progress {
        session_id: String,
        tool: ToolVariant,
        message_id: String,
        content: String,
    },
    /// A completed response.
    Response {
        session_id: String,
        tool: ToolVariant,
        message_id: String,
        content: String,
    },
    /// The session disappeared and its poller stopped.
    SessionEnded { session_id: String, tool: ToolVariant },
}

/// What a single cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    SessionGone,
    Thinking,
    Prompt { emitted: bool },
    Progress { emitted: bool },
    Response { emitted: bool },
    NoChange,
}

fn text_key(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

struct PollerInner {
    mux: Arc<dyn Multiplexer>,
    store: Arc<dyn SessionStateStore>,
    answered: Arc<AnsweredPrompts>,
    naming: SessionNaming,
    settings: PollerSettings,
    states: Mutex<HashMap<PollerKey, PollerState>>,
    tasks: TaskRegistry<PollerKey>,
    events: mpsc::Sender<PollEvent>,
}

/// Owns every response-polling loop in the process.
#[derive(Clone)]
pub struct ResponsePoller {
    inner: Arc<PollerInner>,
}

impl ResponsePoller {
    /// Captures without a prompt clear the session's entry in `answered`.
    pub fn new(
        mux: Arc<dyn Multiplexer>,
        store: Arc<dyn SessionStateStore>,
        answered: Arc<AnsweredPrompts>,
        naming: SessionNaming,
        settings: PollerSettings,
        events: mpsc::Sender<PollEvent>,
    ) -> Self {
        Self {
            inner: Arc::new(PollerInner {
                mux,
                store,
                answered,
                naming,
                settings,
                states: Mutex::new(HashMap::new()),
                tasks: TaskRegistry::new(),
                events,
            }),
        }
    }

    /// Start the loop for a key. Starting an already-active key is a no-op
    /// and returns `Ok(false)`.
    pub fn start_polling(&self, session_id: &str, tool: ToolVariant) -> Result<bool, SessionNameError> {
        let session = self.inner.naming.session_name(session_id, tool)?;
        let key = PollerKey::new(session_id, tool);
        self.inner.ensure_state(&key);

        let inner = Arc::clone(&self.inner);
        let task_key = key.clone();
        let started = self.inner.tasks.start(key, move |gate| {
            tokio::spawn(run_loop(inner, task_key, session, gate))
        });
        if started {
            info!(session_id, tool = %tool, "response poller started");
        }
        Ok(started)
    }

    /// Stop the loop for a key. Idempotent. After this returns the loop does
    /// no further work.
    pub async fn stop_polling(&self, session_id: &str, tool: ToolVariant) -> bool {
        let key = PollerKey::new(session_id, tool);
        let stopped = self.inner.tasks.stop(&key).await;
        self.inner.lock_states().remove(&key);
        if stopped {
            info!(session_id, tool = %tool, "response poller stopped");
        }
        stopped
    }

    pub fn get_active_poller_count(&self) -> usize {
        self.inner.tasks.active_count()
    }

    pub fn is_polling(&self, session_id: &str, tool: ToolVariant) -> bool {
        self.inner.tasks.is_active(&PollerKey::new(session_id, tool))
    }

    /// Snapshot of a key's state, if the poller knows it.
    pub fn state(&self, session_id: &str, tool: ToolVariant) -> Option<PollerState> {
        self.inner
            .lock_states()
            .get(&PollerKey::new(session_id, tool))
            .cloned()
    }

    /// A new outbound user message is about to be sent: rewind the cursor
    /// and drop the in-progress marker so the reply is captured fresh.
    pub fn reset_for_new_message(&self, session_id: &str, tool: ToolVariant) {
        let key = PollerKey::new(session_id, tool);
        self.inner.with_state(&key, |s| {
            s.last_captured_line = 0;
            s.in_progress_message_id = None;
            s.last_progress_key = None;
            s.last_prompt_key = None;
        });
        self.inner.store.update_session_state(session_id, tool, 0);
        self.inner.store.clear_in_progress_message_id(session_id, tool);
        debug!(session_id, tool = %tool, "capture cursor reset for new message");
    }

    /// Run one cycle now. With a loop active for the key, waits for the
    /// loop's current cycle to finish so cycles never overlap.
    pub async fn poll_once(
        &self,
        session_id: &str,
        tool: ToolVariant,
    ) -> Result<PollOutcome, crate::error::SupervisorError> {
        let session = self.inner.naming.session_name(session_id, tool)?;
        let key = PollerKey::new(session_id, tool);
        let gate = self.inner.tasks.gate(&key);
        let _cycle = match &gate {
            Some(gate) => gate.enter().await,
            None => None,
        };
        self.inner.ensure_state(&key);
        Ok(self.inner.tick(&key, &session).await?)
    }

    /// Stop every loop.
    pub async fn stop_all(&self) {
        self.inner.tasks.stop_all().await;
        self.inner.lock_states().clear();
    }
}

async fn run_loop(inner: Arc<PollerInner>, key: PollerKey, session: String, gate: Gate) {
    let interval = inner.settings.interval();
    loop {
        let Some(cycle) = gate.enter().await else {
            break;
        };
        match inner.tick(&key, &session).await {
            Ok(PollOutcome::SessionGone) => {
                info!(session = %session, "session gone, stopping response poller");
                inner
                    .emit(PollEvent::SessionEnded {
                        session_id: key.session_id.clone(),
                        tool: key.tool,
                    })
                    .await;
                inner.lock_states().remove(&key);
                break;
            }
            Ok(outcome) => debug!(session = %session, ?outcome, "poll cycle"),
            Err(e) => warn!(session = %session, error = %e, "capture failed, retrying next cycle"),
        }
        drop(cycle);
        tokio::time::sleep(interval).await;
    }
}

impl PollerInner {
    fn lock_states(&self) -> std::sync::MutexGuard<'_, HashMap<PollerKey, PollerState>> {
        self.states.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed a key's state from the store the first time it is seen.
    fn ensure_state(&self, key: &PollerKey) {
        let mut states = self.lock_states();
        if states.contains_key(key) {
            return;
        }
        let persisted = self.store.get_session_state(&key.session_id, key.tool);
        let state = PollerState {
            last_captured_line: persisted.as_ref().map_or(0, |s| s.last_captured_line),
            in_progress_message_id: persisted.and_then(|s| s.in_progress_message_id),
            ..PollerState::default()
        };
        states.insert(key.clone(), state);
    }

    fn with_state<R>(&self, key: &PollerKey, f: impl FnOnce(&mut PollerState) -> R) -> R {
        let mut states = self.lock_states();
        f(states.entry(key.clone()).or_default())
    }

    async fn emit(&self, event: PollEvent) {
        if self.events.send(event).await.is_err() {
            debug!("poll event receiver dropped");
        }
    }

    async fn tick(&self, key: &PollerKey, session: &str) -> Result<PollOutcome, CaptureError> {
        if !self.mux.has_session(session).await {
            return Ok(PollOutcome::SessionGone);
        }
        let raw = match self
            .mux
            .capture(session, CaptureOptions::last(self.settings.capture_lines))
            .await
        {
            Err(CaptureError::SessionNotFound(_)) => return Ok(PollOutcome::SessionGone),
            other => other?,
        };

        let classified = classify_capture(&raw, key.tool);
        if classified.prompt.is_none() {
            self.answered.clear(&key.session_id, key.tool);
        }
        if classified.detection.is_thinking() {
            return Ok(PollOutcome::Thinking);
        }

        if let Some(prompt) = classified.prompt {
            let prompt_key = prompt.content_key();
            let is_new = self.with_state(key, |s| {
                if s.last_prompt_key == Some(prompt_key) {
                    false
                } else {
                    s.last_prompt_key = Some(prompt_key);
                    true
                }
            });
            if is_new {
                info!(session, question = %prompt.question, "prompt detected");
                self.emit(PollEvent::Prompt {
                    session_id: key.session_id.clone(),
                    tool: key.tool,
                    prompt,
                })
                .await;
            }
            return Ok(PollOutcome::Prompt { emitted: is_new });
        }

        let lines = content_lines(&classified.stripped);
        let total = lines.len();
        let (cursor, fresh_start) = self.with_state(key, |s| {
            s.last_prompt_key = None;
            if s.last_captured_line > total {
                // Scrollback was cleared or trimmed below the cursor.
                s.last_captured_line = 0;
            }
            (s.last_captured_line, s.last_captured_line == 0)
        });
        if cursor == total {
            return Ok(PollOutcome::NoChange);
        }

        let section = lines[cursor..].join("\n");

        if classified.detection.ready_for_input {
            let content = extract_response(&section, key.tool);
            let screen_key = text_key(&transcript_before_prompt(&classified.stripped, key.tool));
            // Right after a cursor reset the screen still shows the previous
            // reply until the agent echoes the new message. Leave the cursor
            // alone so the real reply is read from the top. Any change to the
            // conversation, even a reply identical to the last one, is new.
            let stale = self.with_state(key, |s| {
                fresh_start && s.last_response_screen == Some(screen_key)
            });
            if stale {
                return Ok(PollOutcome::Response { emitted: false });
            }

            let (message_id, emit) = self.with_state(key, |s| {
                s.last_captured_line = total;
                s.last_progress_key = None;
                let message_id = s
                    .in_progress_message_id
                    .take()
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                let emit = !content.is_empty();
                if emit {
                    s.last_response_screen = Some(screen_key);
                }
                (message_id, emit)
            });
            self.store
                .update_session_state(&key.session_id, key.tool, total);
            self.store
                .clear_in_progress_message_id(&key.session_id, key.tool);

            if emit {
                info!(session, lines = total - cursor, "response complete");
                self.emit(PollEvent::Response {
                    session_id: key.session_id.clone(),
                    tool: key.tool,
                    message_id,
                    content,
                })
                .await;
            }
            return Ok(PollOutcome::Response { emitted: emit });
        }

        let content = extract_partial_response(&section, key.tool);
        let content_key = text_key(&content);
        if content.is_empty() {
            return Ok(PollOutcome::NoChange);
        }
        let update = self.with_state(key, |s| {
            if s.last_progress_key == Some(content_key) {
                return None;
            }
            s.last_progress_key = Some(content_key);
            let id = s
                .in_progress_message_id
                .get_or_insert_with(|| Uuid::new_v4().to_string())
                .clone();
            Some(id)
        });
        let Some(message_id) = update else {
            return Ok(PollOutcome::Progress { emitted: false });
        };
        self.store
            .set_in_progress_message_id(&key.session_id, key.tool, &message_id);
        self.emit(PollEvent::Progress {
            session_id: key.session_id.clone(),
            tool: key.tool,
            message_id,
            content,
        })
        .await;
        Ok(PollOutcome::Progress { emitted: true })
    }
}
