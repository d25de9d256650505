//! Facade over the detection, polling and auto-yes engines.
//!
//! Route handlers (or the CLI) hold one [`Supervisor`] for the life of the
//! process. It owns both poller registries, the auto-yes registry and the
//! record of answered prompts, so nothing outside it mutates their state
//! directly.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::answered::AnsweredPrompts;
use crate::auto_yes::{AutoYesPoller, AutoYesRegistry, AutoYesState};
use crate::config::Config;
use crate::detect::{classify_capture, settle_answer};
use crate::error::{AnswerError, CaptureError, SupervisorError};
use crate::patterns::profile;
use crate::poller::{PollEvent, ResponsePoller};
use crate::store::SessionStateStore;
use crate::terminal::{
    CaptureOptions, Multiplexer, PasteCorrector, PasteOutcome, SessionNaming,
};
use crate::{PromptData, StatusDetection, ToolVariant};

pub struct Supervisor {
    config: Config,
    mux: Arc<dyn Multiplexer>,
    naming: SessionNaming,
    paste: PasteCorrector,
    answered: Arc<AnsweredPrompts>,
    poller: ResponsePoller,
    auto_yes: AutoYesPoller,
}

impl Supervisor {
    /// Fails only when the configured session prefix or default auto-yes
    /// duration is invalid.
    pub fn new(
        config: Config,
        mux: Arc<dyn Multiplexer>,
        store: Arc<dyn SessionStateStore>,
        events: mpsc::Sender<PollEvent>,
    ) -> Result<Self, SupervisorError> {
        let naming = SessionNaming::new(config.tmux.session_prefix.clone())?;
        let registry = Arc::new(AutoYesRegistry::with_default_duration(
            config.auto_yes.default_duration_ms,
        )?);
        let answered = Arc::new(AnsweredPrompts::new());
        let poller = ResponsePoller::new(
            Arc::clone(&mux),
            store,
            Arc::clone(&answered),
            naming.clone(),
            config.poller.clone(),
            events,
        );
        let auto_yes = AutoYesPoller::new(
            Arc::clone(&mux),
            registry,
            Arc::clone(&answered),
            naming.clone(),
            config.auto_yes.clone(),
        );
        Ok(Self {
            paste: config.paste.corrector(),
            config,
            mux,
            naming,
            answered,
            poller,
            auto_yes,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn poller(&self) -> &ResponsePoller {
        &self.poller
    }

    pub fn auto_yes(&self) -> &AutoYesPoller {
        &self.auto_yes
    }

    pub fn session_name(&self, session_id: &str, tool: ToolVariant) -> Result<String, SupervisorError> {
        Ok(self.naming.session_name(session_id, tool)?)
    }

    /// Capture the full scrollback, bounded by the configured capture timeout.
    pub async fn capture_session_output(
        &self,
        session_id: &str,
        tool: ToolVariant,
    ) -> Result<String, SupervisorError> {
        let timeout = self.config.poller.capture_timeout();
        self.capture_with_timeout(session_id, tool, timeout).await
    }

    pub async fn capture_with_timeout(
        &self,
        session_id: &str,
        tool: ToolVariant,
        timeout: std::time::Duration,
    ) -> Result<String, SupervisorError> {
        let session = self.naming.session_name(session_id, tool)?;
        let capture = self.mux.capture(
            &session,
            CaptureOptions::last(self.config.poller.capture_lines),
        );
        match tokio::time::timeout(timeout, capture).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(CaptureError::Timeout {
                session,
                timeout_ms: timeout.as_millis() as u64,
            }
            .into()),
        }
    }

    /// Classify a live session. A missing session reads as idle.
    pub async fn session_status(
        &self,
        session_id: &str,
        tool: ToolVariant,
    ) -> Result<StatusDetection, SupervisorError> {
        let session = self.naming.session_name(session_id, tool)?;
        if !self.mux.has_session(&session).await {
            return Ok(crate::detect::classify_status("", tool, false));
        }
        let raw = self.capture_session_output(session_id, tool).await?;
        let classified = classify_capture(&raw, tool);
        if classified.prompt.is_none() {
            self.answered.clear(session_id, tool);
        }
        Ok(classified.detection)
    }

    pub fn start_polling(&self, session_id: &str, tool: ToolVariant) -> Result<bool, SupervisorError> {
        Ok(self.poller.start_polling(session_id, tool)?)
    }

    pub async fn stop_polling(&self, session_id: &str, tool: ToolVariant) -> bool {
        self.poller.stop_polling(session_id, tool).await
    }

    pub fn get_active_poller_count(&self) -> usize {
        self.poller.get_active_poller_count()
    }

    /// Enable or disable auto-yes and start or stop its loop to match.
    pub async fn set_auto_yes_enabled(
        &self,
        session_id: &str,
        tool: ToolVariant,
        enabled: bool,
        duration_ms: Option<u64>,
        stop_pattern: Option<&str>,
    ) -> Result<AutoYesState, SupervisorError> {
        let session = self.naming.session_name(session_id, tool)?;
        let registry = self.auto_yes.registry();
        let state = registry.set_auto_yes_enabled(session_id, enabled, duration_ms, stop_pattern)?;
        if !enabled {
            self.auto_yes.stop_auto_yes_polling(session_id).await;
            return Ok(state);
        }
        if !profile(tool).capabilities.auto_yes {
            warn!(session = %session, tool = %tool, "tool does not support auto-yes, loop not started");
            return Ok(state);
        }
        // An existing loop may be bound to another tool.
        self.auto_yes.stop_auto_yes_polling(session_id).await;
        self.auto_yes.start_auto_yes_polling(session_id, tool)?;
        Ok(state)
    }

    pub async fn enable_auto_yes(
        &self,
        session_id: &str,
        tool: ToolVariant,
        duration_ms: Option<u64>,
        stop_pattern: Option<&str>,
    ) -> Result<AutoYesState, SupervisorError> {
        self.set_auto_yes_enabled(session_id, tool, true, duration_ms, stop_pattern)
            .await
    }

    pub async fn disable_auto_yes(
        &self,
        session_id: &str,
        tool: ToolVariant,
    ) -> Result<AutoYesState, SupervisorError> {
        self.set_auto_yes_enabled(session_id, tool, false, None, None)
            .await
    }

    pub fn get_auto_yes_state(&self, session_id: &str) -> Option<AutoYesState> {
        self.auto_yes.registry().get_auto_yes_state(session_id)
    }

    /// Forget a session's auto-yes state and stop its loop.
    pub async fn clear_auto_yes_state(&self, session_id: &str) -> bool {
        self.auto_yes.stop_auto_yes_polling(session_id).await;
        self.auto_yes.registry().clear_auto_yes_state(session_id)
    }

    pub fn get_last_server_response_timestamp(&self, session_id: &str) -> Option<DateTime<Utc>> {
        self.auto_yes
            .registry()
            .get_last_server_response_timestamp(session_id)
    }

    /// Send a user message to the agent.
    ///
    /// Rewinds the response cursor first so the reply is captured in full.
    /// Multi-line input to a tool that can swallow it into a paste
    /// placeholder is followed by a correction pass.
    pub async fn send_message(
        &self,
        session_id: &str,
        tool: ToolVariant,
        text: &str,
    ) -> Result<Option<PasteOutcome>, SupervisorError> {
        let session = self.naming.session_name(session_id, tool)?;
        self.poller.reset_for_new_message(session_id, tool);
        self.answered.clear(session_id, tool);
        self.mux.send_keys(&session, text, true).await?;
        debug!(session = %session, chars = text.chars().count(), "message sent");

        if !(profile(tool).capabilities.paste_correction && text.contains('\n')) {
            return Ok(None);
        }
        let outcome = self.paste.run(self.mux.as_ref(), &session).await?;
        Ok(Some(outcome))
    }

    /// Answer the prompt the session is currently showing.
    ///
    /// A prompt that was already answered (here or by auto-yes) and is still
    /// on screen is rejected with [`AnswerError::AlreadyAnswered`].
    pub async fn answer_prompt(
        &self,
        session_id: &str,
        tool: ToolVariant,
        answer: &str,
    ) -> Result<PromptData, SupervisorError> {
        let session = self.naming.session_name(session_id, tool)?;
        let raw = self.capture_session_output(session_id, tool).await?;
        let classified = classify_capture(&raw, tool);
        let Some(mut prompt) = classified.prompt else {
            self.answered.clear(session_id, tool);
            return Err(AnswerError::NoActivePrompt.into());
        };

        if !self.answered.claim(session_id, tool, &prompt) {
            return Err(AnswerError::AlreadyAnswered.into());
        }
        let input = match settle_answer(&mut prompt, answer, tool) {
            Ok(input) => input,
            Err(e) => {
                self.answered.release(session_id, tool, &prompt);
                return Err(e.into());
            }
        };
        if let Err(e) = self.mux.send_keys(&session, &input, true).await {
            self.answered.release(session_id, tool, &prompt);
            return Err(e.into());
        }
        info!(session = %session, question = %prompt.question, input = %input, "prompt answered");
        Ok(prompt)
    }

    /// Paste-placeholder correction for a session, with the configured timing.
    pub async fn detect_and_resend_if_pasted_text(
        &self,
        session_id: &str,
        tool: ToolVariant,
    ) -> Result<PasteOutcome, SupervisorError> {
        let session = self.naming.session_name(session_id, tool)?;
        Ok(self.paste.run(self.mux.as_ref(), &session).await?)
    }

    /// Stop every response and auto-yes loop and wait for them to finish.
    pub async fn shutdown(&self) {
        futures::future::join(self.poller.stop_all(), self.auto_yes.stop_all()).await;
        info!("supervisor shut down");
    }
}
