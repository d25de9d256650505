//! Auto-answer loop, one per session.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::policy::{AutoYesDecision, AutoYesRegistry, SkipReason};
use crate::ToolVariant;
use crate::answered::AnsweredPrompts;
use crate::config::AutoYesSettings;
use crate::detect::{classify_capture, settle_answer};
use crate::error::{SessionNameError, SupervisorError};
use crate::poller::tasks::{Gate, TaskRegistry};
use crate::terminal::{CaptureOptions, Multiplexer, SessionNaming};

/// Lines captured per auto-yes cycle. Prompts sit at the bottom of the pane.
const AUTO_YES_CAPTURE_LINES: usize = 100;

/// What one auto-yes cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoYesOutcome {
    /// Auto-yes is off (never enabled, disabled, expired or stopped).
    Disabled,
    SessionGone,
    /// Nothing to answer this cycle.
    Idle,
    Answered { input: String },
    Skipped(SkipReason),
}

impl AutoYesOutcome {
    fn ends_loop(&self) -> bool {
        matches!(self, AutoYesOutcome::Disabled | AutoYesOutcome::SessionGone)
    }
}

struct Inner {
    mux: Arc<dyn Multiplexer>,
    registry: Arc<AutoYesRegistry>,
    answered: Arc<AnsweredPrompts>,
    naming: SessionNaming,
    settings: AutoYesSettings,
    tasks: TaskRegistry<String>,
}

#[derive(Clone)]
pub struct AutoYesPoller {
    inner: Arc<Inner>,
}

impl AutoYesPoller {
    /// `answered` is shared with every other path that answers prompts, so
    /// a prompt settled elsewhere is not answered again here.
    pub fn new(
        mux: Arc<dyn Multiplexer>,
        registry: Arc<AutoYesRegistry>,
        answered: Arc<AnsweredPrompts>,
        naming: SessionNaming,
        settings: AutoYesSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                mux,
                registry,
                answered,
                naming,
                settings,
                tasks: TaskRegistry::new(),
            }),
        }
    }

    pub fn registry(&self) -> &Arc<AutoYesRegistry> {
        &self.inner.registry
    }

    /// Start the auto-answer loop for a session. No-op if one is running.
    /// The loop ends on its own once auto-yes is disabled or expires.
    pub fn start_auto_yes_polling(
        &self,
        session_id: &str,
        tool: ToolVariant,
    ) -> Result<bool, SessionNameError> {
        let session = self.inner.naming.session_name(session_id, tool)?;
        let inner = Arc::clone(&self.inner);
        let id = session_id.to_string();
        let started = self.inner.tasks.start(session_id.to_string(), move |gate| {
            tokio::spawn(run_loop(inner, id, tool, session, gate))
        });
        if started {
            info!(session_id, tool = %tool, "auto-yes poller started");
        }
        Ok(started)
    }

    /// Idempotent. No cycle runs after this returns.
    pub async fn stop_auto_yes_polling(&self, session_id: &str) -> bool {
        let stopped = self.inner.tasks.stop(&session_id.to_string()).await;
        if stopped {
            info!(session_id, "auto-yes poller stopped");
        }
        stopped
    }

    pub fn is_auto_yes_polling(&self, session_id: &str) -> bool {
        self.inner.tasks.is_active(&session_id.to_string())
    }

    pub fn get_active_auto_yes_poller_count(&self) -> usize {
        self.inner.tasks.active_count()
    }

    /// Run one cycle now. If a loop is active for the session, waits for
    /// its current cycle so the two never overlap.
    pub async fn poll_once(
        &self,
        session_id: &str,
        tool: ToolVariant,
    ) -> Result<AutoYesOutcome, SupervisorError> {
        let session = self.inner.naming.session_name(session_id, tool)?;
        let gate = self.inner.tasks.gate(&session_id.to_string());
        let _cycle = match &gate {
            Some(gate) => gate.enter().await,
            None => None,
        };
        self.inner.tick(session_id, tool, &session).await
    }

    pub async fn stop_all(&self) {
        self.inner.tasks.stop_all().await;
    }
}

fn backoff(base: Duration, max: Duration, failures: u32) -> Duration {
    let factor = 1u32.checked_shl(failures.min(16)).unwrap_or(u32::MAX);
    base.saturating_mul(factor).min(max)
}

async fn run_loop(
    inner: Arc<Inner>,
    session_id: String,
    tool: ToolVariant,
    session: String,
    gate: Gate,
) {
    let interval = inner.settings.interval();
    let mut failures: u32 = 0;
    loop {
        let Some(cycle) = gate.enter().await else {
            break;
        };
        let delay = match inner.tick(&session_id, tool, &session).await {
            Ok(outcome) if outcome.ends_loop() => {
                info!(session = %session, ?outcome, "auto-yes loop finished");
                break;
            }
            Ok(AutoYesOutcome::Answered { input }) => {
                failures = 0;
                debug!(session = %session, input = %input, "auto-yes cooldown");
                inner.settings.cooldown()
            }
            Ok(_) => {
                failures = 0;
                interval
            }
            Err(e) => {
                failures = failures.saturating_add(1);
                let delay = backoff(interval, inner.settings.max_backoff(), failures);
                warn!(
                    session = %session,
                    error = %e,
                    failures,
                    retry_in_ms = delay.as_millis() as u64,
                    "auto-yes cycle failed"
                );
                delay
            }
        };
        drop(cycle);
        tokio::time::sleep(delay).await;
    }
}

impl Inner {
    async fn tick(
        &self,
        session_id: &str,
        tool: ToolVariant,
        session: &str,
    ) -> Result<AutoYesOutcome, SupervisorError> {
        if !self.registry.is_enabled(session_id) {
            return Ok(AutoYesOutcome::Disabled);
        }
        if !self.mux.has_session(session).await {
            return Ok(AutoYesOutcome::SessionGone);
        }
        let raw = self
            .mux
            .capture(session, CaptureOptions::last(AUTO_YES_CAPTURE_LINES))
            .await?;

        let classified = classify_capture(&raw, tool);
        let Some(mut prompt) = classified.prompt else {
            self.answered.clear(session_id, tool);
            return Ok(AutoYesOutcome::Idle);
        };

        match self.registry.decide(session_id, &prompt, &classified.stripped) {
            AutoYesDecision::Answer { answer } => {
                if !self.answered.claim(session_id, tool, &prompt) {
                    debug!(session, "prompt already answered");
                    return Ok(AutoYesOutcome::Skipped(SkipReason::AlreadyAnswered));
                }
                let sent = match settle_answer(&mut prompt, &answer, tool) {
                    Ok(input) => self
                        .mux
                        .send_keys(session, &input, true)
                        .await
                        .map(|()| input)
                        .map_err(SupervisorError::from),
                    Err(e) => Err(e.into()),
                };
                let input = match sent {
                    Ok(input) => input,
                    Err(e) => {
                        self.answered.release(session_id, tool, &prompt);
                        return Err(e);
                    }
                };
                self.registry.record_answer(session_id);
                info!(session, question = %prompt.question, input = %input, "auto-answered prompt");
                Ok(AutoYesOutcome::Answered { input })
            }
            AutoYesDecision::Stop(reason) => {
                info!(session, ?reason, "auto-yes stopped");
                Ok(AutoYesOutcome::Disabled)
            }
            AutoYesDecision::Skip(SkipReason::Disabled) => Ok(AutoYesOutcome::Disabled),
            AutoYesDecision::Skip(reason) => Ok(AutoYesOutcome::Skipped(reason)),
        }
    }
}
