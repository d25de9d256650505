//! Time-boxed auto-answer policy.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::Serialize;
use tracing::info;

use crate::error::AutoYesError;
use crate::{PromptData, PromptType};

/// Allowed auto-yes windows: 1h, 3h and 8h.
pub const ALLOWED_DURATIONS_MS: [u64; 3] = [3_600_000, 10_800_000, 28_800_000];

pub const DEFAULT_DURATION_MS: u64 = ALLOWED_DURATIONS_MS[0];

pub const MAX_STOP_PATTERN_LEN: usize = 500;

const DURATION_LABELS: [(&str, u64); 3] = [
    ("1h", ALLOWED_DURATIONS_MS[0]),
    ("3h", ALLOWED_DURATIONS_MS[1]),
    ("8h", ALLOWED_DURATIONS_MS[2]),
];

pub fn validate_duration(duration_ms: u64) -> Result<u64, AutoYesError> {
    if ALLOWED_DURATIONS_MS.contains(&duration_ms) {
        Ok(duration_ms)
    } else {
        Err(AutoYesError::InvalidDuration(duration_ms))
    }
}

/// Parse `1h`, `3h` or `8h`. A bare number is read as milliseconds and must
/// still be one of the allowed durations.
pub fn parse_duration_label(label: &str) -> Result<u64, AutoYesError> {
    let label = label.trim();
    if let Some((_, ms)) = DURATION_LABELS
        .iter()
        .find(|(l, _)| l.eq_ignore_ascii_case(label))
    {
        return Ok(*ms);
    }
    match label.parse::<u64>() {
        Ok(ms) => validate_duration(ms),
        Err(_) => Err(AutoYesError::InvalidDuration(0)),
    }
}

fn compile_stop_pattern(pattern: &str) -> Result<Regex, AutoYesError> {
    if pattern.chars().count() > MAX_STOP_PATTERN_LEN {
        return Err(AutoYesError::StopPatternTooLong {
            max: MAX_STOP_PATTERN_LEN,
        });
    }
    Regex::new(pattern).map_err(|_| AutoYesError::InvalidStopPattern)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Expired,
    StopPatternMatched,
}

/// Auto-yes settings for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoYesState {
    pub enabled: bool,
    pub enabled_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<StopReason>,
}

impl AutoYesState {
    pub fn duration_ms(&self) -> i64 {
        (self.expires_at - self.enabled_at).num_milliseconds()
    }
}

/// Why no answer was produced for a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    AlreadyAnswered,
    NoOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoYesDecision {
    /// Send `answer`, then call [`AutoYesRegistry::record_answer`].
    Answer { answer: String },
    /// Auto-yes was switched off by this decision.
    Stop(StopReason),
    Skip(SkipReason),
}

/// The answer auto-yes gives a prompt: `yes` for yes/no, otherwise the
/// default option, otherwise the first option.
pub fn auto_answer(prompt: &PromptData) -> Option<String> {
    match prompt.prompt_type {
        PromptType::YesNo => Some("yes".to_string()),
        PromptType::MultipleChoice => prompt
            .default_option()
            .or_else(|| prompt.options.first())
            .map(|o| o.number.to_string()),
    }
}

struct Entry {
    state: AutoYesState,
    stop_regex: Option<Regex>,
    last_answered_at: Option<DateTime<Utc>>,
}

impl Entry {
    /// Flip an expired window off. Returns true if this call expired it.
    fn expire(&mut self, now: DateTime<Utc>) -> bool {
        if self.state.enabled && now >= self.state.expires_at {
            self.state.enabled = false;
            self.state.stop_reason = Some(StopReason::Expired);
            true
        } else {
            false
        }
    }
}

/// Owns every session's auto-yes state. Construct one per process and share
/// it by `Arc`.
pub struct AutoYesRegistry {
    default_duration_ms: u64,
    entries: Mutex<HashMap<String, Entry>>,
}

impl Default for AutoYesRegistry {
    fn default() -> Self {
        Self {
            default_duration_ms: DEFAULT_DURATION_MS,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl AutoYesRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `duration_ms` when enabling without an explicit duration.
    pub fn with_default_duration(duration_ms: u64) -> Result<Self, AutoYesError> {
        Ok(Self {
            default_duration_ms: validate_duration(duration_ms)?,
            ..Self::default()
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_auto_yes_enabled(
        &self,
        session_id: &str,
        enabled: bool,
        duration_ms: Option<u64>,
        stop_pattern: Option<&str>,
    ) -> Result<AutoYesState, AutoYesError> {
        self.set_auto_yes_enabled_at(session_id, enabled, duration_ms, stop_pattern, Utc::now())
    }

    /// [`set_auto_yes_enabled`](Self::set_auto_yes_enabled) against an explicit clock.
    pub fn set_auto_yes_enabled_at(
        &self,
        session_id: &str,
        enabled: bool,
        duration_ms: Option<u64>,
        stop_pattern: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<AutoYesState, AutoYesError> {
        if !enabled {
            let mut entries = self.lock();
            let entry = entries.entry(session_id.to_string()).or_insert_with(|| Entry {
                state: AutoYesState {
                    enabled: false,
                    enabled_at: now,
                    expires_at: now,
                    stop_pattern: None,
                    stop_reason: None,
                },
                stop_regex: None,
                last_answered_at: None,
            });
            entry.state.enabled = false;
            info!(session_id, "auto-yes disabled");
            return Ok(entry.state.clone());
        }

        let duration_ms = validate_duration(duration_ms.unwrap_or(self.default_duration_ms))?;
        let stop_pattern = stop_pattern.map(str::trim).filter(|p| !p.is_empty());
        let stop_regex = stop_pattern.map(compile_stop_pattern).transpose()?;

        let state = AutoYesState {
            enabled: true,
            enabled_at: now,
            expires_at: now + Duration::milliseconds(duration_ms as i64),
            stop_pattern: stop_pattern.map(str::to_string),
            stop_reason: None,
        };

        let mut entries = self.lock();
        let last_answered_at = entries
            .get(session_id)
            .and_then(|e| e.last_answered_at);
        entries.insert(
            session_id.to_string(),
            Entry {
                state: state.clone(),
                stop_regex,
                last_answered_at,
            },
        );
        info!(session_id, duration_ms, expires_at = %state.expires_at, "auto-yes enabled");
        Ok(state)
    }

    /// Current state, with an elapsed window switched off on read.
    pub fn get_auto_yes_state(&self, session_id: &str) -> Option<AutoYesState> {
        self.get_auto_yes_state_at(session_id, Utc::now())
    }

    pub fn get_auto_yes_state_at(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Option<AutoYesState> {
        let mut entries = self.lock();
        let entry = entries.get_mut(session_id)?;
        if entry.expire(now) {
            info!(session_id, "auto-yes expired");
        }
        Some(entry.state.clone())
    }

    pub fn is_enabled(&self, session_id: &str) -> bool {
        self.get_auto_yes_state(session_id)
            .is_some_and(|s| s.enabled)
    }

    /// Forget a session entirely. Returns whether there was anything to clear.
    pub fn clear_auto_yes_state(&self, session_id: &str) -> bool {
        self.lock().remove(session_id).is_some()
    }

    /// When auto-yes last sent an answer for this session.
    pub fn get_last_server_response_timestamp(&self, session_id: &str) -> Option<DateTime<Utc>> {
        self.lock().get(session_id).and_then(|e| e.last_answered_at)
    }

    /// Decide what to do about a prompt seen in `output`.
    ///
    /// Whether this exact prompt was already answered is tracked separately
    /// in [`AnsweredPrompts`](crate::answered::AnsweredPrompts), shared with
    /// the manual answer path. A matching stop pattern always wins: auto-yes is disabled and nothing
    /// is sent, even on the tick that would otherwise have answered.
    pub fn decide(&self, session_id: &str, prompt: &PromptData, output: &str) -> AutoYesDecision {
        self.decide_at(session_id, prompt, output, Utc::now())
    }

    pub fn decide_at(
        &self,
        session_id: &str,
        prompt: &PromptData,
        output: &str,
        now: DateTime<Utc>,
    ) -> AutoYesDecision {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(session_id) else {
            return AutoYesDecision::Skip(SkipReason::Disabled);
        };
        if entry.expire(now) {
            info!(session_id, "auto-yes expired");
            return AutoYesDecision::Stop(StopReason::Expired);
        }
        if !entry.state.enabled {
            return AutoYesDecision::Skip(SkipReason::Disabled);
        }

        if entry.stop_regex.as_ref().is_some_and(|re| re.is_match(output)) {
            entry.state.enabled = false;
            entry.state.stop_reason = Some(StopReason::StopPatternMatched);
            info!(session_id, "stop pattern matched, auto-yes disabled");
            return AutoYesDecision::Stop(StopReason::StopPatternMatched);
        }

        match auto_answer(prompt) {
            Some(answer) => AutoYesDecision::Answer { answer },
            None => AutoYesDecision::Skip(SkipReason::NoOptions),
        }
    }

    /// Stamp the time of an answer that was sent.
    pub fn record_answer(&self, session_id: &str) {
        if let Some(entry) = self.lock().get_mut(session_id) {
            entry.last_answered_at = Some(Utc::now());
        }
    }
}

/// Time left until `expires_at`, as `MM:SS` or `H:MM:SS`.
pub fn format_time_remaining(expires_at: DateTime<Utc>) -> String {
    format_time_remaining_at(expires_at, Utc::now())
}

pub fn format_time_remaining_at(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let remaining = (expires_at - now).num_seconds().max(0);
    let hours = remaining / 3600;
    let minutes = (remaining % 3600) / 60;
    let seconds = remaining % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}
