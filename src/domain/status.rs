use serde::{Deserialize, Serialize};
use std::fmt;

/// Operational state of a supervised session, recomputed from every capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No session process
    #[default]
    Idle,
    /// Session exists and nothing more specific matched
    Running,
    /// Agent is generating output
    Thinking,
    /// Agent is blocked on an interactive prompt
    PromptWaiting,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Idle => write!(f, "idle"),
            SessionStatus::Running => write!(f, "running"),
            SessionStatus::Thinking => write!(f, "thinking"),
            SessionStatus::PromptWaiting => write!(f, "prompt_waiting"),
        }
    }
}

/// Which classification rule produced a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusReason {
    ThinkingIndicator,
    PromptDetected,
    NoSession,
    Default,
}

/// Result of classifying one capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDetection {
    pub status: SessionStatus,
    pub reason: StatusReason,
    /// Single source of truth for "an interactive prompt is on screen".
    pub has_active_prompt: bool,
    /// The tool's input prompt is visible and nothing else is happening.
    pub ready_for_input: bool,
}

impl StatusDetection {
    pub fn is_thinking(&self) -> bool {
        self.status == SessionStatus::Thinking
    }
}
