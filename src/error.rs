//! Error types for capture, send, answer and policy operations.
//!
//! Messages are built from sanitized values only: multiplexer stderr and
//! caller-supplied answers pass through [`sanitize`] first so escape
//! sequences never reach a user-facing message.

use crate::patterns::ansi::strip_ansi;

const MAX_DETAIL_CHARS: usize = 64;

/// Strip escape sequences and clamp a detail string for use in an error message.
pub fn sanitize(detail: &str) -> String {
    let clean = strip_ansi(detail);
    let trimmed = clean.trim();
    if trimmed.chars().count() <= MAX_DETAIL_CHARS {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(MAX_DETAIL_CHARS).collect();
    out.push('…');
    out
}

/// Failure reading a session's pane contents.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("capture failed for {session}: {detail}")]
    Command { session: String, detail: String },

    #[error("capture timed out after {timeout_ms}ms for {session}")]
    Timeout { session: String, timeout_ms: u64 },

    #[error("failed to run multiplexer: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure delivering keystrokes to a session.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("send-keys failed for {session}: {detail}")]
    Command { session: String, detail: String },

    #[error("failed to run multiplexer: {0}")]
    Io(#[from] std::io::Error),
}

/// Rejections from the answer path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnswerError {
    #[error("invalid answer '{input}': expected {expected}")]
    InvalidAnswer { input: String, expected: String },

    #[error("prompt has already been answered")]
    AlreadyAnswered,

    #[error("no active prompt in session")]
    NoActivePrompt,
}

impl AnswerError {
    pub(crate) fn invalid(input: &str, expected: impl Into<String>) -> Self {
        AnswerError::InvalidAnswer {
            input: sanitize(input),
            expected: expected.into(),
        }
    }
}

/// Rejected session identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionNameError {
    #[error("session id is empty")]
    Empty,

    #[error("session id contains characters that are not allowed")]
    InvalidCharacters,

    #[error("session id is longer than {max} characters")]
    TooLong { max: usize },
}

/// Rejected auto-yes configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AutoYesError {
    #[error("duration {0}ms is not allowed (allowed: 1h, 3h, 8h)")]
    InvalidDuration(u64),

    #[error("stop pattern is not a valid regular expression")]
    InvalidStopPattern,

    #[error("stop pattern exceeds {max} characters")]
    StopPatternTooLong { max: usize },
}

/// Umbrella error for the [`Supervisor`](crate::Supervisor) facade.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Send(#[from] SendError),

    #[error(transparent)]
    Answer(#[from] AnswerError),

    #[error(transparent)]
    SessionName(#[from] SessionNameError),

    #[error(transparent)]
    AutoYes(#[from] AutoYesError),
}

impl SupervisorError {
    /// Whether the caller supplied bad input (as opposed to an I/O failure).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SupervisorError::Answer(_)
                | SupervisorError::SessionName(_)
                | SupervisorError::AutoYes(_)
        )
    }
}
