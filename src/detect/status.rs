//! Session status classification.
//!
//! Rules run in priority order and the first match wins:
//!
//! 1. a thinking indicator in the last [`THINKING_WINDOW`] non-blank lines
//! 2. an interactive prompt in the last [`PROMPT_WINDOW`](crate::detect::PROMPT_WINDOW)
//!    non-blank lines
//! 3. otherwise `running` (or `idle` when there is no session)
//!
//! The thinking window is deliberately narrow. Spinner phrases stay in
//! scrollback after the agent finishes and must not keep a session "thinking".

use crate::detect::prompt::detect_prompt;
use crate::patterns::{content_lines, normalize, profile, tail_window_start};
use crate::{PromptData, SessionStatus, StatusDetection, StatusReason, ToolVariant};

pub const THINKING_WINDOW: usize = 5;

/// Window in which the tool's input prompt marks the session ready for input.
pub const READY_WINDOW: usize = 10;

/// Classify a raw capture from a live session.
pub fn detect_session_status(raw: &str, tool: ToolVariant) -> StatusDetection {
    classify_status(raw, tool, true)
}

/// Classify a raw capture, taking session liveness into account.
pub fn classify_status(raw: &str, tool: ToolVariant, session_exists: bool) -> StatusDetection {
    if !session_exists {
        return StatusDetection {
            status: SessionStatus::Idle,
            reason: StatusReason::NoSession,
            has_active_prompt: false,
            ready_for_input: false,
        };
    }

    let normalized = normalize(raw);
    let lines = content_lines(&normalized);
    let tool_profile = profile(tool);
    let patterns = &tool_profile.patterns;

    let thinking_start = tail_window_start(&lines, THINKING_WINDOW);
    if lines[thinking_start..].iter().any(|l| patterns.is_thinking(l)) {
        return StatusDetection {
            status: SessionStatus::Thinking,
            reason: StatusReason::ThinkingIndicator,
            has_active_prompt: false,
            ready_for_input: false,
        };
    }

    if detect_prompt(&normalized, &tool_profile.prompt_options).is_prompt {
        return StatusDetection {
            status: SessionStatus::PromptWaiting,
            reason: StatusReason::PromptDetected,
            has_active_prompt: true,
            ready_for_input: false,
        };
    }

    // The input prompt must be the last thing on screen apart from footer
    // noise; an echoed user message above streaming output does not count.
    let ready_start = tail_window_start(&lines, READY_WINDOW);
    let ready_for_input = lines[ready_start..]
        .iter()
        .rposition(|l| patterns.is_input_prompt(l))
        .is_some_and(|i| {
            lines[ready_start + i + 1..]
                .iter()
                .all(|l| l.trim().is_empty() || patterns.is_noise(l))
        });

    StatusDetection {
        status: SessionStatus::Running,
        reason: StatusReason::Default,
        has_active_prompt: false,
        ready_for_input,
    }
}

/// A capture classified end to end.
#[derive(Debug, Clone)]
pub struct Classification {
    pub detection: StatusDetection,
    /// Present only when `detection.has_active_prompt` is true.
    pub prompt: Option<PromptData>,
    /// ANSI-stripped capture, for stop patterns and response extraction.
    pub stripped: String,
}

/// Classify a capture and, only when the classifier reports an active prompt,
/// extract its structured payload.
///
/// Thinking is ruled out before the prompt detector ever runs, so numbered
/// lists inside in-progress output are never read as a choice prompt.
pub fn classify_capture(raw: &str, tool: ToolVariant) -> Classification {
    let detection = detect_session_status(raw, tool);
    let stripped = crate::patterns::strip_ansi(raw);

    let prompt = if detection.has_active_prompt {
        detect_prompt(&stripped, &profile(tool).prompt_options).prompt_data
    } else {
        None
    };

    Classification {
        detection,
        prompt,
        stripped,
    }
}
