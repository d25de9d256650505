//! Auto-yes: answer detected prompts automatically for a bounded window.
//!
//! [`AutoYesRegistry`] holds per-session state and makes the answer/stop
//! decision; [`AutoYesPoller`] runs the capture loop that feeds it.

mod policy;
mod poller;

pub use policy::{
    ALLOWED_DURATIONS_MS, AutoYesDecision, AutoYesRegistry, AutoYesState, DEFAULT_DURATION_MS,
    MAX_STOP_PATTERN_LEN, SkipReason, StopReason, auto_answer, format_time_remaining,
    format_time_remaining_at, parse_duration_label, validate_duration,
};
pub use poller::{AutoYesOutcome, AutoYesPoller};
