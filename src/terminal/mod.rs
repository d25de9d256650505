//! Terminal multiplexer integration.
//!
//! The supervisor never spawns or kills agent sessions. It only needs three
//! things from the multiplexer, captured by the [`Multiplexer`] trait:
//!
//! - read a session's scrollback ([`Multiplexer::capture`])
//! - type into it ([`Multiplexer::send_keys`])
//! - ask whether it still exists ([`Multiplexer::has_session`])
//!
//! [`TmuxMultiplexer`] implements the trait on top of the tmux CLI. Tests use
//! scripted in-memory implementations.

mod naming;
pub mod paste;
mod tmux;

use async_trait::async_trait;

use crate::error::{CaptureError, SendError};

pub use naming::{
    DEFAULT_SESSION_PREFIX, MAX_SESSION_ID_LEN, SessionNaming, session_name, validate_session_id,
};
pub use paste::{PasteCorrector, PasteOutcome, detect_and_resend_if_pasted_text};
pub use tmux::TmuxMultiplexer;

/// Options for [`Multiplexer::capture`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureOptions {
    /// First line to capture. Negative values count back into scrollback;
    /// `None` captures the visible pane only.
    pub start_line: Option<i64>,
}

impl CaptureOptions {
    /// Capture the last `lines` lines of history.
    pub fn last(lines: usize) -> Self {
        Self {
            start_line: Some(-(lines as i64)),
        }
    }
}

/// Capture/send-keys contract consumed from the terminal multiplexer.
#[async_trait]
pub trait Multiplexer: Send + Sync {
    /// Read a session's pane contents, escape sequences included.
    ///
    /// Fails with [`CaptureError::SessionNotFound`] if the session is gone.
    async fn capture(&self, session: &str, opts: CaptureOptions) -> Result<String, CaptureError>;

    /// Type `text` literally, then press Enter if `press_enter` is set.
    async fn send_keys(&self, session: &str, text: &str, press_enter: bool)
    -> Result<(), SendError>;

    async fn has_session(&self, session: &str) -> bool;
}
