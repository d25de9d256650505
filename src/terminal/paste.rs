//! Recovery from the "[Pasted text #N +M lines]" rendering artifact.
//!
//! Some agent TUIs collapse multi-line input into a placeholder line and leave
//! it sitting in the input box instead of submitting it. After a message is
//! sent we look for that placeholder and press Enter again, a bounded number
//! of times.

use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tracing::{debug, warn};

use super::{CaptureOptions, Multiplexer};
use crate::error::CaptureError;
use crate::patterns::strip_ansi;

static PASTED_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[Pasted text #\d+ \+\d+ lines\]").expect("placeholder pattern is valid")
});

pub const DEFAULT_PASTE_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_CHECK_LINES: usize = 10;

/// Whether `text` still shows an unsubmitted paste placeholder.
pub fn contains_paste_placeholder(text: &str) -> bool {
    PASTED_TEXT.is_match(&strip_ansi(text))
}

/// How a correction pass ended. Never an error: the terminal's state is not
/// ours to guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteOutcome {
    /// No placeholder on the first check.
    Clean,
    /// The placeholder cleared after `attempts` extra Enter presses.
    Corrected { attempts: u32 },
    /// Still present after every retry.
    Exhausted { attempts: u32 },
    /// A corrective Enter could not be delivered.
    SendFailed { attempts: u32 },
}

impl PasteOutcome {
    /// Number of corrective Enter presses sent.
    pub fn attempts(&self) -> u32 {
        match self {
            PasteOutcome::Clean => 0,
            PasteOutcome::Corrected { attempts }
            | PasteOutcome::Exhausted { attempts }
            | PasteOutcome::SendFailed { attempts } => *attempts,
        }
    }

    pub fn corrected(&self) -> bool {
        matches!(self, PasteOutcome::Corrected { .. })
    }

    /// The input box no longer shows a placeholder.
    pub fn is_clear(&self) -> bool {
        matches!(self, PasteOutcome::Clean | PasteOutcome::Corrected { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasteCorrector {
    pub delay: Duration,
    pub max_retries: u32,
    pub check_lines: usize,
}

impl Default for PasteCorrector {
    fn default() -> Self {
        Self {
            delay: DEFAULT_PASTE_DELAY,
            max_retries: DEFAULT_MAX_RETRIES,
            check_lines: DEFAULT_CHECK_LINES,
        }
    }
}

impl PasteCorrector {
    async fn placeholder_visible(
        &self,
        mux: &dyn Multiplexer,
        session: &str,
    ) -> Result<bool, CaptureError> {
        tokio::time::sleep(self.delay).await;
        let captured = mux
            .capture(session, CaptureOptions::last(self.check_lines))
            .await?;
        Ok(contains_paste_placeholder(&captured))
    }

    /// Check for the placeholder and resend Enter until it clears.
    ///
    /// Only a failed capture is returned as an error.
    pub async fn run(
        &self,
        mux: &dyn Multiplexer,
        session: &str,
    ) -> Result<PasteOutcome, CaptureError> {
        if !self.placeholder_visible(mux, session).await? {
            return Ok(PasteOutcome::Clean);
        }

        for attempt in 1..=self.max_retries {
            debug!(session, attempt, "paste placeholder visible, resending Enter");
            if let Err(e) = mux.send_keys(session, "", true).await {
                warn!(session, attempt, error = %e, "failed to resend Enter for pasted text");
                return Ok(PasteOutcome::SendFailed { attempts: attempt });
            }
            if !self.placeholder_visible(mux, session).await? {
                return Ok(PasteOutcome::Corrected { attempts: attempt });
            }
        }

        warn!(
            session,
            max_retries = self.max_retries,
            final_attempt = self.max_retries,
            "pasted text placeholder still present after retries"
        );
        Ok(PasteOutcome::Exhausted {
            attempts: self.max_retries,
        })
    }
}

/// Run a correction pass with the default delay and retry budget.
pub async fn detect_and_resend_if_pasted_text(
    mux: &dyn Multiplexer,
    session: &str,
) -> Result<PasteOutcome, CaptureError> {
    PasteCorrector::default().run(mux, session).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_pattern() {
        assert!(contains_paste_placeholder("> [Pasted text #1 +12 lines]"));
        assert!(contains_paste_placeholder(
            "\x1b[2m[Pasted text #3 +4 lines]\x1b[0m"
        ));
        assert!(!contains_paste_placeholder("[Pasted text]"));
        assert!(!contains_paste_placeholder("> hello"));
    }

    #[test]
    fn test_outcome_accessors() {
        assert_eq!(PasteOutcome::Clean.attempts(), 0);
        assert!(PasteOutcome::Clean.is_clear());
        assert!(PasteOutcome::Corrected { attempts: 2 }.corrected());
        assert!(!PasteOutcome::Exhausted { attempts: 3 }.is_clear());
        assert_eq!(PasteOutcome::SendFailed { attempts: 1 }.attempts(), 1);
    }
}
