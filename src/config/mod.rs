//! Configuration loading and management

mod io;

pub use io::{PROJECT_CONFIG, write_config_file};

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::auto_yes::DEFAULT_DURATION_MS;
use crate::terminal::{DEFAULT_SESSION_PREFIX, PasteCorrector};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Response poller settings
    #[serde(default)]
    pub poller: PollerSettings,

    /// Auto-yes loop settings
    #[serde(default)]
    pub auto_yes: AutoYesSettings,

    /// Paste placeholder correction settings
    #[serde(default)]
    pub paste: PasteSettings,

    /// Multiplexer settings
    #[serde(default)]
    pub tmux: TmuxSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollerSettings {
    /// Delay between the end of one poll cycle and the start of the next
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,

    /// Lines of scrollback captured per cycle
    #[serde(default = "default_capture_lines")]
    pub capture_lines: usize,

    /// Upper bound for a single capture call made on behalf of an API request
    #[serde(default = "default_capture_timeout_ms")]
    pub capture_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoYesSettings {
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,

    /// Pause after sending an answer before looking for the next prompt
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Ceiling for the error backoff
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Used when auto-yes is enabled without an explicit duration.
    /// Must be one of the allowed durations.
    #[serde(default = "default_auto_yes_duration_ms")]
    pub default_duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasteSettings {
    #[serde(default = "default_paste_delay_ms")]
    pub delay_ms: u64,

    #[serde(default = "default_paste_max_retries")]
    pub max_retries: u32,

    /// Lines captured when looking for the placeholder
    #[serde(default = "default_paste_check_lines")]
    pub check_lines: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TmuxSettings {
    #[serde(default = "default_tmux_binary")]
    pub binary: String,

    /// Prefix for every session name (`<prefix>-<tool>-<id>`)
    #[serde(default = "default_session_prefix")]
    pub session_prefix: String,
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_capture_lines() -> usize {
    10_000
}

fn default_capture_timeout_ms() -> u64 {
    5000
}

fn default_cooldown_ms() -> u64 {
    5000
}

fn default_max_backoff_ms() -> u64 {
    60_000
}

fn default_auto_yes_duration_ms() -> u64 {
    DEFAULT_DURATION_MS
}

fn default_paste_delay_ms() -> u64 {
    500
}

fn default_paste_max_retries() -> u32 {
    3
}

fn default_paste_check_lines() -> usize {
    10
}

fn default_tmux_binary() -> String {
    "tmux".to_string()
}

fn default_session_prefix() -> String {
    DEFAULT_SESSION_PREFIX.to_string()
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            capture_lines: default_capture_lines(),
            capture_timeout_ms: default_capture_timeout_ms(),
        }
    }
}

impl Default for AutoYesSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            cooldown_ms: default_cooldown_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            default_duration_ms: default_auto_yes_duration_ms(),
        }
    }
}

impl Default for PasteSettings {
    fn default() -> Self {
        Self {
            delay_ms: default_paste_delay_ms(),
            max_retries: default_paste_max_retries(),
            check_lines: default_paste_check_lines(),
        }
    }
}

impl Default for TmuxSettings {
    fn default() -> Self {
        Self {
            binary: default_tmux_binary(),
            session_prefix: default_session_prefix(),
        }
    }
}

impl PollerSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }
}

impl AutoYesSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

impl PasteSettings {
    pub fn corrector(&self) -> PasteCorrector {
        PasteCorrector {
            delay: Duration::from_millis(self.delay_ms),
            max_retries: self.max_retries,
            check_lines: self.check_lines,
        }
    }
}
