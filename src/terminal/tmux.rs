//! tmux-backed [`Multiplexer`].

use async_trait::async_trait;
use std::process::Output;
use tokio::process::Command;

use super::{CaptureOptions, Multiplexer};
use crate::error::{CaptureError, SendError, sanitize};

/// Drives a tmux server through its CLI.
#[derive(Debug, Clone)]
pub struct TmuxMultiplexer {
    binary: String,
}

impl Default for TmuxMultiplexer {
    fn default() -> Self {
        Self::new("tmux")
    }
}

impl TmuxMultiplexer {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> std::io::Result<Output> {
        Command::new(&self.binary).args(args).output().await
    }
}

/// tmux reports a missing session or server on stderr rather than through
/// a distinct exit code.
fn is_missing_session(stderr: &str) -> bool {
    let lower = stderr.to_ascii_lowercase();
    lower.contains("can't find")
        || lower.contains("no server running")
        || lower.contains("session not found")
        || lower.contains("error connecting")
}

#[async_trait]
impl Multiplexer for TmuxMultiplexer {
    async fn capture(&self, session: &str, opts: CaptureOptions) -> Result<String, CaptureError> {
        let start = opts.start_line.map(|s| s.to_string());
        let mut args = vec!["capture-pane", "-p", "-e", "-J", "-t", session];
        if let Some(start) = start.as_deref() {
            args.push("-S");
            args.push(start);
        }

        let output = self.run(&args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if is_missing_session(&stderr) {
                return Err(CaptureError::SessionNotFound(session.to_string()));
            }
            return Err(CaptureError::Command {
                session: session.to_string(),
                detail: sanitize(&stderr),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn send_keys(&self, session: &str, text: &str, press_enter: bool) -> Result<(), SendError> {
        let check = |output: Output| -> Result<(), SendError> {
            if output.status.success() {
                return Ok(());
            }
            let stderr = String::from_utf8_lossy(&output.stderr);
            if is_missing_session(&stderr) {
                Err(SendError::SessionNotFound(session.to_string()))
            } else {
                Err(SendError::Command {
                    session: session.to_string(),
                    detail: sanitize(&stderr),
                })
            }
        };

        if !text.is_empty() {
            check(self.run(&["send-keys", "-t", session, "-l", "--", text]).await?)?;
        }
        if press_enter {
            check(self.run(&["send-keys", "-t", session, "Enter"]).await?)?;
        }
        Ok(())
    }

    async fn has_session(&self, session: &str) -> bool {
        let target = format!("={}", session);
        match self.run(&["has-session", "-t", &target]).await {
            Ok(output) => output.status.success(),
            Err(e) => {
                tracing::debug!("tmux has-session failed to run: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_session_messages() {
        assert!(is_missing_session("can't find session: pw-claude-x"));
        assert!(is_missing_session("no server running on /tmp/tmux-0/default"));
        assert!(!is_missing_session("unknown option -- z"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_io_error() {
        let mux = TmuxMultiplexer::new("/nonexistent/tmux-binary");
        let err = mux
            .capture("pw-claude-x", CaptureOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::Io(_)));
        assert!(!mux.has_session("pw-claude-x").await);
    }
}
