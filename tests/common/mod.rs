//! Shared test utilities: a scripted multiplexer and a log capture

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing_subscriber::fmt::MakeWriter;

use panewarden::error::{CaptureError, SendError};
use panewarden::terminal::{CaptureOptions, Multiplexer};

/// One recorded `send_keys` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentKeys {
    pub session: String,
    pub text: String,
    pub press_enter: bool,
}

/// In-memory multiplexer driven by a queue of captures.
///
/// Each capture pops the next scripted screen; the last one is repeated once
/// the queue runs dry. An empty script captures as an empty screen.
#[derive(Default)]
pub struct FakeMultiplexer {
    screens: Mutex<VecDeque<String>>,
    last: Mutex<String>,
    sends: Mutex<Vec<SentKeys>>,
    captures: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    gone: AtomicBool,
    fail_captures: AtomicBool,
    capture_delay: Mutex<Option<Duration>>,
}

impl FakeMultiplexer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_screens<I, S>(screens: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mux = Self::default();
        mux.push_screens(screens);
        Arc::new(mux)
    }

    pub fn push_screens<I, S>(&self, screens: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut queue = self.screens.lock().unwrap();
        queue.extend(screens.into_iter().map(Into::into));
    }

    /// Replace the script with a single screen shown from now on.
    pub fn set_screen(&self, screen: impl Into<String>) {
        let mut queue = self.screens.lock().unwrap();
        queue.clear();
        queue.push_back(screen.into());
    }

    pub fn end_session(&self) {
        self.gone.store(true, Ordering::SeqCst);
    }

    pub fn fail_captures(&self, fail: bool) {
        self.fail_captures.store(fail, Ordering::SeqCst);
    }

    /// Make every capture take this long
    pub fn set_capture_delay(&self, delay: Duration) {
        *self.capture_delay.lock().unwrap() = Some(delay);
    }

    pub fn sends(&self) -> Vec<SentKeys> {
        self.sends.lock().unwrap().clone()
    }

    /// Number of Enter-only sends (paste corrections)
    pub fn enter_only_count(&self) -> usize {
        self.sends()
            .iter()
            .filter(|s| s.text.is_empty() && s.press_enter)
            .count()
    }

    pub fn capture_count(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }

    /// Most captures that were ever running at the same time
    pub fn max_concurrent_captures(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Multiplexer for FakeMultiplexer {
    async fn capture(&self, session: &str, _opts: CaptureOptions) -> Result<String, CaptureError> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        let delay = *self.capture_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.gone.load(Ordering::SeqCst) {
            return Err(CaptureError::SessionNotFound(session.to_string()));
        }
        if self.fail_captures.load(Ordering::SeqCst) {
            return Err(CaptureError::Command {
                session: session.to_string(),
                detail: "scripted failure".to_string(),
            });
        }
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.screens.lock().unwrap().pop_front() {
            *last = next;
        }
        Ok(last.clone())
    }

    async fn send_keys(&self, session: &str, text: &str, press_enter: bool) -> Result<(), SendError> {
        if self.gone.load(Ordering::SeqCst) {
            return Err(SendError::SessionNotFound(session.to_string()));
        }
        self.sends.lock().unwrap().push(SentKeys {
            session: session.to_string(),
            text: text.to_string(),
            press_enter,
        });
        Ok(())
    }

    async fn has_session(&self, _session: &str) -> bool {
        !self.gone.load(Ordering::SeqCst)
    }
}

/// Log sink for asserting on structured fields
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }

    /// Install as the thread's default subscriber until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Codex screen with a finished reply and an idle input prompt
pub fn codex_reply(question: &str, reply: &str) -> String {
    format!(
        "› {}\n{}\n\n› \n  ⏎ send   ⌃J newline   91% context left\n",
        question, reply
    )
}

/// Claude edit-permission menu with the cursor on option 1
pub const CLAUDE_EDIT_MENU: &str = "\
⏺ Update(src/parser.rs)
  ⎿  Updated src/parser.rs with 2 additions

Do you want to make this edit to parser.rs?
❯ 1. Yes
  2. Yes, and don't ask again this session
  3. No, and tell Claude what to do differently
";

pub const CLAUDE_THINKING: &str = "\
> fix the failing test
✻ Pondering… (12s · esc to interrupt)
";
