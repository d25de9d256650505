//! Integration tests for paste placeholder correction

mod common;

use std::time::Duration;

use panewarden::terminal::{PasteCorrector, PasteOutcome};

use common::{FakeMultiplexer, LogCapture};

const PLACEHOLDER: &str = "> [Pasted text #1 +12 lines]\n";
const CLEAN: &str = "> \n";

fn fast_corrector() -> PasteCorrector {
    PasteCorrector {
        delay: Duration::from_millis(1),
        ..PasteCorrector::default()
    }
}

#[tokio::test]
async fn test_placeholder_never_clears_sends_three_enters() {
    let logs = LogCapture::default();
    let _guard = logs.install();
    let mux = FakeMultiplexer::with_screens([PLACEHOLDER]);

    let outcome = fast_corrector().run(mux.as_ref(), "pw-claude-s1").await;

    assert_eq!(outcome.unwrap(), PasteOutcome::Exhausted { attempts: 3 });
    assert_eq!(mux.enter_only_count(), 3);
    let output = logs.contents();
    assert!(output.contains("WARN"), "expected a warning, got: {}", output);
    assert!(
        output.contains("max_retries=3"),
        "warning should carry max_retries, got: {}",
        output
    );
}

#[tokio::test]
async fn test_placeholder_then_clean_sends_one_enter() {
    let mux = FakeMultiplexer::with_screens([PLACEHOLDER, CLEAN]);

    let outcome = fast_corrector().run(mux.as_ref(), "pw-claude-s1").await.unwrap();

    assert_eq!(outcome, PasteOutcome::Corrected { attempts: 1 });
    assert!(outcome.corrected());
    assert_eq!(mux.enter_only_count(), 1);
}

#[tokio::test]
async fn test_clean_screen_sends_nothing() {
    let mux = FakeMultiplexer::with_screens([CLEAN]);

    let outcome = fast_corrector().run(mux.as_ref(), "pw-claude-s1").await.unwrap();

    assert_eq!(outcome, PasteOutcome::Clean);
    assert!(mux.sends().is_empty());
    assert_eq!(mux.capture_count(), 1);
}

#[tokio::test]
async fn test_capture_failure_is_the_only_error() {
    let mux = FakeMultiplexer::new();
    mux.fail_captures(true);

    let result = fast_corrector().run(mux.as_ref(), "pw-claude-s1").await;

    assert!(result.is_err());
    assert!(mux.sends().is_empty());
}
