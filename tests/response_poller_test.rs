//! Integration tests for the response poller

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use panewarden::answered::AnsweredPrompts;
use panewarden::config::PollerSettings;
use panewarden::poller::{PollEvent, PollOutcome, ResponsePoller};
use panewarden::store::{MemoryStateStore, SessionStateStore};
use panewarden::terminal::SessionNaming;
use panewarden::{PromptType, ToolVariant};

use common::{CLAUDE_EDIT_MENU, CLAUDE_THINKING, FakeMultiplexer, codex_reply};

struct Harness {
    mux: Arc<FakeMultiplexer>,
    store: Arc<MemoryStateStore>,
    poller: ResponsePoller,
    events: mpsc::Receiver<PollEvent>,
}

fn harness(mux: Arc<FakeMultiplexer>) -> Harness {
    let (tx, events) = mpsc::channel(32);
    let store = Arc::new(MemoryStateStore::new());
    let settings = PollerSettings {
        interval_ms: 5,
        ..PollerSettings::default()
    };
    let poller = ResponsePoller::new(
        mux.clone(),
        store.clone(),
        Arc::new(AnsweredPrompts::new()),
        SessionNaming::default(),
        settings,
        tx,
    );
    Harness {
        mux,
        store,
        poller,
        events,
    }
}

fn drain(events: &mut mpsc::Receiver<PollEvent>) -> Vec<PollEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

#[tokio::test]
async fn test_start_polling_twice_keeps_one_cycle() {
    let h = harness(FakeMultiplexer::with_screens([CLAUDE_THINKING]));

    assert!(h.poller.start_polling("s1", ToolVariant::Claude).unwrap());
    assert_eq!(h.poller.get_active_poller_count(), 1);
    assert!(!h.poller.start_polling("s1", ToolVariant::Claude).unwrap());
    assert_eq!(h.poller.get_active_poller_count(), 1);

    // Same session, different tool is a different key
    assert!(h.poller.start_polling("s1", ToolVariant::Codex).unwrap());
    assert_eq!(h.poller.get_active_poller_count(), 2);

    h.poller.stop_all().await;
    assert_eq!(h.poller.get_active_poller_count(), 0);
}

#[tokio::test]
async fn test_stop_polling_is_idempotent_and_final() {
    let h = harness(FakeMultiplexer::with_screens([CLAUDE_THINKING]));
    h.poller.start_polling("s1", ToolVariant::Claude).unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert!(h.poller.stop_polling("s1", ToolVariant::Claude).await);
    let captures = h.mux.capture_count();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(h.mux.capture_count(), captures);

    assert!(!h.poller.stop_polling("s1", ToolVariant::Claude).await);
    assert!(!h.poller.is_polling("s1", ToolVariant::Claude));
}

#[tokio::test]
async fn test_rejects_unsafe_session_id() {
    let h = harness(FakeMultiplexer::new());
    assert!(h.poller.start_polling("../etc", ToolVariant::Claude).is_err());
    assert_eq!(h.poller.get_active_poller_count(), 0);
}

#[tokio::test]
async fn test_completed_response_emitted_once() {
    let mut h = harness(FakeMultiplexer::with_screens([codex_reply(
        "explain",
        "• The function parses headers.",
    )]));

    let outcome = h.poller.poll_once("s1", ToolVariant::Codex).await.unwrap();
    assert_eq!(outcome, PollOutcome::Response { emitted: true });
    let again = h.poller.poll_once("s1", ToolVariant::Codex).await.unwrap();
    assert_eq!(again, PollOutcome::NoChange);

    let events = drain(&mut h.events);
    assert_eq!(events.len(), 1);
    match &events[0] {
        PollEvent::Response { content, .. } => {
            assert_eq!(content, "• The function parses headers.")
        }
        other => panic!("unexpected event {:?}", other),
    }

    let stored = h.store.get_session_state("s1", ToolVariant::Codex).unwrap();
    assert_eq!(stored.last_captured_line, 5);
    assert!(stored.in_progress_message_id.is_none());
}

#[tokio::test]
async fn test_thinking_emits_nothing() {
    let mut h = harness(FakeMultiplexer::with_screens([CLAUDE_THINKING]));
    let outcome = h.poller.poll_once("s1", ToolVariant::Claude).await.unwrap();
    assert_eq!(outcome, PollOutcome::Thinking);
    assert!(drain(&mut h.events).is_empty());
}

#[tokio::test]
async fn test_same_prompt_emitted_once() {
    let mut h = harness(FakeMultiplexer::with_screens([CLAUDE_EDIT_MENU]));

    let first = h.poller.poll_once("s1", ToolVariant::Claude).await.unwrap();
    let second = h.poller.poll_once("s1", ToolVariant::Claude).await.unwrap();
    assert_eq!(first, PollOutcome::Prompt { emitted: true });
    assert_eq!(second, PollOutcome::Prompt { emitted: false });

    let events = drain(&mut h.events);
    assert_eq!(events.len(), 1);
    let PollEvent::Prompt { prompt, .. } = &events[0] else {
        panic!("expected a prompt event, got {:?}", events[0]);
    };
    assert_eq!(prompt.prompt_type, PromptType::MultipleChoice);
    assert_eq!(prompt.options.len(), 3);
    assert_eq!(prompt.default_option().map(|o| o.number), Some(1));

    // Once the prompt goes away, showing it again is a new prompt
    h.mux
        .set_screen("⏺ Edit applied.\n\n────────────\n❯ \n────────────\n  ? for shortcuts\n");
    h.poller.poll_once("s1", ToolVariant::Claude).await.unwrap();
    h.mux.set_screen(CLAUDE_EDIT_MENU);
    let third = h.poller.poll_once("s1", ToolVariant::Claude).await.unwrap();
    assert_eq!(third, PollOutcome::Prompt { emitted: true });
}

#[tokio::test]
async fn test_cursor_resets_when_scrollback_shrinks() {
    let mut h = harness(FakeMultiplexer::with_screens([codex_reply(
        "explain",
        "• The function parses headers.",
    )]));
    h.poller.poll_once("s1", ToolVariant::Codex).await.unwrap();
    assert_eq!(
        h.poller.state("s1", ToolVariant::Codex).unwrap().last_captured_line,
        5
    );

    // Screen cleared: fewer lines than the cursor
    h.mux.set_screen("› ok\nDone.\n› \n");
    let outcome = h.poller.poll_once("s1", ToolVariant::Codex).await.unwrap();
    assert_eq!(outcome, PollOutcome::Response { emitted: true });
    assert_eq!(
        h.poller.state("s1", ToolVariant::Codex).unwrap().last_captured_line,
        3
    );

    let contents: Vec<String> = drain(&mut h.events)
        .into_iter()
        .filter_map(|e| match e {
            PollEvent::Response { content, .. } => Some(content),
            _ => None,
        })
        .collect();
    assert_eq!(contents, vec!["• The function parses headers.", "Done."]);
}

#[tokio::test]
async fn test_reset_for_new_message_skips_stale_reply() {
    let first = codex_reply("explain", "• The function parses headers.");
    let mut h = harness(FakeMultiplexer::with_screens([first.clone()]));
    h.poller.poll_once("s1", ToolVariant::Codex).await.unwrap();
    drain(&mut h.events);

    h.poller.reset_for_new_message("s1", ToolVariant::Codex);
    assert_eq!(
        h.store
            .get_session_state("s1", ToolVariant::Codex)
            .unwrap()
            .last_captured_line,
        0
    );

    // Agent has not echoed the new message yet
    let stale = h.poller.poll_once("s1", ToolVariant::Codex).await.unwrap();
    assert_eq!(stale, PollOutcome::Response { emitted: false });

    // Reply streaming in
    h.mux.set_screen(
        "› explain\n• The function parses headers.\n\n› and the body?\n• The body is read\n",
    );
    let progress = h.poller.poll_once("s1", ToolVariant::Codex).await.unwrap();
    assert_eq!(progress, PollOutcome::Progress { emitted: true });
    let in_progress = h
        .store
        .get_session_state("s1", ToolVariant::Codex)
        .unwrap()
        .in_progress_message_id
        .expect("in-progress marker set");

    // Reply finished
    h.mux.set_screen(
        "› explain\n• The function parses headers.\n\n› and the body?\n• The body is read lazily.\n\n› \n  ⏎ send   91% context left\n",
    );
    let done = h.poller.poll_once("s1", ToolVariant::Codex).await.unwrap();
    assert_eq!(done, PollOutcome::Response { emitted: true });

    let events = drain(&mut h.events);
    assert_eq!(events.len(), 2);
    match (&events[0], &events[1]) {
        (
            PollEvent::Progress {
                message_id: progress_id,
                content: partial,
                ..
            },
            PollEvent::Response {
                message_id,
                content,
                ..
            },
        ) => {
            assert_eq!(partial, "• The body is read");
            assert_eq!(content, "• The body is read lazily.");
            assert_eq!(progress_id, &in_progress);
            assert_eq!(message_id, &in_progress);
        }
        other => panic!("unexpected events {:?}", other),
    }
    assert!(
        h.store
            .get_session_state("s1", ToolVariant::Codex)
            .unwrap()
            .in_progress_message_id
            .is_none()
    );
}

#[tokio::test]
async fn test_identical_reply_to_new_message_is_emitted() {
    let mut h = harness(FakeMultiplexer::with_screens(["› run tests\nDone.\n\n› \n"]));
    let first = h.poller.poll_once("s1", ToolVariant::Codex).await.unwrap();
    assert_eq!(first, PollOutcome::Response { emitted: true });

    h.poller.reset_for_new_message("s1", ToolVariant::Codex);
    h.mux.set_screen("› run tests again\nDone.\n\n› \n");
    let second = h.poller.poll_once("s1", ToolVariant::Codex).await.unwrap();
    assert_eq!(second, PollOutcome::Response { emitted: true });
    let third = h.poller.poll_once("s1", ToolVariant::Codex).await.unwrap();
    assert_eq!(third, PollOutcome::NoChange);

    let contents: Vec<String> = drain(&mut h.events)
        .into_iter()
        .filter_map(|e| match e {
            PollEvent::Response { content, .. } => Some(content),
            _ => None,
        })
        .collect();
    assert_eq!(contents, vec!["Done.", "Done."]);
}

#[tokio::test]
async fn test_poll_once_does_not_overlap_loop() {
    let h = harness(FakeMultiplexer::with_screens([CLAUDE_THINKING]));
    h.mux.set_capture_delay(Duration::from_millis(15));
    h.poller.start_polling("s1", ToolVariant::Claude).unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;

    for _ in 0..3 {
        h.poller.poll_once("s1", ToolVariant::Claude).await.unwrap();
    }
    h.poller.stop_all().await;

    assert_eq!(h.mux.max_concurrent_captures(), 1);
}

#[tokio::test]
async fn test_loop_ends_when_session_disappears() {
    let mut h = harness(FakeMultiplexer::with_screens([CLAUDE_THINKING]));
    h.poller.start_polling("s1", ToolVariant::Claude).unwrap();
    h.mux.end_session();

    let event = tokio::time::timeout(Duration::from_secs(2), h.events.recv())
        .await
        .expect("session end reported")
        .expect("channel open");
    assert_eq!(
        event,
        PollEvent::SessionEnded {
            session_id: "s1".to_string(),
            tool: ToolVariant::Claude,
        }
    );
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(h.poller.get_active_poller_count(), 0);
}

#[tokio::test]
async fn test_capture_errors_do_not_stop_the_loop() {
    let h = harness(FakeMultiplexer::with_screens([CLAUDE_THINKING]));
    h.mux.fail_captures(true);
    h.poller.start_polling("s1", ToolVariant::Claude).unwrap();
    tokio::time::sleep(Duration::from_millis(40)).await;

    assert!(h.mux.capture_count() >= 2);
    assert!(h.poller.is_polling("s1", ToolVariant::Claude));
    h.poller.stop_all().await;
}

#[tokio::test]
async fn test_cursor_loaded_from_store() {
    let screen = codex_reply("explain", "• The function parses headers.");
    let h = harness(FakeMultiplexer::with_screens([screen]));
    h.store.update_session_state("s1", ToolVariant::Codex, 5);

    let outcome = h.poller.poll_once("s1", ToolVariant::Codex).await.unwrap();
    assert_eq!(outcome, PollOutcome::NoChange);
}
