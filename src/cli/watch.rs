//! Watch command: stream poll events from a live session

use anyhow::{Result, bail};
use tracing::info;

use panewarden::ToolVariant;
use panewarden::auto_yes::{format_time_remaining, parse_duration_label};
use panewarden::config::Config;
use panewarden::poller::PollEvent;

use super::tmux_supervisor;

pub async fn watch_command(
    config: Config,
    session_id: &str,
    tool: ToolVariant,
    auto_yes: Option<String>,
    stop_pattern: Option<String>,
) -> Result<()> {
    let (supervisor, mut events) = tmux_supervisor(config)?;

    let session = supervisor.session_name(session_id, tool)?;
    let status = supervisor.session_status(session_id, tool).await?;
    if status.reason == panewarden::StatusReason::NoSession {
        bail!("tmux session {} not found", session);
    }

    if let Some(label) = auto_yes {
        let duration_ms = parse_duration_label(&label)?;
        let state = supervisor
            .enable_auto_yes(session_id, tool, Some(duration_ms), stop_pattern.as_deref())
            .await?;
        eprintln!(
            "auto-yes on for {} (until {})",
            format_time_remaining(state.expires_at),
            state.expires_at.format("%H:%M:%S")
        );
    }

    supervisor.start_polling(session_id, tool)?;
    info!(session = %session, "watching");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => {
                let Some(event) = event else { break };
                print_event(&event);
                if matches!(event, PollEvent::SessionEnded { .. }) {
                    break;
                }
            }
        }
    }

    supervisor.shutdown().await;
    if let Some(state) = supervisor.get_auto_yes_state(session_id) {
        if let Some(reason) = state.stop_reason {
            eprintln!("auto-yes stopped: {:?}", reason);
        }
    }
    Ok(())
}

fn print_event(event: &PollEvent) {
    match event {
        PollEvent::Prompt { prompt, .. } => {
            println!("[prompt] {}", prompt.question);
            for option in &prompt.options {
                let marker = if option.is_default { ">" } else { " " };
                println!("  {} {}. {}", marker, option.number, option.label);
            }
        }
        PollEvent::Progress { content, .. } => {
            let last = content.lines().last().unwrap_or_default();
            println!("[working] {}", last);
        }
        PollEvent::Response {
            message_id,
            content,
            ..
        } => {
            println!("[response {}]\n{}", message_id, content);
        }
        PollEvent::SessionEnded { session_id, tool } => {
            println!("[ended] {} ({})", session_id, tool);
        }
    }
}
