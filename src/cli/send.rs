//! Outbound commands: send a message, answer a prompt

use anyhow::Result;

use panewarden::ToolVariant;
use panewarden::config::Config;
use panewarden::terminal::PasteOutcome;

use super::tmux_supervisor;

pub async fn send_command(
    config: Config,
    session_id: &str,
    tool: ToolVariant,
    message: &str,
) -> Result<()> {
    let (supervisor, _events) = tmux_supervisor(config)?;
    match supervisor.send_message(session_id, tool, message).await? {
        Some(PasteOutcome::Exhausted { attempts }) => {
            eprintln!("Sent, but the paste placeholder was still visible after {} retries", attempts);
        }
        Some(PasteOutcome::Corrected { attempts }) => {
            println!("Sent (paste placeholder cleared after {} retries)", attempts);
        }
        _ => println!("Sent"),
    }
    Ok(())
}

pub async fn answer_command(
    config: Config,
    session_id: &str,
    tool: ToolVariant,
    answer: &str,
) -> Result<()> {
    let (supervisor, _events) = tmux_supervisor(config)?;
    let prompt = supervisor.answer_prompt(session_id, tool, answer).await?;
    println!("{}", serde_json::to_string_pretty(&prompt)?);
    Ok(())
}
