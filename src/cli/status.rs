//! Offline classification commands

use anyhow::Result;
use std::path::Path;

use panewarden::ToolVariant;
use panewarden::detect::{detect_prompt_for_tool, detect_session_status};
use panewarden::patterns::strip_ansi;

use super::read_input;

/// Print the session status of captured text
pub fn status_command(tool: ToolVariant, file: Option<&Path>) -> Result<()> {
    let text = read_input(file)?;
    let detection = detect_session_status(&text, tool);
    println!("{}", serde_json::to_string_pretty(&detection)?);
    Ok(())
}

/// Print the prompt detection result for captured text
pub fn detect_command(tool: ToolVariant, file: Option<&Path>) -> Result<()> {
    let text = read_input(file)?;
    let detection = detect_prompt_for_tool(&strip_ansi(&text), tool);
    println!("{}", serde_json::to_string_pretty(&detection)?);
    Ok(())
}
