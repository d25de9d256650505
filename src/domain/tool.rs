//! Tool variant identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The interchangeable CLI agent backends a session can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolVariant {
    /// Claude Code CLI
    #[default]
    Claude,
    /// OpenAI Codex CLI
    Codex,
    /// Google Gemini CLI
    Gemini,
    /// vibe-local (local model REPL)
    VibeLocal,
}

impl ToolVariant {
    /// Every supported variant, in catalog order.
    pub const ALL: [ToolVariant; 4] = [
        ToolVariant::Claude,
        ToolVariant::Codex,
        ToolVariant::Gemini,
        ToolVariant::VibeLocal,
    ];

    /// Returns the canonical name for this variant.
    pub fn name(&self) -> &'static str {
        match self {
            ToolVariant::Claude => "claude",
            ToolVariant::Codex => "codex",
            ToolVariant::Gemini => "gemini",
            ToolVariant::VibeLocal => "vibe-local",
        }
    }

    /// Returns the default binary launched for this variant.
    pub fn default_binary(&self) -> &'static str {
        match self {
            ToolVariant::VibeLocal => "vibe-local",
            other => other.name(),
        }
    }
}

impl fmt::Display for ToolVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tool '{0}' (expected claude, codex, gemini or vibe-local)")]
pub struct UnknownTool(pub String);

impl FromStr for ToolVariant {
    type Err = UnknownTool;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claude" => Ok(ToolVariant::Claude),
            "codex" => Ok(ToolVariant::Codex),
            "gemini" => Ok(ToolVariant::Gemini),
            "vibe-local" | "vibe_local" | "vibelocal" => Ok(ToolVariant::VibeLocal),
            _ => Err(UnknownTool(s.to_string())),
        }
    }
}
