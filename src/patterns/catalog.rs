//! Per-tool pattern tables and the tool strategy table.
//!
//! Each [`ToolVariant`] maps to one [`ToolProfile`]: the regexes used to read
//! its screen, the prompt-detection options for its rendering, its session
//! naming tag and what the supervisor may do with it. Lookups are by value;
//! there is no per-tool type hierarchy.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ToolVariant;
use crate::detect::PromptOptions;

/// Regex tables for reading one tool's screen.
#[derive(Debug)]
pub struct ToolPatterns {
    /// Spinner or status lines shown while the agent is generating.
    pub thinking: Vec<Regex>,
    /// The line where the agent accepts input (also matches echoed user input).
    pub input_prompt: Regex,
    /// Horizontal rules drawn between regions. Matched before box stripping.
    pub separator: Regex,
    /// Footer, hint and status-bar lines that are never part of a response.
    pub skip: Vec<Regex>,
    /// Extra words accepted as "yes" for yes/no prompts.
    pub yes_synonyms: &'static [&'static str],
    /// Extra words accepted as "no" for yes/no prompts.
    pub no_synonyms: &'static [&'static str],
}

impl ToolPatterns {
    pub fn is_thinking(&self, line: &str) -> bool {
        self.thinking.iter().any(|re| re.is_match(line))
    }

    pub fn is_input_prompt(&self, line: &str) -> bool {
        self.input_prompt.is_match(line)
    }

    pub fn is_separator(&self, line: &str) -> bool {
        self.separator.is_match(line)
    }

    /// Noise lines: separators and anything in the skip table.
    pub fn is_noise(&self, line: &str) -> bool {
        self.is_separator(line) || self.skip.iter().any(|re| re.is_match(line))
    }
}

/// What the supervisor is allowed to do with a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// The tool's renderer can swallow multi-line input into a paste placeholder.
    pub paste_correction: bool,
    /// Prompts from this tool may be auto-answered.
    pub auto_yes: bool,
}

/// Strategy record for one tool variant.
#[derive(Debug)]
pub struct ToolProfile {
    pub variant: ToolVariant,
    /// Tag embedded in multiplexer session names.
    pub session_tag: &'static str,
    pub patterns: ToolPatterns,
    pub prompt_options: PromptOptions,
    pub capabilities: Capabilities,
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("catalog pattern is valid"))
        .collect()
}

fn single(pattern: &str) -> Regex {
    Regex::new(pattern).expect("catalog pattern is valid")
}

const SEPARATOR: &str = r"^\s*[─━═\-]{8,}\s*$";
const BRAILLE_SPINNER: &str = r"[⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏]";

fn claude() -> ToolProfile {
    ToolProfile {
        variant: ToolVariant::Claude,
        session_tag: "claude",
        patterns: ToolPatterns {
            thinking: compile(&[
                r"^\s*[✻✽✶✳✢·∗]\s*\S.*(?:…|\.\.\.)",
                r"(?i)\besc to interrupt\b",
            ]),
            input_prompt: single(r"^\s*[❯>](?:\s|$)"),
            separator: single(SEPARATOR),
            skip: compile(&[
                r"^\s*\? for shortcuts",
                r"(?i)\besc to interrupt\b",
                r"^\s*⎿\s*$",
                r"(?i)^\s*tip:",
                r"(?i)auto-accept edits on",
                r"(?i)bypass permissions on",
            ]),
            yes_synonyms: &["proceed", "ok"],
            no_synonyms: &["cancel"],
        },
        prompt_options: PromptOptions {
            require_default_indicator: true,
        },
        capabilities: Capabilities {
            paste_correction: true,
            auto_yes: true,
        },
    }
}

fn codex() -> ToolProfile {
    ToolProfile {
        variant: ToolVariant::Codex,
        session_tag: "codex",
        patterns: ToolPatterns {
            thinking: compile(&[
                r"^\s*•\s*(?:Working|Thinking|Planning|Searching|Exploring|Running|Reading|Writing|Analyzing)\b",
                r"(?i)\besc to interrupt\b",
            ]),
            input_prompt: single(r"^\s*›(?:\s|$)"),
            separator: single(SEPARATOR),
            skip: compile(&[
                r"(?i)\d+% context left",
                r"(?i)^\s*⏎ send",
                r"(?i)ctrl \+ j newline",
                r"(?i)\besc to interrupt\b",
            ]),
            yes_synonyms: &["approve", "allow"],
            no_synonyms: &["deny", "reject"],
        },
        prompt_options: PromptOptions {
            require_default_indicator: false,
        },
        capabilities: Capabilities {
            paste_correction: true,
            auto_yes: true,
        },
    }
}

fn gemini() -> ToolProfile {
    ToolProfile {
        variant: ToolVariant::Gemini,
        session_tag: "gemini",
        patterns: ToolPatterns {
            thinking: compile(&[BRAILLE_SPINNER, r"(?i)\(esc to cancel"]),
            input_prompt: single(r"^\s*>(?:\s|$)"),
            separator: single(SEPARATOR),
            skip: compile(&[
                r"(?i)^\s*using:?\s+\d+",
                r"(?i)no sandbox",
                r"(?i)yolo mode",
                r"(?i)context left\)",
                r"(?i)type your message",
            ]),
            yes_synonyms: &["allow", "ok"],
            no_synonyms: &["deny"],
        },
        prompt_options: PromptOptions {
            require_default_indicator: false,
        },
        capabilities: Capabilities {
            paste_correction: false,
            auto_yes: true,
        },
    }
}

fn vibe_local() -> ToolProfile {
    ToolProfile {
        variant: ToolVariant::VibeLocal,
        session_tag: "vibe",
        patterns: ToolPatterns {
            thinking: compile(&[
                r"[⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏]\s*\S",
                r"(?i)^\s*(?:thinking|generating)\b.*(?:\.\.\.|…)",
            ]),
            input_prompt: single(r"^\s*>(?:\s|$)"),
            separator: single(SEPARATOR),
            skip: compile(&[r"(?i)^\s*\[model:", r"(?i)\btokens/s\b"]),
            yes_synonyms: &["ok"],
            no_synonyms: &["cancel"],
        },
        prompt_options: PromptOptions {
            require_default_indicator: false,
        },
        capabilities: Capabilities {
            paste_correction: false,
            auto_yes: true,
        },
    }
}

static CATALOG: Lazy<[ToolProfile; 4]> = Lazy::new(|| [claude(), codex(), gemini(), vibe_local()]);

/// Look up the strategy record for a tool.
pub fn profile(tool: ToolVariant) -> &'static ToolProfile {
    let idx = match tool {
        ToolVariant::Claude => 0,
        ToolVariant::Codex => 1,
        ToolVariant::Gemini => 2,
        ToolVariant::VibeLocal => 3,
    };
    &CATALOG[idx]
}

/// Shortcut for `profile(tool).patterns`.
pub fn patterns(tool: ToolVariant) -> &'static ToolPatterns {
    &profile(tool).patterns
}
