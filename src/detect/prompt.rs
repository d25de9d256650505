//! Interactive prompt detection and answer normalization.
//!
//! Two prompt shapes are recognized in the tail of a capture:
//!
//! - **yes/no**: a line carrying a `(y/n)`, `[Y/n]`, `[y/N]` or `(yes/no)`
//!   affordance. Letter case marks the default.
//! - **multiple choice**: a question followed by `1. label` / `1) label`
//!   lines numbered consecutively from 1. A leading cursor glyph (`❯`, `›`,
//!   `>`, `●`, `*`) marks the highlighted, default option.
//!
//! Only the last [`PROMPT_WINDOW`] non-blank lines are searched for the prompt
//! itself, which keeps the detector in agreement with the status classifier.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::AnswerError;
use crate::patterns::{content_lines, normalize, patterns, tail_window_start};
use crate::{PromptData, PromptOption, PromptType, ToolVariant};

/// Number of trailing non-blank lines in which a prompt marker must appear.
pub const PROMPT_WINDOW: usize = 15;

/// How far above the window an option block may extend.
const MAX_BLOCK_LINES: usize = 40;

/// Wrapped label lines tolerated between two options.
const MAX_CONTINUATION_LINES: usize = 2;

/// Lines searched above option 1 for the question.
const QUESTION_LOOKBACK: usize = 5;

static OPTION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:([❯›>●*▶])\s*)?(\d{1,2})[.)]\s+(\S.*?)\s*$")
        .expect("option pattern is valid")
});

static YES_NO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[(\[]\s*(y(?:es)?)\s*/\s*(n(?:o)?)\s*[)\]]").expect("yes/no pattern is valid")
});

/// Per-tool detection knobs, stored in the tool catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PromptOptions {
    /// Reject numbered lists that have no highlighted option. Tools that
    /// always render a cursor on their menus set this to avoid reading plain
    /// numbered output as a prompt.
    pub require_default_indicator: bool,
}

/// Result of [`detect_prompt`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptDetection {
    pub is_prompt: bool,
    /// The prompt block (question through last option) when a prompt was
    /// found, otherwise the whole normalized input.
    pub clean_content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_data: Option<PromptData>,
}

impl PromptDetection {
    fn none(lines: &[&str]) -> Self {
        Self {
            is_prompt: false,
            clean_content: lines.join("\n").trim().to_string(),
            prompt_data: None,
        }
    }
}

struct Candidate {
    /// Index of the last line belonging to the prompt.
    end: usize,
    /// Index of the question line.
    start: usize,
    data: PromptData,
}

/// Detect an active interactive prompt.
///
/// `text` should already be ANSI-stripped; box-drawing glyphs are removed here.
pub fn detect_prompt(text: &str, options: &PromptOptions) -> PromptDetection {
    let normalized = normalize(text);
    let lines = content_lines(&normalized);
    let window_start = tail_window_start(&lines, PROMPT_WINDOW);

    let choice = find_multiple_choice(&lines, window_start, options);
    let yes_no = find_yes_no(&lines, window_start);

    let best = match (choice, yes_no) {
        (Some(c), Some(y)) => Some(if y.end > c.end { y } else { c }),
        (c, y) => c.or(y),
    };

    match best {
        Some(candidate) => PromptDetection {
            is_prompt: true,
            clean_content: lines[candidate.start..=candidate.end]
                .iter()
                .map(|l| l.trim())
                .collect::<Vec<_>>()
                .join("\n"),
            prompt_data: Some(candidate.data),
        },
        None => PromptDetection::none(&lines),
    }
}

/// Convenience wrapper using the tool's catalog options.
pub fn detect_prompt_for_tool(text: &str, tool: ToolVariant) -> PromptDetection {
    detect_prompt(text, &crate::patterns::profile(tool).prompt_options)
}

fn parse_option(line: &str) -> Option<(u32, String, bool)> {
    let caps = OPTION_LINE.captures(line)?;
    let number = caps.get(2)?.as_str().parse::<u32>().ok()?;
    let label = caps.get(3)?.as_str().to_string();
    Some((number, label, caps.get(1).is_some()))
}

fn find_multiple_choice(
    lines: &[&str],
    window_start: usize,
    options: &PromptOptions,
) -> Option<Candidate> {
    let last = (window_start..lines.len())
        .rev()
        .find(|&i| parse_option(lines[i]).is_some())?;

    let floor = last.saturating_sub(MAX_BLOCK_LINES);
    let mut collected: Vec<PromptOption> = Vec::new();
    let mut first_idx = None;
    let mut gap = 0;

    for i in (floor..=last).rev() {
        match parse_option(lines[i]) {
            Some((number, label, marked)) => {
                let expected = collected.last().map(|o| o.number.saturating_sub(1));
                if expected.is_some_and(|e| e != number) {
                    return None;
                }
                collected.push(PromptOption::new(number, label, marked));
                gap = 0;
                if number == 1 {
                    first_idx = Some(i);
                    break;
                }
            }
            None => {
                gap += 1;
                if gap > MAX_CONTINUATION_LINES {
                    return None;
                }
            }
        }
    }

    let first_idx = first_idx?;
    collected.reverse();

    let (question_idx, question) = find_question(lines, first_idx)?;
    let has_default = collected.iter().any(|o| o.is_default);
    if options.require_default_indicator && !has_default {
        return None;
    }
    if !has_default && !question.ends_with('?') {
        return None;
    }

    Some(Candidate {
        end: last,
        start: question_idx,
        data: PromptData::multiple_choice(question, collected),
    })
}

fn find_question(lines: &[&str], first_option: usize) -> Option<(usize, String)> {
    let floor = first_option.saturating_sub(QUESTION_LOOKBACK);
    let mut fallback = None;
    for i in (floor..first_option).rev() {
        let trimmed = lines[i].trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.ends_with('?') {
            return Some((i, trimmed.to_string()));
        }
        if fallback.is_none() {
            fallback = Some((i, trimmed.to_string()));
        }
    }
    fallback
}

fn find_yes_no(lines: &[&str], window_start: usize) -> Option<Candidate> {
    let idx = (window_start..lines.len())
        .rev()
        .find(|&i| YES_NO.is_match(lines[i]))?;
    let caps = YES_NO.captures(lines[idx])?;
    let whole = caps.get(0)?;
    let yes = caps.get(1)?.as_str();
    let no = caps.get(2)?.as_str();

    let default_yes = match (is_upper(yes), is_upper(no)) {
        (true, false) => Some(true),
        (false, true) => Some(false),
        _ => None,
    };

    let line = lines[idx];
    let mut question = format!("{}{}", &line[..whole.start()], &line[whole.end()..])
        .trim()
        .to_string();
    let mut start = idx;
    if question.is_empty() {
        if let Some(prev) = (0..idx).rev().find(|&i| !lines[i].trim().is_empty()) {
            question = lines[prev].trim().to_string();
            start = prev;
        }
    }

    Some(Candidate {
        end: idx,
        start,
        data: PromptData::yes_no(question, default_yes),
    })
}

fn is_upper(token: &str) -> bool {
    token.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

/// Convert a free-form answer into the keystrokes to submit.
///
/// Yes/no prompts accept `y`, `yes`, `n`, `no` in any case. Multiple-choice
/// prompts accept one of the option numbers, or any non-numeric text which is
/// passed through untouched.
pub fn get_answer_input(answer: &str, prompt: &PromptData) -> Result<String, AnswerError> {
    normalize_answer(answer, prompt, &[], &[])
}

/// Like [`get_answer_input`], also accepting the tool's yes/no synonyms.
pub fn get_answer_input_for_tool(
    answer: &str,
    prompt: &PromptData,
    tool: ToolVariant,
) -> Result<String, AnswerError> {
    let p = patterns(tool);
    normalize_answer(answer, prompt, p.yes_synonyms, p.no_synonyms)
}

fn normalize_answer(
    answer: &str,
    prompt: &PromptData,
    yes_synonyms: &[&str],
    no_synonyms: &[&str],
) -> Result<String, AnswerError> {
    let trimmed = answer.trim();
    match prompt.prompt_type {
        PromptType::YesNo => {
            let lower = trimmed.to_lowercase();
            if lower == "y" || lower == "yes" || yes_synonyms.contains(&lower.as_str()) {
                Ok("y".to_string())
            } else if lower == "n" || lower == "no" || no_synonyms.contains(&lower.as_str()) {
                Ok("n".to_string())
            } else {
                Err(AnswerError::invalid(answer, "y, yes, n or no"))
            }
        }
        PromptType::MultipleChoice => {
            if trimmed.is_empty() {
                return Err(AnswerError::invalid(answer, "a choice number or text"));
            }
            match trimmed.parse::<i64>() {
                Ok(n) => {
                    let valid = prompt.option_numbers();
                    if valid.iter().any(|&v| i64::from(v) == n) {
                        Ok(n.to_string())
                    } else {
                        let list = valid
                            .iter()
                            .map(|v| v.to_string())
                            .collect::<Vec<_>>()
                            .join(", ");
                        Err(AnswerError::invalid(answer, format!("one of {}", list)))
                    }
                }
                Err(_) => Ok(answer.to_string()),
            }
        }
    }
}

/// Validate an answer against a prompt and settle it.
///
/// Returns the keystrokes to send. An answered prompt is rejected before the
/// answer is even looked at.
pub fn settle_answer(
    prompt: &mut PromptData,
    answer: &str,
    tool: ToolVariant,
) -> Result<String, AnswerError> {
    if prompt.is_answered() {
        return Err(AnswerError::AlreadyAnswered);
    }
    let input = get_answer_input_for_tool(answer, prompt, tool)?;
    prompt.mark_answered(input.clone())?;
    Ok(input)
}
