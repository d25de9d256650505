//! Pull the agent's latest reply out of a capture.

use crate::ToolVariant;
use crate::patterns::{content_lines, patterns, strip_box_drawing};

/// Text between the last echoed user input and the trailing input prompt.
///
/// `stripped` must already be ANSI-stripped. Separators, footer hints and
/// leftover spinner lines are dropped; box-drawing glyphs inside the reply
/// (tables, frames) are kept.
pub fn extract_response(stripped: &str, tool: ToolVariant) -> String {
    let p = patterns(tool);
    let lines = content_lines(stripped);
    let unframed: Vec<String> = lines.iter().map(|l| strip_box_drawing(l)).collect();

    let end = unframed
        .iter()
        .rposition(|l| p.is_input_prompt(l))
        .unwrap_or(lines.len());
    let start = unframed[..end]
        .iter()
        .rposition(|l| p.is_input_prompt(l))
        .map(|i| i + 1)
        .unwrap_or(0);

    clean_range(&lines, &unframed, start, end, tool)
}

/// Output written since the last echoed user input, for a reply that is
/// still being produced.
pub fn extract_partial_response(stripped: &str, tool: ToolVariant) -> String {
    let p = patterns(tool);
    let lines = content_lines(stripped);
    let unframed: Vec<String> = lines.iter().map(|l| strip_box_drawing(l)).collect();

    let start = unframed
        .iter()
        .rposition(|l| p.is_input_prompt(l))
        .map(|i| i + 1)
        .unwrap_or(0);

    clean_range(&lines, &unframed, start, lines.len(), tool)
}

/// The conversation above the trailing input prompt, cleaned like a reply.
///
/// Two captures with the same transcript show the same exchange; footers and
/// the prompt row itself do not take part.
pub fn transcript_before_prompt(stripped: &str, tool: ToolVariant) -> String {
    let p = patterns(tool);
    let lines = content_lines(stripped);
    let unframed: Vec<String> = lines.iter().map(|l| strip_box_drawing(l)).collect();

    let end = unframed
        .iter()
        .rposition(|l| p.is_input_prompt(l))
        .unwrap_or(lines.len());

    clean_range(&lines, &unframed, 0, end, tool)
}

fn clean_range(
    lines: &[&str],
    unframed: &[String],
    start: usize,
    end: usize,
    tool: ToolVariant,
) -> String {
    let p = patterns(tool);
    let kept: Vec<&str> = (start..end)
        .filter(|&i| {
            !p.is_separator(lines[i]) && !p.is_noise(&unframed[i]) && !p.is_thinking(&unframed[i])
        })
        .map(|i| lines[i].trim_end())
        .collect();

    let first = kept.iter().position(|l| !l.trim().is_empty());
    let last = kept.iter().rposition(|l| !l.trim().is_empty());
    match (first, last) {
        (Some(f), Some(l)) => kept[f..=l].join("\n"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_between_echo_and_prompt() {
        let text = "\
> old question
old answer
> fix the failing test
⏺ Fixed the assertion in parser.rs.

  All 42 tests pass.
────────────────────
❯
────────────────────
  ? for shortcuts";
        assert_eq!(
            extract_response(text, ToolVariant::Claude),
            "⏺ Fixed the assertion in parser.rs.\n\n  All 42 tests pass."
        );
    }

    #[test]
    fn test_codex_footer_dropped() {
        let text = "› explain\n• The function parses headers.\n\n› \n  ⏎ send   ⌃J newline   91% context left";
        assert_eq!(
            extract_response(text, ToolVariant::Codex),
            "• The function parses headers."
        );
    }

    #[test]
    fn test_no_prompt_returns_everything_clean() {
        let text = "line one\nline two\n";
        assert_eq!(extract_response(text, ToolVariant::VibeLocal), "line one\nline two");
    }

    #[test]
    fn test_only_prompt_is_empty() {
        assert_eq!(extract_response("❯ \n", ToolVariant::Claude), "");
    }

    #[test]
    fn test_partial_response_skips_previous_reply() {
        let text = "› explain\n• Old reply.\n\n› next question\n• New reply so far\n";
        assert_eq!(
            extract_partial_response(text, ToolVariant::Codex),
            "• New reply so far"
        );
    }

    #[test]
    fn test_transcript_ignores_footer_and_prompt() {
        let before = "› run tests\nDone.\n\n› \n  ⏎ send   91% context left";
        let after = "› run tests\nDone.\n\n› \n  ⏎ send   88% context left";
        assert_eq!(
            transcript_before_prompt(before, ToolVariant::Codex),
            "› run tests\nDone."
        );
        assert_eq!(
            transcript_before_prompt(before, ToolVariant::Codex),
            transcript_before_prompt(after, ToolVariant::Codex)
        );
    }

    #[test]
    fn test_transcript_changes_with_new_exchange() {
        let first = "› run tests\nDone.\n\n› ";
        let second = "› run tests\nDone.\n\n› run tests again\nDone.\n\n› ";
        assert_ne!(
            transcript_before_prompt(first, ToolVariant::Codex),
            transcript_before_prompt(second, ToolVariant::Codex)
        );
    }
}
