//! ANSI and box-drawing normalization.
//!
//! Captured panes carry SGR colors, cursor movement, OSC titles and the box
//! frames some tools draw around their input areas. Every classifier works on
//! the output of these functions so patterns only need to match plain text.

use once_cell::sync::Lazy;
use regex::Regex;

/// CSI sequences, OSC strings (BEL or ST terminated), DCS/SOS/PM/APC strings,
/// then any remaining two-byte escape.
static ANSI_SEQUENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[PX^_][^\x1b]*\x1b\\|\x1b[@-Z\\-_]",
    )
    .expect("ANSI sequence pattern is valid")
});

/// Control characters other than newline and tab. Includes stray ESC bytes
/// left by truncated sequences and carriage returns.
static CONTROL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x08\x0b-\x1f\x7f]").expect("control pattern is valid"));

static BOX_DRAWING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\u{2500}-\u{257F}]").expect("box drawing pattern is valid"));

/// Remove ANSI escape sequences and control characters.
///
/// The output never contains ESC, so applying it twice is a no-op.
pub fn strip_ansi(text: &str) -> String {
    let without_sequences = ANSI_SEQUENCE.replace_all(text, "");
    CONTROL_CHARS.replace_all(&without_sequences, "").into_owned()
}

/// Remove box-drawing glyphs (U+2500..U+257F).
pub fn strip_box_drawing(text: &str) -> String {
    BOX_DRAWING.replace_all(text, "").into_owned()
}

/// Both passes, in the order prompt detection expects.
pub fn normalize(text: &str) -> String {
    strip_box_drawing(&strip_ansi(text))
}

/// Lines of `text` with trailing blank lines dropped.
///
/// Panes are padded to their height with empty rows; windows like "the last
/// five lines" are measured from the last line that has content.
pub fn content_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.lines().collect();
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    lines
}

/// Index into `lines` where the last `n` non-blank lines begin.
///
/// Blank rows, including rows left empty by box stripping, do not count, so
/// the frame around an input box cannot push a spinner out of the window.
/// `lines` should already be normalized.
pub fn tail_window_start(lines: &[&str], n: usize) -> usize {
    if n == 0 {
        return lines.len();
    }
    let mut seen = 0;
    for (i, line) in lines.iter().enumerate().rev() {
        if !line.trim().is_empty() {
            seen += 1;
            if seen == n {
                return i;
            }
        }
    }
    0
}

/// The last `n` content lines of `text`.
pub fn tail_lines(text: &str, n: usize) -> Vec<&str> {
    let lines = content_lines(text);
    let start = lines.len().saturating_sub(n);
    lines[start..].to_vec()
}
