//! Text normalization and per-tool pattern tables.

pub mod ansi;
mod catalog;

pub use ansi::{
    content_lines, normalize, strip_ansi, strip_box_drawing, tail_lines, tail_window_start,
};
pub use catalog::{Capabilities, ToolPatterns, ToolProfile, patterns, profile};
