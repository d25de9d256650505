//! Core domain types for panewarden

mod prompt;
mod status;
mod tool;

pub use prompt::{PromptData, PromptOption, PromptStatus, PromptType};
pub use status::{SessionStatus, StatusDetection, StatusReason};
pub use tool::{ToolVariant, UnknownTool};
