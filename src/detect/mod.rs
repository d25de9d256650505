//! Screen classification: status, prompts and responses.

pub mod prompt;
mod response;
pub mod status;

pub use prompt::{
    PROMPT_WINDOW, PromptDetection, PromptOptions, detect_prompt, detect_prompt_for_tool,
    get_answer_input, get_answer_input_for_tool, settle_answer,
};
pub use response::{extract_partial_response, extract_response, transcript_before_prompt};
pub use status::{
    Classification, THINKING_WINDOW, classify_capture, classify_status, detect_session_status,
};
