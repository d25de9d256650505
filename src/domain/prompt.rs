//! Interactive prompt payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::error::AnswerError;

/// Shape of a detected prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptType {
    YesNo,
    MultipleChoice,
}

impl std::fmt::Display for PromptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PromptType::YesNo => write!(f, "yes_no"),
            PromptType::MultipleChoice => write!(f, "multiple_choice"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptStatus {
    #[default]
    Pending,
    Answered,
}

/// One selectable entry of a prompt.
///
/// Yes/no prompts carry exactly two options, `yes` (1) and `no` (2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptOption {
    pub number: u32,
    pub label: String,
    pub is_default: bool,
}

impl PromptOption {
    pub fn new(number: u32, label: impl Into<String>, is_default: bool) -> Self {
        Self {
            number,
            label: label.into(),
            is_default,
        }
    }
}

/// A prompt the agent is blocked on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptData {
    #[serde(rename = "type")]
    pub prompt_type: PromptType,
    pub question: String,
    pub options: Vec<PromptOption>,
    pub status: PromptStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answered_at: Option<DateTime<Utc>>,
}

impl PromptData {
    /// Build a pending yes/no prompt. `default_yes` reflects `[Y/n]` vs `[y/N]`.
    pub fn yes_no(question: impl Into<String>, default_yes: Option<bool>) -> Self {
        Self {
            prompt_type: PromptType::YesNo,
            question: question.into(),
            options: vec![
                PromptOption::new(1, "yes", default_yes == Some(true)),
                PromptOption::new(2, "no", default_yes == Some(false)),
            ],
            status: PromptStatus::Pending,
            answer: None,
            answered_at: None,
        }
    }

    /// Build a pending multiple-choice prompt.
    ///
    /// Only the first option flagged as default keeps the flag.
    pub fn multiple_choice(question: impl Into<String>, mut options: Vec<PromptOption>) -> Self {
        let mut seen_default = false;
        for option in &mut options {
            if option.is_default {
                if seen_default {
                    option.is_default = false;
                }
                seen_default = true;
            }
        }
        Self {
            prompt_type: PromptType::MultipleChoice,
            question: question.into(),
            options,
            status: PromptStatus::Pending,
            answer: None,
            answered_at: None,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.status == PromptStatus::Answered
    }

    pub fn default_option(&self) -> Option<&PromptOption> {
        self.options.iter().find(|o| o.is_default)
    }

    pub fn option_numbers(&self) -> Vec<u32> {
        self.options.iter().map(|o| o.number).collect()
    }

    /// Hash of what the prompt shows (type, question, options).
    ///
    /// Answer state is excluded so a prompt keeps its key once answered.
    pub fn content_key(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.prompt_type.hash(&mut hasher);
        self.question.hash(&mut hasher);
        for option in &self.options {
            option.number.hash(&mut hasher);
            option.label.hash(&mut hasher);
            option.is_default.hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Settle the prompt. A prompt can be answered exactly once.
    pub fn mark_answered(&mut self, answer: impl Into<String>) -> Result<(), AnswerError> {
        if self.is_answered() {
            return Err(AnswerError::AlreadyAnswered);
        }
        self.status = PromptStatus::Answered;
        self.answer = Some(answer.into());
        self.answered_at = Some(Utc::now());
        Ok(())
    }
}
