//! Error types for adaptive-core.
//!
//! The algorithms themselves have no failure modes; outputs are
//! clamped into their valid domains instead. The only fallible
//! surface is session-config validation.

use thiserror::Error;

/// Result type alias using ConfigError.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors from validating a [`crate::types::SessionConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("exam_type must not be blank")]
    EmptyExamType,

    #[error("question_count must be at least 1")]
    ZeroQuestionCount,

    #[error("question_count {requested} exceeds maximum {max}")]
    QuestionCountTooLarge { requested: u32, max: u32 },

    #[error("focus_tags[{position}] is blank")]
    BlankFocusTag { position: usize },
}
