//! Adaptive learning engine shared by the exam-prep backend.
//!
//! Provides:
//! - Weakness model: exponentially smoothed per-tag mastery estimates
//! - Spaced repetition scheduler (SM-2 derived)
//! - Adaptive sampler: weighted, duplicate-free question selection
//! - Shared types (Question, WeaknessRecord, ReviewState, SessionConfig)
//!
//! Everything here is pure and synchronous; stores and transactions
//! live in the backend.

pub mod error;
pub mod sampler;
pub mod scheduler;
pub mod types;
pub mod weakness;

pub use error::{ConfigError, Result};
pub use sampler::{compute_weights, sample_without_replacement, MIN_WEIGHT};
pub use scheduler::{
    next_review_date, next_review_state, quality_from_performance, LAPSE_THRESHOLD,
    MIN_EASE_FACTOR,
};
pub use types::{
    AttemptResult, BlendWeights, Question, ReviewState, SessionConfig, WeaknessRecord,
};
pub use weakness::{update_weaknesses, DEFAULT_LEARNING_RATE};
