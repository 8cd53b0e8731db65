//! Core types for the adaptive learning engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConfigError;

/// Candidate question as seen by the sampler.
///
/// Owned by the question store; immutable from the engine's
/// perspective. Only the fields the selection math needs are here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    /// Difficulty in [0, 1]; 0.5 is "moderate".
    pub difficulty: f64,
    /// Skill-area labels, e.g. "grammar", "vocabulary". Unique per
    /// question, unordered.
    pub tags: Vec<String>,
}

/// Per-(user, tag) mastery record.
///
/// Polarity: `score` is MASTERY, higher means stronger. The sampler
/// inverts it (`1 - score`) when it wants "how weak". Every consumer
/// must read it as mastery and invert locally if needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaknessRecord {
    /// Exponentially smoothed mastery estimate in [0, 1].
    pub score: f64,
    pub total_attempts: u32,
    pub correct_count: u32,
}

impl Default for WeaknessRecord {
    fn default() -> Self {
        // 0.5 = unknown, assume average.
        Self {
            score: 0.5,
            total_attempts: 0,
            correct_count: 0,
        }
    }
}

/// One graded attempt, expanded over its tags by the weakness model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptResult {
    pub tags: Vec<String>,
    pub is_correct: bool,
}

/// Per-(user, question) spaced-repetition scheduling state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewState {
    /// SM-2 easiness factor, floored at 1.3.
    pub ease_factor: f64,
    /// Days until the next review. 0 only before the first review.
    pub interval_days: u32,
    /// Consecutive successful reviews since the last lapse.
    pub repetition: u32,
}

impl Default for ReviewState {
    fn default() -> Self {
        Self {
            ease_factor: 2.5,
            interval_days: 0,
            repetition: 0,
        }
    }
}

/// Blend coefficients for the selection-weight formula.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BlendWeights {
    /// Weakness-complement term.
    pub alpha: f64,
    /// Difficulty-centering term.
    pub beta: f64,
    /// Recent-error-rate term.
    pub gamma: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            beta: 0.3,
            gamma: 0.2,
        }
    }
}

/// Session generation parameters.
///
/// A closed record with named fields; the orchestrator validates it
/// before touching any store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub exam_type: String,
    pub question_count: u32,
    #[serde(default)]
    pub focus_tags: Vec<String>,
}

impl SessionConfig {
    /// Upper bound on questions per session; keeps pool queries sane.
    pub const MAX_QUESTION_COUNT: u32 = 100;

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.exam_type.trim().is_empty() {
            return Err(ConfigError::EmptyExamType);
        }
        if self.question_count == 0 {
            return Err(ConfigError::ZeroQuestionCount);
        }
        if self.question_count > Self::MAX_QUESTION_COUNT {
            return Err(ConfigError::QuestionCountTooLarge {
                requested: self.question_count,
                max: Self::MAX_QUESTION_COUNT,
            });
        }
        if let Some(tag) = self.focus_tags.iter().find(|t| t.trim().is_empty()) {
            return Err(ConfigError::BlankFocusTag {
                position: self
                    .focus_tags
                    .iter()
                    .position(|t| t == tag)
                    .unwrap_or_default(),
            });
        }
        Ok(())
    }
}
