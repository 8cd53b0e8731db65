//! Database models and API types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// Re-export shared types from adaptive-core
pub use adaptive_core::types::{
    AttemptResult, BlendWeights, Question, ReviewState, SessionConfig, WeaknessRecord,
};

// === Database Entity Types ===

/// Registered learner account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub token: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// Question stored in PostgreSQL, tags aggregated from question_tags
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbQuestion {
    pub id: Uuid,
    pub exam_type: String,
    pub prompt: String,
    pub choices: Vec<String>,
    pub correct_choice: i32,
    /// Difficulty in [0, 1]
    pub difficulty: f64,
    pub expected_time_ms: i32,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl DbQuestion {
    /// Convert to the sampler's view of a question
    pub fn to_core_question(&self) -> Question {
        Question {
            id: self.id,
            difficulty: self.difficulty,
            tags: self.tags.clone(),
        }
    }

    /// Convert to the API view (answer key withheld)
    pub fn to_api_question(&self) -> ApiQuestion {
        ApiQuestion {
            id: self.id,
            exam_type: self.exam_type.clone(),
            prompt: self.prompt.clone(),
            choices: self.choices.clone(),
            difficulty: self.difficulty,
            expected_time_ms: self.expected_time_ms,
            tags: self.tags.clone(),
        }
    }
}

/// Per-(user, tag) mastery record in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbWeakness {
    pub user_id: Uuid,
    pub tag: String,
    pub score: f64,
    pub total_attempts: i32,
    pub correct_count: i32,
    pub updated_at: DateTime<Utc>,
}

impl DbWeakness {
    /// Convert to adaptive-core WeaknessRecord
    pub fn to_core_record(&self) -> WeaknessRecord {
        WeaknessRecord {
            score: self.score,
            total_attempts: self.total_attempts as u32,
            correct_count: self.correct_count as u32,
        }
    }
}

/// Per-(user, question) scheduling state in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbReviewState {
    pub user_id: Uuid,
    pub question_id: Uuid,
    pub ease_factor: f64,
    pub interval_days: i32,
    pub repetition: i32,
    pub next_review_at: NaiveDate,
    pub updated_at: DateTime<Utc>,
}

impl DbReviewState {
    /// Convert to adaptive-core ReviewState
    pub fn to_core_state(&self) -> ReviewState {
        ReviewState {
            ease_factor: self.ease_factor,
            interval_days: self.interval_days as u32,
            repetition: self.repetition as u32,
        }
    }
}

/// Practice session
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub exam_type: String,
    pub status: String,
    pub score: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl DbSession {
    pub const STATUS_PENDING: &'static str = "pending";
    pub const STATUS_COMPLETED: &'static str = "completed";
}

/// Answer record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAnswer {
    pub id: Uuid,
    pub session_id: Uuid,
    pub question_id: Uuid,
    pub user_id: Uuid,
    pub selected_choice: i32,
    pub is_correct: bool,
    pub time_spent_ms: i32,
    pub answered_at: DateTime<Utc>,
}

/// Due review row: question columns joined with scheduling state
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbDueReview {
    pub id: Uuid,
    pub exam_type: String,
    pub prompt: String,
    pub choices: Vec<String>,
    pub correct_choice: i32,
    pub difficulty: f64,
    pub expected_time_ms: i32,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub ease_factor: f64,
    pub interval_days: i32,
    pub repetition: i32,
    pub next_review_at: NaiveDate,
}

impl DbDueReview {
    /// Convert to the API shape (answer key withheld)
    pub fn to_due_review(&self) -> DueReview {
        DueReview {
            question: ApiQuestion {
                id: self.id,
                exam_type: self.exam_type.clone(),
                prompt: self.prompt.clone(),
                choices: self.choices.clone(),
                difficulty: self.difficulty,
                expected_time_ms: self.expected_time_ms,
                tags: self.tags.clone(),
            },
            next_review_at: self.next_review_at,
            interval_days: self.interval_days,
            ease_factor: self.ease_factor,
            repetition: self.repetition,
        }
    }
}

// === API Request/Response Types ===

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub last_seen_at: DateTime<Utc>,
}

/// Question as exposed to clients: no correct_choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiQuestion {
    pub id: Uuid,
    pub exam_type: String,
    pub prompt: String,
    pub choices: Vec<String>,
    pub difficulty: f64,
    pub expected_time_ms: i32,
    pub tags: Vec<String>,
}

// Session types

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub exam_type: String,
    pub status: String,
    /// Questions in sampled order; this is the session order.
    pub questions: Vec<ApiQuestion>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerSubmission {
    pub question_id: Uuid,
    pub selected_choice: i32,
    pub time_spent_ms: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitSessionRequest {
    pub answers: Vec<AnswerSubmission>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitSessionResponse {
    /// Fraction of correct answers in [0, 1]
    pub score: f64,
    pub correct_count: usize,
    pub total_count: usize,
}

// Spaced review types

#[derive(Debug, Serialize, Deserialize)]
pub struct DueReviewsQuery {
    pub limit: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DueReview {
    pub question: ApiQuestion,
    pub next_review_at: NaiveDate,
    pub interval_days: i32,
    pub ease_factor: f64,
    pub repetition: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DueReviewsResponse {
    pub reviews: Vec<DueReview>,
}

// Weakness types

#[derive(Debug, Serialize, Deserialize)]
pub struct WeaknessEntry {
    pub tag: String,
    /// Mastery score: higher = stronger
    pub score: f64,
    pub total_attempts: i32,
    pub correct_count: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WeaknessListResponse {
    pub weaknesses: Vec<WeaknessEntry>,
}
