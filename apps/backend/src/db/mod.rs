//! PostgreSQL database operations
//!
//! One wrapper over the pool, split into the stores the orchestrator
//! consumes: questions, weaknesses, review states, sessions. Methods
//! that participate in a session submission take a transaction so the
//! whole read-modify-write cycle is serialized per user.

use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use adaptive_core::{ReviewState, WeaknessRecord};

use crate::error::{ApiError, Result};
use crate::models::*;

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ApiError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Begin a transaction
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        Ok(self.pool.begin().await?)
    }

    // === User Repository ===

    /// Create a new user with generated token
    pub async fn create_user(&self, name: Option<&str>) -> Result<User> {
        let token = Uuid::new_v4().to_string();
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (token, name)
            VALUES ($1, $2)
            RETURNING id, token, name, created_at, last_seen_at
            "#,
        )
        .bind(&token)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get user by token
    pub async fn get_user_by_token(&self, token: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, token, name, created_at, last_seen_at
            FROM users
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Resolve a token to its user and stamp last_seen_at in the same
    /// round trip. Returns None for an unknown token.
    pub async fn touch_user_by_token(&self, token: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET last_seen_at = NOW()
            WHERE token = $1
            RETURNING id, token, name, created_at, last_seen_at
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Lock the user row for the rest of the transaction.
    ///
    /// Row-level FOR UPDATE on weakness and review reads cannot cover
    /// rows that do not exist yet, so submissions serialize on the
    /// user row before touching either table.
    pub async fn lock_user(&self, tx: &mut Transaction<'_, Postgres>, user_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            SELECT id FROM users WHERE id = $1 FOR UPDATE
            "#,
        )
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    // === Question Store ===

    /// Get a question by ID with its tags
    pub async fn get_question(&self, question_id: Uuid) -> Result<Option<DbQuestion>> {
        let question = sqlx::query_as::<_, DbQuestion>(
            r#"
            SELECT q.id, q.exam_type, q.prompt, q.choices, q.correct_choice,
                   q.difficulty, q.expected_time_ms, q.created_at,
                   COALESCE(array_agg(t.tag) FILTER (WHERE t.tag IS NOT NULL), '{}') AS tags
            FROM questions q
            LEFT JOIN question_tags t ON t.question_id = q.id
            WHERE q.id = $1
            GROUP BY q.id
            "#,
        )
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(question)
    }

    /// Get a candidate pool for session generation.
    ///
    /// Matches the exam type AND (tag overlap with the given tags OR
    /// moderate difficulty). The caller passes an oversampled limit so
    /// the sampler has room to work.
    pub async fn get_candidate_questions(
        &self,
        exam_type: &str,
        tags: &[String],
        limit: i64,
    ) -> Result<Vec<DbQuestion>> {
        let questions = sqlx::query_as::<_, DbQuestion>(
            r#"
            SELECT q.id, q.exam_type, q.prompt, q.choices, q.correct_choice,
                   q.difficulty, q.expected_time_ms, q.created_at,
                   COALESCE(array_agg(t.tag) FILTER (WHERE t.tag IS NOT NULL), '{}') AS tags
            FROM questions q
            LEFT JOIN question_tags t ON t.question_id = q.id
            WHERE q.exam_type = $1
            GROUP BY q.id
            HAVING q.difficulty BETWEEN 0.3 AND 0.7
                OR COALESCE(bool_or(t.tag = ANY($2)), FALSE)
            ORDER BY random()
            LIMIT $3
            "#,
        )
        .bind(exam_type)
        .bind(tags)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(questions)
    }

    // === Weakness Store ===

    /// Get all weakness records for a user
    pub async fn get_weaknesses(&self, user_id: Uuid) -> Result<Vec<DbWeakness>> {
        let weaknesses = sqlx::query_as::<_, DbWeakness>(
            r#"
            SELECT user_id, tag, score, total_attempts, correct_count, updated_at
            FROM weaknesses
            WHERE user_id = $1
            ORDER BY score
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(weaknesses)
    }

    /// Get the N lowest-mastery tags for a user
    pub async fn get_weakest_tags(&self, user_id: Uuid, limit: i64) -> Result<Vec<String>> {
        let tags: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT tag
            FROM weaknesses
            WHERE user_id = $1
            ORDER BY score
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    /// Get weakness records for specific tags, locked for update
    pub async fn get_weaknesses_for_tags(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        tags: &[String],
    ) -> Result<Vec<DbWeakness>> {
        let weaknesses = sqlx::query_as::<_, DbWeakness>(
            r#"
            SELECT user_id, tag, score, total_attempts, correct_count, updated_at
            FROM weaknesses
            WHERE user_id = $1 AND tag = ANY($2)
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .bind(tags)
        .fetch_all(&mut **tx)
        .await?;

        Ok(weaknesses)
    }

    /// Upsert a weakness record
    pub async fn upsert_weakness(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        tag: &str,
        record: &WeaknessRecord,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO weaknesses (user_id, tag, score, total_attempts, correct_count)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, tag) DO UPDATE SET
                score = EXCLUDED.score,
                total_attempts = EXCLUDED.total_attempts,
                correct_count = EXCLUDED.correct_count,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(tag)
        .bind(record.score)
        .bind(record.total_attempts as i32)
        .bind(record.correct_count as i32)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Per-tag wrong-answer fraction over the user's last 30 days
    pub async fn get_recent_wrong_rates(&self, user_id: Uuid) -> Result<Vec<(String, f64)>> {
        let rates: Vec<(String, f64)> = sqlx::query_as(
            r#"
            SELECT t.tag,
                   AVG(CASE WHEN a.is_correct THEN 0.0 ELSE 1.0 END)::FLOAT8 AS wrong_rate
            FROM answers a
            JOIN question_tags t ON t.question_id = a.question_id
            WHERE a.user_id = $1
              AND a.answered_at >= NOW() - INTERVAL '30 days'
            GROUP BY t.tag
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rates)
    }

    // === Spaced-Review Store ===

    /// Get a review state, locked for update
    pub async fn get_review_state(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        question_id: Uuid,
    ) -> Result<Option<DbReviewState>> {
        let state = sqlx::query_as::<_, DbReviewState>(
            r#"
            SELECT user_id, question_id, ease_factor, interval_days, repetition,
                   next_review_at, updated_at
            FROM review_states
            WHERE user_id = $1 AND question_id = $2
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .bind(question_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(state)
    }

    /// Upsert a review state
    pub async fn upsert_review_state(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        question_id: Uuid,
        state: &ReviewState,
        next_review_at: NaiveDate,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO review_states (user_id, question_id, ease_factor, interval_days,
                                      repetition, next_review_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, question_id) DO UPDATE SET
                ease_factor = EXCLUDED.ease_factor,
                interval_days = EXCLUDED.interval_days,
                repetition = EXCLUDED.repetition,
                next_review_at = EXCLUDED.next_review_at,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(question_id)
        .bind(state.ease_factor)
        .bind(state.interval_days as i32)
        .bind(state.repetition as i32)
        .bind(next_review_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Get due reviews with their questions, earliest first
    pub async fn get_due_reviews(
        &self,
        user_id: Uuid,
        today: NaiveDate,
        limit: i64,
    ) -> Result<Vec<DbDueReview>> {
        let reviews = sqlx::query_as::<_, DbDueReview>(
            r#"
            SELECT q.id, q.exam_type, q.prompt, q.choices, q.correct_choice,
                   q.difficulty, q.expected_time_ms, q.created_at,
                   COALESCE(array_agg(t.tag) FILTER (WHERE t.tag IS NOT NULL), '{}') AS tags,
                   rs.ease_factor, rs.interval_days, rs.repetition, rs.next_review_at
            FROM review_states rs
            JOIN questions q ON q.id = rs.question_id
            LEFT JOIN question_tags t ON t.question_id = q.id
            WHERE rs.user_id = $1 AND rs.next_review_at <= $2
            GROUP BY q.id, rs.ease_factor, rs.interval_days, rs.repetition, rs.next_review_at
            ORDER BY rs.next_review_at
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(today)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }

    // === Session Store ===

    /// Create a session with its questions in sampled order
    pub async fn create_session(
        &self,
        user_id: Uuid,
        exam_type: &str,
        question_ids: &[Uuid],
    ) -> Result<DbSession> {
        let mut tx = self.begin().await?;

        let session = sqlx::query_as::<_, DbSession>(
            r#"
            INSERT INTO sessions (user_id, exam_type, status)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, exam_type, status, score, created_at, completed_at
            "#,
        )
        .bind(user_id)
        .bind(exam_type)
        .bind(DbSession::STATUS_PENDING)
        .fetch_one(&mut *tx)
        .await?;

        for (position, question_id) in question_ids.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO session_questions (session_id, question_id, position)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(session.id)
            .bind(question_id)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(session)
    }

    /// Get a session by ID
    pub async fn get_session(&self, session_id: Uuid) -> Result<Option<DbSession>> {
        let session = sqlx::query_as::<_, DbSession>(
            r#"
            SELECT id, user_id, exam_type, status, score, created_at, completed_at
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Get a session by ID, locked for update
    pub async fn get_session_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        session_id: Uuid,
    ) -> Result<Option<DbSession>> {
        let session = sqlx::query_as::<_, DbSession>(
            r#"
            SELECT id, user_id, exam_type, status, score, created_at, completed_at
            FROM sessions
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(session_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(session)
    }

    /// Get a session's questions in session order
    pub async fn get_session_questions(&self, session_id: Uuid) -> Result<Vec<DbQuestion>> {
        let questions = sqlx::query_as::<_, DbQuestion>(
            r#"
            SELECT q.id, q.exam_type, q.prompt, q.choices, q.correct_choice,
                   q.difficulty, q.expected_time_ms, q.created_at,
                   COALESCE(array_agg(t.tag) FILTER (WHERE t.tag IS NOT NULL), '{}') AS tags
            FROM session_questions sq
            JOIN questions q ON q.id = sq.question_id
            LEFT JOIN question_tags t ON t.question_id = q.id
            WHERE sq.session_id = $1
            GROUP BY q.id, sq.position
            ORDER BY sq.position
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(questions)
    }

    /// Mark a session completed with its final score
    pub async fn complete_session(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        session_id: Uuid,
        score: f64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE sessions
            SET status = $2, score = $3, completed_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(session_id)
        .bind(DbSession::STATUS_COMPLETED)
        .bind(score)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Insert an answer record
    pub async fn insert_answer(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        answer: &DbAnswer,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO answers (id, session_id, question_id, user_id, selected_choice,
                                is_correct, time_spent_ms, answered_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(answer.id)
        .bind(answer.session_id)
        .bind(answer.question_id)
        .bind(answer.user_id)
        .bind(answer.selected_choice)
        .bind(answer.is_correct)
        .bind(answer.time_spent_ms)
        .bind(answer.answered_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}
