//! Session orchestration: the adaptive feedback loop.
//!
//! Generation reads the user's weakness and recent-error signals,
//! builds an oversampled candidate pool, and lets the sampler pick.
//! Submission grades answers, updates per-tag mastery, and schedules
//! spaced reviews for misses. Submission runs in one transaction with
//! the user row locked, so concurrent submits for the same user
//! cannot interleave their read-modify-write cycles, even on tags or
//! questions that have no stored state yet.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use uuid::Uuid;

use adaptive_core::{
    compute_weights, next_review_date, next_review_state, quality_from_performance,
    sample_without_replacement, update_weaknesses, AttemptResult, BlendWeights, SessionConfig,
    WeaknessRecord, DEFAULT_LEARNING_RATE,
};

use crate::db::Database;
use crate::error::{ApiError, Result};
use crate::models::*;

/// How many weakest tags steer the candidate pool.
const WEAK_TAG_LIMIT: i64 = 5;

/// Pool size relative to the requested session size, so the sampler
/// has room to work.
const POOL_OVERSAMPLE: i64 = 3;

/// Build a new adaptive session for the user.
pub async fn generate_session(
    db: &Database,
    user_id: Uuid,
    config: &SessionConfig,
) -> Result<SessionResponse> {
    config.validate()?;

    let mut steer_tags = db.get_weakest_tags(user_id, WEAK_TAG_LIMIT).await?;
    for tag in &config.focus_tags {
        if !steer_tags.contains(tag) {
            steer_tags.push(tag.clone());
        }
    }

    let limit = config.question_count as i64 * POOL_OVERSAMPLE;
    let pool = db
        .get_candidate_questions(&config.exam_type, &steer_tags, limit)
        .await?;

    let weaknesses: HashMap<String, f64> = db
        .get_weaknesses(user_id)
        .await?
        .into_iter()
        .map(|w| (w.tag, w.score))
        .collect();
    let wrong_rates: HashMap<String, f64> =
        db.get_recent_wrong_rates(user_id).await?.into_iter().collect();

    let candidates: Vec<_> = pool.iter().map(|q| q.to_core_question()).collect();
    let weights = compute_weights(
        &candidates,
        &weaknesses,
        &wrong_rates,
        &BlendWeights::default(),
    );
    let picked = sample_without_replacement(
        &candidates,
        &weights,
        config.question_count as usize,
        &mut rand::thread_rng(),
    );

    let picked_ids: Vec<Uuid> = picked.iter().map(|q| q.id).collect();
    let session = db
        .create_session(user_id, &config.exam_type, &picked_ids)
        .await?;

    // Selection order is session order.
    let by_id: HashMap<Uuid, &DbQuestion> = pool.iter().map(|q| (q.id, q)).collect();
    let questions = picked_ids
        .iter()
        .filter_map(|id| by_id.get(id))
        .map(|q| q.to_api_question())
        .collect();

    tracing::info!(
        session_id = %session.id,
        requested = config.question_count,
        selected = picked_ids.len(),
        pool = pool.len(),
        "generated adaptive session"
    );

    Ok(SessionResponse {
        session_id: session.id,
        exam_type: session.exam_type,
        status: session.status,
        questions,
    })
}

/// Grade a submitted session and feed the results back into the
/// weakness model and the spaced-review queue.
pub async fn submit_session(
    db: &Database,
    user_id: Uuid,
    session_id: Uuid,
    answers: &[AnswerSubmission],
) -> Result<SubmitSessionResponse> {
    if answers.is_empty() {
        return Err(ApiError::BadRequest("no answers submitted".to_string()));
    }

    let mut tx = db.begin().await?;

    // Serializes all weakness and review writes for this user; the
    // per-row locks below cannot cover first-touch rows.
    db.lock_user(&mut tx, user_id).await?;

    let session = db
        .get_session_for_update(&mut tx, session_id)
        .await?
        .filter(|s| s.user_id == user_id)
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

    if session.status != DbSession::STATUS_PENDING {
        return Err(ApiError::Conflict(
            "session already submitted".to_string(),
        ));
    }

    let session_questions = db.get_session_questions(session_id).await?;
    let by_id: HashMap<Uuid, &DbQuestion> =
        session_questions.iter().map(|q| (q.id, q)).collect();

    // Grade and record every answer.
    let now = Utc::now();
    let today = now.date_naive();
    let mut seen: HashSet<Uuid> = HashSet::new();
    let mut graded: Vec<(&DbQuestion, &AnswerSubmission, bool)> = Vec::with_capacity(answers.len());
    let mut results: Vec<AttemptResult> = Vec::with_capacity(answers.len());
    let mut correct_count = 0usize;

    for answer in answers {
        let question = by_id.get(&answer.question_id).ok_or_else(|| {
            ApiError::BadRequest(format!(
                "question {} is not part of this session",
                answer.question_id
            ))
        })?;
        if !seen.insert(answer.question_id) {
            return Err(ApiError::BadRequest(format!(
                "duplicate answer for question {}",
                answer.question_id
            )));
        }

        let is_correct = answer.selected_choice == question.correct_choice;
        if is_correct {
            correct_count += 1;
        }

        results.push(AttemptResult {
            tags: question.tags.clone(),
            is_correct,
        });
        graded.push((question, answer, is_correct));

        db.insert_answer(
            &mut tx,
            &DbAnswer {
                id: Uuid::new_v4(),
                session_id,
                question_id: answer.question_id,
                user_id,
                selected_choice: answer.selected_choice,
                is_correct,
                time_spent_ms: answer.time_spent_ms,
                answered_at: now,
            },
        )
        .await?;
    }

    // Update per-tag mastery over the whole batch.
    let touched_tags: Vec<String> = results
        .iter()
        .flat_map(|r| r.tags.iter().cloned())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let current: HashMap<String, WeaknessRecord> = db
        .get_weaknesses_for_tags(&mut tx, user_id, &touched_tags)
        .await?
        .into_iter()
        .map(|w| (w.tag.clone(), w.to_core_record()))
        .collect();

    for (tag, record) in update_weaknesses(&current, &results, DEFAULT_LEARNING_RATE) {
        db.upsert_weakness(&mut tx, user_id, &tag, &record).await?;
    }

    // Misses enter the spaced-review queue; questions already in the
    // queue get re-scheduled on every answer, right or wrong.
    for (question, answer, is_correct) in &graded {
        let prev = db.get_review_state(&mut tx, user_id, question.id).await?;
        if *is_correct && prev.is_none() {
            continue;
        }

        let prev_state = prev.map(|s| s.to_core_state()).unwrap_or_default();
        let quality = quality_from_performance(
            *is_correct,
            answer.time_spent_ms.max(0) as u32,
            question.expected_time_ms.max(0) as u32,
        );
        let next = next_review_state(&prev_state, quality);
        let due = next_review_date(today, next.interval_days);

        db.upsert_review_state(&mut tx, user_id, question.id, &next, due)
            .await?;
    }

    let total_count = answers.len();
    let score = correct_count as f64 / total_count as f64;
    db.complete_session(&mut tx, session_id, score).await?;

    tx.commit().await?;

    tracing::info!(
        session_id = %session_id,
        correct = correct_count,
        total = total_count,
        "session submitted"
    );

    Ok(SubmitSessionResponse {
        score,
        correct_count,
        total_count,
    })
}
