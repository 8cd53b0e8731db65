//! Test fixtures and factory functions for creating test data.

use serde_json::json;
use uuid::Uuid;

use hakwon_prep_backend::db::Database;

/// Insert a question with its tags directly into the database.
///
/// All seeded questions use four choices with choice 0 correct.
pub async fn seed_question(
    db: &Database,
    exam_type: &str,
    tags: &[&str],
    difficulty: f64,
) -> Uuid {
    let id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO questions (id, exam_type, prompt, choices, correct_choice, \
         difficulty, expected_time_ms) VALUES ($1, $2, $3, $4, 0, $5, 30000)",
    )
    .bind(id)
    .bind(exam_type)
    .bind(format!("Sample prompt {}", id))
    .bind(vec![
        "choice a".to_string(),
        "choice b".to_string(),
        "choice c".to_string(),
        "choice d".to_string(),
    ])
    .bind(difficulty)
    .execute(db.pool())
    .await
    .expect("Failed to seed question");

    for tag in tags {
        sqlx::query("INSERT INTO question_tags (question_id, tag) VALUES ($1, $2)")
            .bind(id)
            .bind(tag)
            .execute(db.pool())
            .await
            .expect("Failed to seed question tag");
    }

    id
}

/// Create a session generation request body.
pub fn generate_session_request(exam_type: &str, question_count: u32) -> serde_json::Value {
    json!({
        "exam_type": exam_type,
        "question_count": question_count,
    })
}

/// Create a session submission body.
///
/// Each entry is (question_id, selected_choice, time_spent_ms);
/// seeded questions grade choice 0 as correct.
pub fn submit_session_request(answers: &[(Uuid, i32, i32)]) -> serde_json::Value {
    let answers: Vec<serde_json::Value> = answers
        .iter()
        .map(|(question_id, selected_choice, time_spent_ms)| {
            json!({
                "question_id": question_id,
                "selected_choice": selected_choice,
                "time_spent_ms": time_spent_ms,
            })
        })
        .collect();

    json!({ "answers": answers })
}

/// Create a user register request body.
pub fn register_request(name: Option<&str>) -> serde_json::Value {
    match name {
        Some(n) => json!({ "name": n }),
        None => json!({}),
    }
}

/// Generate a unique exam type so test runs don't collide.
pub fn unique_exam_type(prefix: &str) -> String {
    format!("{}_{}", prefix, &Uuid::new_v4().to_string()[..8])
}
