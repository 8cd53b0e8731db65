//! Session endpoints

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::services::session;
use crate::AppState;

/// POST /api/sessions
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<SessionConfig>,
) -> Result<Json<SessionResponse>> {
    let response = session::generate_session(&state.db, auth.user_id, &payload).await?;
    Ok(Json(response))
}

/// GET /api/sessions/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionResponse>> {
    let db_session = state
        .db
        .get_session(session_id)
        .await?
        .filter(|s| s.user_id == auth.user_id)
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

    let questions = state
        .db
        .get_session_questions(session_id)
        .await?
        .iter()
        .map(|q| q.to_api_question())
        .collect();

    Ok(Json(SessionResponse {
        session_id: db_session.id,
        exam_type: db_session.exam_type,
        status: db_session.status,
        questions,
    }))
}

/// POST /api/sessions/:id/submit
pub async fn submit(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<SubmitSessionRequest>,
) -> Result<Json<SubmitSessionResponse>> {
    let response =
        session::submit_session(&state.db, auth.user_id, session_id, &payload.answers).await?;
    Ok(Json(response))
}
