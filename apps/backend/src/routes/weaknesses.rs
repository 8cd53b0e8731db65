//! Weakness endpoints

use axum::{extract::State, Extension, Json};

use crate::error::Result;
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

/// GET /api/weaknesses
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<WeaknessListResponse>> {
    let weaknesses = state
        .db
        .get_weaknesses(auth.user_id)
        .await?
        .into_iter()
        .map(|w| WeaknessEntry {
            tag: w.tag,
            score: w.score,
            total_attempts: w.total_attempts,
            correct_count: w.correct_count,
        })
        .collect();

    Ok(Json(WeaknessListResponse { weaknesses }))
}
