//! Spaced review endpoints

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;

use crate::error::Result;
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

const DEFAULT_DUE_LIMIT: i32 = 50;

/// GET /api/reviews/due
pub async fn due(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<DueReviewsQuery>,
) -> Result<Json<DueReviewsResponse>> {
    let today = Utc::now().date_naive();
    let limit = query.limit.unwrap_or(DEFAULT_DUE_LIMIT).clamp(1, 500);

    let reviews = state
        .db
        .get_due_reviews(auth.user_id, today, limit as i64)
        .await?
        .iter()
        .map(|r| r.to_due_review())
        .collect();

    Ok(Json(DueReviewsResponse { reviews }))
}
