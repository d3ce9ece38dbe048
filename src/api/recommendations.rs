use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};

use crate::{
    error::Result,
    models::ApiResponse,
    services::{Recommendation, Recommender},
};

use super::{readable_list, require_user, AppState};

/// GET /api/v1/lists/{id}/recommendations
pub async fn get_recommendations(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(list_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<Recommendation>>>> {
    let user_id = require_user(&headers, &state).await?;
    readable_list(&state, list_id, user_id).await?;

    let game_ids = state.db.list_game_ids(list_id).await?;
    let recommender = Recommender::new(state.catalog.clone());
    let recommendations = match recommender.recommend(&game_ids).await {
        Ok(recommendations) => recommendations,
        Err(e) => {
            tracing::warn!("Recommendations unavailable for list {}: {}", list_id, e);
            Vec::new()
        }
    };

    Ok(Json(ApiResponse::success(recommendations)))
}
