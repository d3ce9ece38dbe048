use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use crate::{
    constants::SEARCH_DEFAULT_LIMIT,
    error::{AppError, Result},
    models::{ApiResponse, FranchiseSummary, GameDetails, GameSummary},
    services::search_cache::search_key,
    utils::ensure_page_limit,
};

use super::{require_user, AppState};

const QUERY_MAX_CHARS: usize = 100;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub limit: Option<u32>,
}

fn normalize_query(raw: &str) -> Result<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest("q is required".to_string()));
    }
    if value.chars().count() > QUERY_MAX_CHARS {
        return Err(AppError::BadRequest(format!(
            "q must be at most {} characters",
            QUERY_MAX_CHARS
        )));
    }
    Ok(value.to_string())
}

/// GET /api/v1/games/search
pub async fn search_games(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<GameSummary>>>> {
    require_user(&headers, &state).await?;
    let q = normalize_query(&query.q)?;
    let limit = ensure_page_limit(query.limit, SEARCH_DEFAULT_LIMIT, state.config.max_page_limit)?;

    let key = search_key("games", &q, limit);
    if let Some(cached) = state.search_cache.get::<Vec<GameSummary>>(&key).await {
        return Ok(Json(ApiResponse::success(cached)));
    }

    let games = state.catalog.search_games(&q, limit).await?;
    state.search_cache.put(&key, &games).await;
    Ok(Json(ApiResponse::success(games)))
}

/// GET /api/v1/games/random
pub async fn random_game(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<GameSummary>>> {
    require_user(&headers, &state).await?;
    let game = state
        .catalog
        .random_game()
        .await?
        .ok_or_else(|| AppError::NotFound("No game available".to_string()))?;
    Ok(Json(ApiResponse::success(game)))
}

/// GET /api/v1/games/{id}
pub async fn get_game(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(game_id): Path<i64>,
) -> Result<Json<ApiResponse<GameDetails>>> {
    require_user(&headers, &state).await?;
    let game = state
        .catalog
        .game(game_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Game not found".to_string()))?;
    Ok(Json(ApiResponse::success(game)))
}

/// GET /api/v1/franchises/search
pub async fn search_franchises(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<FranchiseSummary>>>> {
    require_user(&headers, &state).await?;
    let q = normalize_query(&query.q)?;
    let limit = ensure_page_limit(query.limit, SEARCH_DEFAULT_LIMIT, state.config.max_page_limit)?;

    let key = search_key("franchises", &q, limit);
    if let Some(cached) = state.search_cache.get::<Vec<FranchiseSummary>>(&key).await {
        return Ok(Json(ApiResponse::success(cached)));
    }

    let franchises = state.catalog.search_franchises(&q, limit).await?;
    state.search_cache.put(&key, &franchises).await;
    Ok(Json(ApiResponse::success(franchises)))
}

/// GET /api/v1/franchises/random
pub async fn random_franchise(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<FranchiseSummary>>> {
    require_user(&headers, &state).await?;
    let franchise = state
        .catalog
        .random_franchise()
        .await?
        .ok_or_else(|| AppError::NotFound("No franchise available".to_string()))?;
    Ok(Json(ApiResponse::success(franchise)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_is_trimmed_and_bounded() {
        assert_eq!(normalize_query("  zelda ").unwrap(), "zelda");
        assert!(normalize_query("   ").is_err());
        assert!(normalize_query(&"x".repeat(QUERY_MAX_CHARS + 1)).is_err());
    }
}
