use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{LIST_DESCRIPTION_MAX_CHARS, LIST_NAME_MAX_CHARS, MAX_LIST_ITEMS},
    error::{AppError, Result},
    models::{ApiResponse, GameList, ListAccess, ListItem, PaginatedResponse},
    utils::{ensure_page_limit, normalize_optional_text, normalize_text, normalize_text_update},
};

use super::{readable_list, require_user, AppState};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateListRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub game_id: i64,
}

#[derive(Debug, Serialize)]
pub struct ListDetailResponse {
    #[serde(flatten)]
    pub list: GameList,
    pub access: ListAccess,
    pub items: Vec<ListItem>,
}

/// GET /api/v1/lists
pub async fn get_my_lists(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<GameList>>>> {
    let user_id = require_user(&headers, &state).await?;
    let page = query.page.unwrap_or(1).max(1);
    let limit = ensure_page_limit(query.limit, 20, state.config.max_page_limit)?;
    let offset = (page - 1) as i64 * limit as i64;

    let (items, total) = state.db.lists_for_user(user_id, limit as i64, offset).await?;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        page,
        limit: limit as i32,
        total,
    })))
}

/// POST /api/v1/lists
pub async fn create_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateListRequest>,
) -> Result<Json<ApiResponse<GameList>>> {
    let user_id = require_user(&headers, &state).await?;
    let name = normalize_text("name", &req.name, 1, LIST_NAME_MAX_CHARS)?;
    let description = normalize_optional_text(
        "description",
        req.description.as_deref(),
        LIST_DESCRIPTION_MAX_CHARS,
    )?;

    let list = state
        .db
        .create_list(user_id, &name, description.as_deref(), req.is_public)
        .await?;

    tracing::info!("List created: id={}, owner={}", list.id, user_id);
    Ok(Json(ApiResponse::success(list)))
}

/// GET /api/v1/lists/{id}
pub async fn get_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(list_id): Path<i64>,
) -> Result<Json<ApiResponse<ListDetailResponse>>> {
    let user_id = require_user(&headers, &state).await?;
    let (list, access) = readable_list(&state, list_id, user_id).await?;
    let items = state.db.list_items(list_id).await?;

    Ok(Json(ApiResponse::success(ListDetailResponse { list, access, items })))
}

/// PUT /api/v1/lists/{id}
pub async fn update_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(list_id): Path<i64>,
    Json(req): Json<UpdateListRequest>,
) -> Result<Json<ApiResponse<GameList>>> {
    let user_id = require_user(&headers, &state).await?;
    let (_, access) = readable_list(&state, list_id, user_id).await?;
    if !access.can_manage() {
        return Err(AppError::Forbidden("Only the owner can edit this list".to_string()));
    }

    let name = req
        .name
        .as_deref()
        .map(|name| normalize_text("name", name, 1, LIST_NAME_MAX_CHARS))
        .transpose()?;
    let description = normalize_text_update(
        "description",
        req.description.as_deref(),
        LIST_DESCRIPTION_MAX_CHARS,
    )?;

    let list = state
        .db
        .update_list(
            list_id,
            name.as_deref(),
            description.as_ref().map(|v| v.as_deref()),
            req.is_public,
        )
        .await?;
    Ok(Json(ApiResponse::success(list)))
}

/// DELETE /api/v1/lists/{id}
pub async fn delete_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(list_id): Path<i64>,
) -> Result<Json<ApiResponse<bool>>> {
    let user_id = require_user(&headers, &state).await?;
    let (_, access) = readable_list(&state, list_id, user_id).await?;
    if !access.can_manage() {
        return Err(AppError::Forbidden("Only the owner can delete this list".to_string()));
    }

    let deleted = state.db.delete_list(list_id).await?;
    tracing::info!("List deleted: id={}, owner={}", list_id, user_id);
    Ok(Json(ApiResponse::success(deleted)))
}

/// POST /api/v1/lists/{id}/items
pub async fn add_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(list_id): Path<i64>,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<ApiResponse<ListItem>>> {
    let user_id = require_user(&headers, &state).await?;
    let (_, access) = readable_list(&state, list_id, user_id).await?;
    if !access.can_edit_items() {
        return Err(AppError::Forbidden("You cannot edit this list".to_string()));
    }
    if req.game_id <= 0 {
        return Err(AppError::BadRequest("game_id must be positive".to_string()));
    }
    if state.db.count_list_items(list_id).await? >= MAX_LIST_ITEMS {
        return Err(AppError::BadRequest(format!(
            "a list holds at most {} games",
            MAX_LIST_ITEMS
        )));
    }

    let game = state
        .catalog
        .game(req.game_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Game not found".to_string()))?;

    let item = state
        .db
        .add_list_item(list_id, &game.game)
        .await?
        .ok_or_else(|| AppError::Conflict("Game is already in this list".to_string()))?;

    tracing::debug!("List item added: list={}, game={}, by={}", list_id, req.game_id, user_id);
    Ok(Json(ApiResponse::success(item)))
}

/// DELETE /api/v1/lists/{id}/items/{game_id}
pub async fn remove_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((list_id, game_id)): Path<(i64, i64)>,
) -> Result<Json<ApiResponse<bool>>> {
    let user_id = require_user(&headers, &state).await?;
    let (_, access) = readable_list(&state, list_id, user_id).await?;
    if !access.can_edit_items() {
        return Err(AppError::Forbidden("You cannot edit this list".to_string()));
    }

    if !state.db.remove_list_item(list_id, game_id).await? {
        return Err(AppError::NotFound("Game is not in this list".to_string()));
    }
    Ok(Json(ApiResponse::success(true)))
}
