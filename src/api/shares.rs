use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{ApiResponse, ListShare, ShareRole},
};

use super::{profiles::normalize_username, readable_list, require_user, AppState};

/// Grant target: either a user id or a username.
#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    pub user_id: Option<Uuid>,
    pub username: Option<String>,
    pub role: String,
}

async fn owned_list(state: &AppState, list_id: i64, user_id: Uuid) -> Result<()> {
    let (_, access) = readable_list(state, list_id, user_id).await?;
    if !access.can_manage() {
        return Err(AppError::Forbidden("Only the owner can manage sharing".to_string()));
    }
    Ok(())
}

/// GET /api/v1/lists/{id}/shares
pub async fn get_shares(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(list_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<ListShare>>>> {
    let user_id = require_user(&headers, &state).await?;
    owned_list(&state, list_id, user_id).await?;
    let shares = state.db.list_shares(list_id).await?;
    Ok(Json(ApiResponse::success(shares)))
}

/// POST /api/v1/lists/{id}/shares
pub async fn grant_share(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(list_id): Path<i64>,
    Json(req): Json<ShareRequest>,
) -> Result<Json<ApiResponse<ListShare>>> {
    let user_id = require_user(&headers, &state).await?;
    owned_list(&state, list_id, user_id).await?;

    let role = ShareRole::parse(&req.role)
        .ok_or_else(|| AppError::BadRequest("role must be editor or observer".to_string()))?;

    let target = match (req.user_id, req.username.as_deref()) {
        (Some(id), _) => state
            .db
            .get_profile(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?,
        (None, Some(username)) => state
            .db
            .get_profile_by_username(&normalize_username(username)?)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?,
        (None, None) => {
            return Err(AppError::BadRequest(
                "user_id or username is required".to_string(),
            ))
        }
    };

    if target.id == user_id {
        return Err(AppError::BadRequest("You already own this list".to_string()));
    }

    let share = state.db.upsert_share(list_id, target.id, role).await?;
    tracing::info!(
        "List shared: list={}, with={}, role={}",
        list_id,
        target.id,
        role.as_str()
    );
    Ok(Json(ApiResponse::success(share)))
}

/// DELETE /api/v1/lists/{id}/shares/{user_id}
pub async fn revoke_share(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((list_id, target_id)): Path<(i64, Uuid)>,
) -> Result<Json<ApiResponse<bool>>> {
    let user_id = require_user(&headers, &state).await?;
    owned_list(&state, list_id, user_id).await?;

    if !state.db.revoke_share(list_id, target_id).await? {
        return Err(AppError::NotFound("Share not found".to_string()));
    }
    Ok(Json(ApiResponse::success(true)))
}
