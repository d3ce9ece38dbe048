use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;

use crate::{
    board::{
        persist::{board_from_rows, TierListKind},
        Board,
    },
    error::{AppError, Result},
    models::{ApiResponse, TierList},
    services::Draft,
};

use super::{require_user, AppState};

#[derive(Debug, Serialize)]
pub struct TierListDetailResponse {
    #[serde(flatten)]
    pub tier_list: TierList,
    pub board: Board,
}

pub(crate) fn tier_list_kind(tier_list: &TierList) -> Result<TierListKind> {
    TierListKind::parse(&tier_list.kind).ok_or_else(|| {
        AppError::Internal(format!(
            "tier list {} has unknown type '{}'",
            tier_list.id, tier_list.kind
        ))
    })
}

/// GET /api/v1/tier-lists
pub async fn get_my_tier_lists(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<Vec<TierList>>>> {
    let user_id = require_user(&headers, &state).await?;
    let tier_lists = state.db.tier_lists_for_owner(user_id).await?;
    Ok(Json(ApiResponse::success(tier_lists)))
}

/// GET /api/v1/tier-lists/{id}
pub async fn get_tier_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(tier_list_id): Path<i64>,
) -> Result<Json<ApiResponse<TierListDetailResponse>>> {
    let user_id = require_user(&headers, &state).await?;
    let tier_list = state
        .db
        .get_tier_list(tier_list_id)
        .await?
        .filter(|t| t.owner_id == user_id || t.is_public)
        .ok_or_else(|| AppError::NotFound("Tier list not found".to_string()))?;

    let (columns, items) = state.db.tier_list_rows(tier_list_id).await?;
    Ok(Json(ApiResponse::success(TierListDetailResponse {
        tier_list,
        board: board_from_rows(columns, items),
    })))
}

/// DELETE /api/v1/tier-lists/{id}
pub async fn delete_tier_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(tier_list_id): Path<i64>,
) -> Result<Json<ApiResponse<bool>>> {
    let user_id = require_user(&headers, &state).await?;
    if !state.db.delete_tier_list(tier_list_id, user_id).await? {
        return Err(AppError::NotFound("Tier list not found".to_string()));
    }
    tracing::info!("Tier list deleted: id={}, owner={}", tier_list_id, user_id);
    Ok(Json(ApiResponse::success(true)))
}

/// POST /api/v1/tier-lists/{id}/edit
///
/// Opens a saved tier list as a draft. Saving that draft replaces the
/// stored columns and items.
pub async fn edit_tier_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(tier_list_id): Path<i64>,
) -> Result<Json<ApiResponse<Draft>>> {
    let user_id = require_user(&headers, &state).await?;
    let tier_list = state
        .db
        .get_tier_list(tier_list_id)
        .await?
        .filter(|t| t.owner_id == user_id)
        .ok_or_else(|| AppError::NotFound("Tier list not found".to_string()))?;
    let kind = tier_list_kind(&tier_list)?;

    let (columns, items) = state.db.tier_list_rows(tier_list_id).await?;
    let mut draft = Draft::new(
        user_id,
        tier_list.name,
        tier_list.is_public,
        kind,
        board_from_rows(columns, items),
    );
    draft.tier_list_id = Some(tier_list_id);
    state.drafts.save(&draft).await?;

    tracing::debug!("Draft opened for tier list {}: draft={}", tier_list_id, draft.id);
    Ok(Json(ApiResponse::success(draft)))
}
