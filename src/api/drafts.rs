use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    board::{
        persist::{TierListKind, TierListPlan},
        token, Board, DragSource, DropTarget, ItemKey, ItemRef, MoveOutcome, Summary,
    },
    constants::{LIST_NAME_MAX_CHARS, MAX_TIER_ROWS},
    error::{AppError, Result},
    models::{ApiResponse, TierList},
    services::Draft,
    utils::normalize_text,
};

use super::{readable_list, require_user, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateDraftRequest {
    pub name: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(rename = "type")]
    pub kind: TierListKind,
    /// Initial gallery items.
    #[serde(default)]
    pub items: Vec<ItemRef>,
    /// Seeds the gallery with the games of one of the user's lists.
    pub list_id: Option<i64>,
}

/// A drag-end event, either structured or as legacy `type:index:id` tokens.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MoveRequest {
    Structured { source: DragSource, target: DropTarget },
    Legacy { source: String, target: String },
}

impl MoveRequest {
    fn resolve(&self, board: &Board) -> Result<(DragSource, DropTarget)> {
        match self {
            MoveRequest::Structured { source, target } => Ok((*source, *target)),
            MoveRequest::Legacy { source, target } => Ok((
                token::resolve_source(board, source)?,
                token::resolve_target(board, target)?,
            )),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MoveResponse {
    pub outcome: MoveOutcome,
    /// Where the dragged item now sits, as a legacy token.
    pub location: Option<String>,
    pub draft: Draft,
}

#[derive(Debug, Deserialize)]
pub struct AddRowRequest {
    pub label: String,
    pub color: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRowRequest {
    pub label: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MoveRowRequest {
    pub to: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct SaveDraftRequest {
    pub name: Option<String>,
    pub is_public: Option<bool>,
}

/// POST /api/v1/tier-lists/drafts
pub async fn create_draft(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateDraftRequest>,
) -> Result<Json<ApiResponse<Draft>>> {
    let user_id = require_user(&headers, &state).await?;
    let name = normalize_text("name", &req.name, 1, LIST_NAME_MAX_CHARS)?;
    let mut draft = Draft::new(user_id, name, req.is_public, req.kind, Board::with_default_rows());

    if let Some(list_id) = req.list_id {
        if req.kind != TierListKind::Games {
            return Err(AppError::BadRequest(
                "only a games tier list can be seeded from a list".to_string(),
            ));
        }
        readable_list(&state, list_id, user_id).await?;
        for item in state.db.list_items(list_id).await? {
            draft.add_item(ItemRef::Game(Summary {
                id: item.game_id,
                name: item.name,
                cover_url: item.cover_url,
            }))?;
        }
    }
    for item in req.items {
        draft.add_item(item)?;
    }

    state.drafts.save(&draft).await?;
    tracing::debug!(
        "Draft created: id={}, owner={}, items={}",
        draft.id,
        user_id,
        draft.board.item_count()
    );
    Ok(Json(ApiResponse::success(draft)))
}

/// GET /api/v1/tier-lists/drafts/{draft_id}
pub async fn get_draft(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(draft_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Draft>>> {
    let user_id = require_user(&headers, &state).await?;
    let draft = state.drafts.load(user_id, draft_id).await?;
    Ok(Json(ApiResponse::success(draft)))
}

/// DELETE /api/v1/tier-lists/drafts/{draft_id}
pub async fn discard_draft(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(draft_id): Path<Uuid>,
) -> Result<Json<ApiResponse<bool>>> {
    let user_id = require_user(&headers, &state).await?;
    if !state.drafts.discard(user_id, draft_id).await? {
        return Err(AppError::NotFound("Draft not found or expired".to_string()));
    }
    Ok(Json(ApiResponse::success(true)))
}

/// POST /api/v1/tier-lists/drafts/{draft_id}/items
pub async fn add_draft_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(draft_id): Path<Uuid>,
    Json(item): Json<ItemRef>,
) -> Result<Json<ApiResponse<Draft>>> {
    let user_id = require_user(&headers, &state).await?;
    let (draft, _) = state
        .drafts
        .update(user_id, draft_id, |draft| draft.add_item(item))
        .await?;
    Ok(Json(ApiResponse::success(draft)))
}

/// DELETE /api/v1/tier-lists/drafts/{draft_id}/items/{item_key}
pub async fn remove_draft_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((draft_id, item_key)): Path<(Uuid, String)>,
) -> Result<Json<ApiResponse<Draft>>> {
    let user_id = require_user(&headers, &state).await?;
    let key = ItemKey::parse(&item_key)
        .ok_or_else(|| AppError::BadRequest(format!("malformed item key '{}'", item_key)))?;
    let (draft, _) = state
        .drafts
        .update(user_id, draft_id, |draft| Ok(draft.board.remove_item(key)?))
        .await?;
    Ok(Json(ApiResponse::success(draft)))
}

/// POST /api/v1/tier-lists/drafts/{draft_id}/moves
pub async fn apply_move(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(draft_id): Path<Uuid>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<ApiResponse<MoveResponse>>> {
    let user_id = require_user(&headers, &state).await?;
    let (draft, (outcome, item)) = state
        .drafts
        .update(user_id, draft_id, |draft| {
            let (source, target) = req.resolve(&draft.board)?;
            let outcome = draft.board.apply_drag(source, target)?;
            Ok((outcome, source.item))
        })
        .await?;
    let location = draft
        .board
        .locate(item)
        .map(|(container, _)| token::encode(container, Some(item)));

    Ok(Json(ApiResponse::success(MoveResponse {
        outcome,
        location,
        draft,
    })))
}

/// POST /api/v1/tier-lists/drafts/{draft_id}/rows
pub async fn add_row(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(draft_id): Path<Uuid>,
    Json(req): Json<AddRowRequest>,
) -> Result<Json<ApiResponse<Draft>>> {
    let user_id = require_user(&headers, &state).await?;
    let (draft, _) = state
        .drafts
        .update(user_id, draft_id, |draft| {
            Ok(draft.board.add_row(&req.label, &req.color, MAX_TIER_ROWS)?)
        })
        .await?;
    Ok(Json(ApiResponse::success(draft)))
}

/// PATCH /api/v1/tier-lists/drafts/{draft_id}/rows/{index}
pub async fn update_row(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((draft_id, index)): Path<(Uuid, usize)>,
    Json(req): Json<UpdateRowRequest>,
) -> Result<Json<ApiResponse<Draft>>> {
    let user_id = require_user(&headers, &state).await?;
    let (draft, _) = state
        .drafts
        .update(user_id, draft_id, |draft| {
            Ok(draft
                .board
                .update_row(index, req.label.as_deref(), req.color.as_deref())?)
        })
        .await?;
    Ok(Json(ApiResponse::success(draft)))
}

/// DELETE /api/v1/tier-lists/drafts/{draft_id}/rows/{index}
pub async fn remove_row(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((draft_id, index)): Path<(Uuid, usize)>,
) -> Result<Json<ApiResponse<Draft>>> {
    let user_id = require_user(&headers, &state).await?;
    let (draft, _) = state
        .drafts
        .update(user_id, draft_id, |draft| Ok(draft.board.remove_row(index)?))
        .await?;
    Ok(Json(ApiResponse::success(draft)))
}

/// POST /api/v1/tier-lists/drafts/{draft_id}/rows/{index}/move
pub async fn move_row(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((draft_id, index)): Path<(Uuid, usize)>,
    Json(req): Json<MoveRowRequest>,
) -> Result<Json<ApiResponse<Draft>>> {
    let user_id = require_user(&headers, &state).await?;
    let (draft, _) = state
        .drafts
        .update(user_id, draft_id, |draft| Ok(draft.board.move_row(index, req.to)?))
        .await?;
    Ok(Json(ApiResponse::success(draft)))
}

/// POST /api/v1/tier-lists/drafts/{draft_id}/save
pub async fn save_draft(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(draft_id): Path<Uuid>,
    body: Option<Json<SaveDraftRequest>>,
) -> Result<Json<ApiResponse<TierList>>> {
    let user_id = require_user(&headers, &state).await?;
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let draft = state.drafts.load(user_id, draft_id).await?;

    let name = match req.name.as_deref() {
        Some(name) => normalize_text("name", name, 1, LIST_NAME_MAX_CHARS)?,
        None => draft.name.clone(),
    };
    let is_public = req.is_public.unwrap_or(draft.is_public);
    let plan = TierListPlan::from_board(&name, is_public, draft.kind, &draft.board)?;

    let tier_list = state
        .db
        .save_tier_list(user_id, draft.tier_list_id, &plan)
        .await?;
    let discarded = state.drafts.discard(user_id, draft_id).await;
    log_discard_after_save(discarded, draft_id, tier_list.id);

    Ok(Json(ApiResponse::success(tier_list)))
}

/// The tier list is already committed when the draft is dropped, so a
/// failure here is logged and the save still succeeds.
fn log_discard_after_save(result: Result<bool>, draft_id: Uuid, tier_list_id: i64) {
    match result {
        Ok(_) => tracing::info!("Draft {} saved as tier list {}", draft_id, tier_list_id),
        Err(e) => tracing::warn!(
            "Draft {} saved as tier list {} but could not be discarded: {}",
            draft_id,
            tier_list_id,
            e
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{tests::game, BoardError, Container};

    fn board() -> Board {
        let mut board = Board::with_default_rows();
        board.rows[0].items = vec![game(1), game(2)];
        board.gallery = vec![game(3)];
        board
    }

    #[test]
    fn structured_move_request_parses() {
        let req: MoveRequest = serde_json::from_value(serde_json::json!({
            "source": {"container": {"kind": "gallery"}, "item": {"kind": "game", "id": 3}},
            "target": {"container": {"kind": "row", "index": 0}, "over": {"kind": "game", "id": 2}}
        }))
        .unwrap();
        let (source, target) = req.resolve(&board()).unwrap();
        assert_eq!(source.container, Container::Gallery);
        assert_eq!(target.container, Container::Row { index: 0 });
        assert_eq!(target.over, Some(ItemKey::game(2)));
    }

    #[test]
    fn legacy_move_request_resolves_tokens() {
        let req: MoveRequest = serde_json::from_value(serde_json::json!({
            "source": "gallery:0:game:3",
            "target": "game:1"
        }))
        .unwrap();
        assert!(matches!(req, MoveRequest::Legacy { .. }));

        let mut board = board();
        let (source, target) = req.resolve(&board).unwrap();
        assert_eq!(target.container, Container::Row { index: 0 });
        board.apply_drag(source, target).unwrap();
        let ids: Vec<i64> = board.rows[0].items.iter().map(|i| i.key().id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert!(board.gallery.is_empty());
    }

    #[test]
    fn legacy_move_with_bad_target_is_invalid_move() {
        let req = MoveRequest::Legacy {
            source: "row:0:game:1".to_string(),
            target: "row:9".to_string(),
        };
        let mut board = board();
        let before = board.clone();
        let result = req
            .resolve(&board)
            .and_then(|(s, t)| Ok(board.apply_drag(s, t)?));
        assert!(matches!(result, Err(AppError::Board(_))));
        assert_eq!(board, before);
    }

    #[test]
    fn discard_failure_after_save_is_not_propagated() {
        log_discard_after_save(
            Err(AppError::Internal("redis unavailable".to_string())),
            Uuid::new_v4(),
            7,
        );
        log_discard_after_save(Ok(false), Uuid::new_v4(), 7);
    }

    #[test]
    fn save_plan_errors_are_not_reported_as_moves() {
        let draft = Draft::new(Uuid::new_v4(), "Empty".to_string(), false, TierListKind::Games, Board::default());
        let err: AppError = TierListPlan::from_board(&draft.name, false, draft.kind, &draft.board)
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::Board(BoardError::InvalidPlan(_))));
    }

    #[test]
    fn create_draft_request_reads_type_field() {
        let req: CreateDraftRequest = serde_json::from_value(serde_json::json!({
            "name": "Best RPGs",
            "type": "games",
            "items": [{"kind": "game", "id": 7, "name": "Game 7"}]
        }))
        .unwrap();
        assert_eq!(req.kind, TierListKind::Games);
        assert!(!req.is_public);
        assert_eq!(req.items.len(), 1);
        assert!(req.list_id.is_none());
    }
}
