// src/api/mod.rs

pub mod auth;
pub mod drafts;
pub mod games;
pub mod health;
pub mod lists;
pub mod profiles;
pub mod recommendations;
pub mod shares;
pub mod tier_lists;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use redis::aio::ConnectionManager;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::integrations::GameCatalog;
use crate::models::{GameList, ListAccess};
use crate::services::{DraftStore, SearchCache};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub redis: ConnectionManager,
    pub config: Config,
    pub catalog: Arc<dyn GameCatalog>,
    pub drafts: DraftStore,
    pub search_cache: SearchCache,
}

pub async fn require_user(headers: &HeaderMap, state: &AppState) -> Result<Uuid> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::AuthError("Missing Authorization header".to_string()))?;
    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::AuthError("Invalid Authorization header".to_string()))?;
    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::AuthError("Invalid Authorization scheme".to_string()))?;

    let user_id = auth::extract_user_from_token(token, &state.config.jwt_secret)?;
    state.db.ensure_profile(user_id).await?;
    state.db.update_last_active(user_id).await?;
    Ok(user_id)
}

/// Loads a list the user can at least read. Lists the user cannot see are
/// reported as missing.
pub async fn readable_list(state: &AppState, list_id: i64, user_id: Uuid) -> Result<(GameList, ListAccess)> {
    match state.db.get_list_with_access(list_id, user_id).await? {
        Some((list, access)) if access.can_read() => Ok((list, access)),
        _ => Err(AppError::NotFound("List not found".to_string())),
    }
}
