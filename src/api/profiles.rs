use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, Result},
    models::{ApiResponse, GameList, Profile, TierList},
    utils::normalize_text_update,
};

use super::{require_user, AppState};

const BIO_MAX_CHARS: usize = 280;
const DISPLAY_NAME_MAX_CHARS: usize = 40;
const AVATAR_URL_MAX_CHARS: usize = 500;

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PublicProfileResponse {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub lists: Vec<GameList>,
    pub tier_lists: Vec<TierList>,
}

/// GET /api/v1/profiles/me
pub async fn get_my_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<Profile>>> {
    let user_id = require_user(&headers, &state).await?;
    let profile = state
        .db
        .get_profile(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
    Ok(Json(ApiResponse::success(profile)))
}

/// PUT /api/v1/profiles/me
pub async fn update_my_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<Profile>>> {
    let user_id = require_user(&headers, &state).await?;

    let username = req.username.as_deref().map(normalize_username).transpose()?;
    let display_name =
        normalize_text_update("display_name", req.display_name.as_deref(), DISPLAY_NAME_MAX_CHARS)?;
    let bio = normalize_text_update("bio", req.bio.as_deref(), BIO_MAX_CHARS)?;
    let avatar_url = avatar_url_update(req.avatar_url.as_deref())?;

    let profile = state
        .db
        .update_profile(
            user_id,
            username.as_deref(),
            display_name.as_ref().map(|v| v.as_deref()),
            bio.as_ref().map(|v| v.as_deref()),
            avatar_url.as_ref().map(|v| v.as_deref()),
        )
        .await
        .map_err(|e| e.on_unique_violation("username is already taken"))?;

    tracing::info!("Profile updated: user={}", user_id);
    Ok(Json(ApiResponse::success(profile)))
}

/// GET /api/v1/profiles/{username}
pub async fn get_public_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<PublicProfileResponse>>> {
    require_user(&headers, &state).await?;
    let username = normalize_username(&username)?;
    let profile = state
        .db
        .get_profile_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    let (lists, tier_lists) = futures_util::try_join!(
        state.db.public_lists_for_owner(profile.id),
        state.db.tier_lists_for_owner(profile.id),
    )?;

    Ok(Json(ApiResponse::success(PublicProfileResponse {
        username: profile.username,
        display_name: profile.display_name,
        bio: profile.bio,
        avatar_url: profile.avatar_url,
        lists,
        tier_lists: tier_lists.into_iter().filter(|t| t.is_public).collect(),
    })))
}

/// Usernames are 3-24 characters of `[a-z0-9_]`, compared lowercase.
pub(crate) fn normalize_username(raw: &str) -> Result<String> {
    let value = raw.trim().to_ascii_lowercase();
    if value.len() < 3 || value.len() > 24 {
        return Err(AppError::BadRequest(
            "username must be 3-24 characters".to_string(),
        ));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(AppError::BadRequest(
            "username may only contain letters, digits and underscores".to_string(),
        ));
    }
    Ok(value)
}

/// A blank avatar_url clears the avatar.
fn avatar_url_update(raw: Option<&str>) -> Result<Option<Option<String>>> {
    match raw.map(str::trim) {
        None => Ok(None),
        Some("") => Ok(Some(None)),
        Some(value) => normalize_avatar_url(value).map(|url| Some(Some(url))),
    }
}

fn normalize_avatar_url(raw: &str) -> Result<String> {
    let value = raw.trim();
    if value.len() > AVATAR_URL_MAX_CHARS {
        return Err(AppError::BadRequest("avatar_url is too long".to_string()));
    }
    let parsed = url::Url::parse(value)
        .map_err(|_| AppError::BadRequest("avatar_url must be a valid URL".to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::BadRequest(
            "avatar_url must use http or https".to_string(),
        ));
    }
    Ok(value.to_string())
}
