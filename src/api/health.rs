use axum::{extract::State, Json};
use serde::Serialize;

use super::AppState;
use crate::constants::API_VERSION;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub api_version: String,
    pub database: String,
    pub redis: String,
}

fn status_label(ok: bool) -> String {
    if ok { "connected" } else { "disconnected" }.to_string()
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_ok = state.db.pool().acquire().await.is_ok();

    let mut conn = state.redis.clone();
    let redis_ok = redis::cmd("PING")
        .query_async::<String>(&mut conn)
        .await
        .is_ok();

    Json(HealthResponse {
        status: if db_ok && redis_ok { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        api_version: API_VERSION.to_string(),
        database: status_label(db_ok),
        redis: status_label(redis_ok),
    })
}
