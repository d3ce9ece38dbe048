use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ==================== TIER LIST ====================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TierList {
    pub id: i64,
    pub owner_id: Uuid,
    pub name: String,
    pub is_public: bool,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String, // games/franchises
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TierListColumn {
    pub id: i64,
    pub tier_list_id: i64,
    pub label: String,
    pub color: String,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TierListItem {
    pub id: i64,
    pub column_id: i64,
    pub item_id: i64,
    pub game_id: Option<i64>,
    pub franchise_id: Option<i64>,
    pub name: String,
    pub cover_url: Option<String>,
    pub position: i32,
}
