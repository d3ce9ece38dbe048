use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ==================== GAME LIST ====================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GameList {
    pub id: i64,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ListItem {
    pub list_id: i64,
    pub game_id: i64,
    pub name: String,
    pub cover_url: Option<String>,
    pub position: i32,
    pub added_at: DateTime<Utc>,
}

// ==================== SHARES ====================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareRole {
    Editor,
    Observer,
}

impl ShareRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareRole::Editor => "editor",
            ShareRole::Observer => "observer",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "editor" => Some(ShareRole::Editor),
            "observer" => Some(ShareRole::Observer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ListShare {
    pub list_id: i64,
    pub user_id: Uuid,
    pub role: String, // editor/observer
    pub created_at: DateTime<Utc>,
}

/// What a user may do with a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListAccess {
    Owner,
    Editor,
    Observer,
    Public,
    None,
}

impl ListAccess {
    pub fn resolve(list: &GameList, user_id: Uuid, share_role: Option<&str>) -> Self {
        if list.owner_id == user_id {
            return ListAccess::Owner;
        }
        match share_role.and_then(ShareRole::parse) {
            Some(ShareRole::Editor) => ListAccess::Editor,
            Some(ShareRole::Observer) => ListAccess::Observer,
            None if list.is_public => ListAccess::Public,
            None => ListAccess::None,
        }
    }

    pub fn can_read(&self) -> bool {
        !matches!(self, ListAccess::None)
    }

    pub fn can_edit_items(&self) -> bool {
        matches!(self, ListAccess::Owner | ListAccess::Editor)
    }

    pub fn can_manage(&self) -> bool {
        matches!(self, ListAccess::Owner)
    }
}
