use chrono::{DateTime, Utc};
use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    board::{persist::TierListKind, Board, ItemRef},
    constants::{DRAFT_KEY_PREFIX, MAX_BOARD_ITEMS},
    error::{AppError, Result},
};

/// An unsaved tier-list board held server-side while the user edits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub is_public: bool,
    #[serde(rename = "type")]
    pub kind: TierListKind,
    /// Set when the draft edits an already saved tier list.
    pub tier_list_id: Option<i64>,
    pub board: Board,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Draft {
    pub fn new(owner_id: Uuid, name: String, is_public: bool, kind: TierListKind, board: Board) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name,
            is_public,
            kind,
            tier_list_id: None,
            board,
            created_at: now,
            updated_at: now,
        }
    }

    /// Adds an item to the gallery after checking its kind and the board size.
    /// Returns false when the item is already on the board.
    pub fn add_item(&mut self, item: ItemRef) -> Result<bool> {
        if item.kind() != self.kind.item_kind() {
            return Err(AppError::BadRequest(format!(
                "{} cannot be added to a {} tier list",
                item.key(),
                self.kind.as_str()
            )));
        }
        if self.board.contains(item.key()) {
            return Ok(false);
        }
        if self.board.item_count() >= MAX_BOARD_ITEMS {
            return Err(AppError::BadRequest(format!(
                "tier list is limited to {} items",
                MAX_BOARD_ITEMS
            )));
        }
        Ok(self.board.add_to_gallery(item))
    }
}

fn draft_key(owner_id: Uuid, draft_id: Uuid) -> String {
    format!("{}:{}:{}", DRAFT_KEY_PREFIX, owner_id, draft_id)
}

/// Draft Store - keeps drafts in Redis with a sliding TTL
#[derive(Clone)]
pub struct DraftStore {
    redis: ConnectionManager,
    ttl_secs: u64,
}

impl DraftStore {
    pub fn new(redis: ConnectionManager, ttl_secs: u64) -> Self {
        Self { redis, ttl_secs }
    }

    pub async fn save(&self, draft: &Draft) -> Result<()> {
        let payload = serde_json::to_string(draft)?;
        let mut conn = self.redis.clone();
        let _: () = conn
            .set_ex(draft_key(draft.owner_id, draft.id), payload, self.ttl_secs)
            .await?;
        Ok(())
    }

    pub async fn load(&self, owner_id: Uuid, draft_id: Uuid) -> Result<Draft> {
        let mut conn = self.redis.clone();
        let payload: Option<String> = conn.get(draft_key(owner_id, draft_id)).await?;
        let payload = payload.ok_or_else(|| AppError::NotFound("Draft not found or expired".to_string()))?;
        Ok(serde_json::from_str(&payload)?)
    }

    pub async fn discard(&self, owner_id: Uuid, draft_id: Uuid) -> Result<bool> {
        let mut conn = self.redis.clone();
        let removed: i64 = conn.del(draft_key(owner_id, draft_id)).await?;
        Ok(removed > 0)
    }

    /// Loads a draft, applies `change`, and writes it back only if `change`
    /// succeeded. A failed change leaves the stored draft untouched.
    pub async fn update<T, F>(&self, owner_id: Uuid, draft_id: Uuid, change: F) -> Result<(Draft, T)>
    where
        F: FnOnce(&mut Draft) -> Result<T>,
    {
        let mut draft = self.load(owner_id, draft_id).await?;
        let output = change(&mut draft)?;
        draft.updated_at = Utc::now();
        self.save(&draft).await?;
        Ok((draft, output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{tests::game, Summary};

    fn draft(kind: TierListKind) -> Draft {
        Draft::new(Uuid::new_v4(), "My list".to_string(), false, kind, Board::with_default_rows())
    }

    #[test]
    fn draft_key_is_scoped_by_owner() {
        let owner = Uuid::nil();
        let id = Uuid::nil();
        assert_eq!(
            draft_key(owner, id),
            format!("tierlist:draft:{}:{}", owner, id)
        );
    }

    #[test]
    fn add_item_checks_kind_and_duplicates() {
        let mut draft = draft(TierListKind::Games);
        assert!(draft.add_item(game(1)).unwrap());
        assert!(!draft.add_item(game(1)).unwrap());

        let franchise = ItemRef::Franchise(Summary {
            id: 2,
            name: "Series".to_string(),
            cover_url: None,
        });
        assert!(matches!(draft.add_item(franchise), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn add_item_enforces_board_size() {
        let mut draft = draft(TierListKind::Games);
        for id in 0..MAX_BOARD_ITEMS as i64 {
            assert!(draft.add_item(game(id)).unwrap());
        }
        assert!(draft.add_item(game(-1)).is_err());
    }

    #[test]
    fn draft_serializes_with_type_field() {
        let draft = draft(TierListKind::Franchises);
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["type"], "franchises");
        let back: Draft = serde_json::from_value(json).unwrap();
        assert_eq!(back, draft);
    }
}
