use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use uuid::Uuid;

use crate::{
    board::persist::TierListPlan,
    config::Config,
    error::{AppError, Result},
    models::*,
    utils::TextUpdate,
};

/// Taken at the start of every transaction that assigns or shifts item
/// positions, so concurrent writers to one list queue up.
const LOCK_LIST_SQL: &str = "SELECT id FROM game_lists WHERE id = $1 FOR UPDATE";

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}


impl Database {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        // migrations live at the crate root: ./migrations
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// ==================== PROFILE QUERIES ====================
impl Database {
    pub async fn ensure_profile(&self, user_id: Uuid) -> Result<()> {
        sqlx::query(
            "INSERT INTO profiles (id) VALUES ($1)
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn update_last_active(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE profiles SET last_active = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    pub async fn get_profile_by_username(&self, username: &str) -> Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT * FROM profiles WHERE LOWER(username) = LOWER($1)",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        username: Option<&str>,
        display_name: TextUpdate<'_>,
        bio: TextUpdate<'_>,
        avatar_url: TextUpdate<'_>,
    ) -> Result<Profile> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles
            SET username     = COALESCE($2, username),
                display_name = CASE WHEN $3 THEN $4 ELSE display_name END,
                bio          = CASE WHEN $5 THEN $6 ELSE bio END,
                avatar_url   = CASE WHEN $7 THEN $8 ELSE avatar_url END,
                updated_at   = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(username)
        .bind(display_name.is_some())
        .bind(display_name.flatten())
        .bind(bio.is_some())
        .bind(bio.flatten())
        .bind(avatar_url.is_some())
        .bind(avatar_url.flatten())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
        Ok(profile)
    }
}

// ==================== GAME LIST QUERIES ====================
impl Database {
    pub async fn create_list(
        &self,
        owner_id: Uuid,
        name: &str,
        description: Option<&str>,
        is_public: bool,
    ) -> Result<GameList> {
        let list = sqlx::query_as::<_, GameList>(
            "INSERT INTO game_lists (owner_id, name, description, is_public)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(owner_id)
        .bind(name)
        .bind(description)
        .bind(is_public)
        .fetch_one(&self.pool)
        .await?;
        Ok(list)
    }

    pub async fn get_list(&self, list_id: i64) -> Result<Option<GameList>> {
        let list = sqlx::query_as::<_, GameList>("SELECT * FROM game_lists WHERE id = $1")
            .bind(list_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(list)
    }

    /// The list plus what `user_id` may do with it.
    pub async fn get_list_with_access(
        &self,
        list_id: i64,
        user_id: Uuid,
    ) -> Result<Option<(GameList, ListAccess)>> {
        let Some(list) = self.get_list(list_id).await? else {
            return Ok(None);
        };
        let role: Option<String> = sqlx::query_scalar(
            "SELECT role FROM list_shares WHERE list_id = $1 AND user_id = $2",
        )
        .bind(list_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let access = ListAccess::resolve(&list, user_id, role.as_deref());
        Ok(Some((list, access)))
    }

    /// Lists owned by or shared with `user_id`, newest first.
    pub async fn lists_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<GameList>, i64)> {
        let lists = sqlx::query_as::<_, GameList>(
            r#"
            SELECT l.* FROM game_lists l
            WHERE l.owner_id = $1
               OR EXISTS (SELECT 1 FROM list_shares s WHERE s.list_id = l.id AND s.user_id = $1)
            ORDER BY l.updated_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM game_lists l
            WHERE l.owner_id = $1
               OR EXISTS (SELECT 1 FROM list_shares s WHERE s.list_id = l.id AND s.user_id = $1)
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((lists, total))
    }

    pub async fn public_lists_for_owner(&self, owner_id: Uuid) -> Result<Vec<GameList>> {
        let lists = sqlx::query_as::<_, GameList>(
            "SELECT * FROM game_lists WHERE owner_id = $1 AND is_public = true
             ORDER BY updated_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lists)
    }

    pub async fn update_list(
        &self,
        list_id: i64,
        name: Option<&str>,
        description: TextUpdate<'_>,
        is_public: Option<bool>,
    ) -> Result<GameList> {
        let list = sqlx::query_as::<_, GameList>(
            r#"
            UPDATE game_lists
            SET name        = COALESCE($2, name),
                description = CASE WHEN $3 THEN $4 ELSE description END,
                is_public   = COALESCE($5, is_public),
                updated_at  = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(list_id)
        .bind(name)
        .bind(description.is_some())
        .bind(description.flatten())
        .bind(is_public)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("List not found".to_string()))?;
        Ok(list)
    }

    pub async fn delete_list(&self, list_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM game_lists WHERE id = $1")
            .bind(list_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ==================== LIST ITEM QUERIES ====================
impl Database {
    pub async fn list_items(&self, list_id: i64) -> Result<Vec<ListItem>> {
        let items = sqlx::query_as::<_, ListItem>(
            "SELECT * FROM list_items WHERE list_id = $1 ORDER BY position ASC",
        )
        .bind(list_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn list_game_ids(&self, list_id: i64) -> Result<Vec<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT game_id FROM list_items WHERE list_id = $1 ORDER BY position ASC",
        )
        .bind(list_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    pub async fn count_list_items(&self, list_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM list_items WHERE list_id = $1")
            .bind(list_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Appends a game at the next position. Returns `None` if it is already
    /// in the list.
    pub async fn add_list_item(&self, list_id: i64, game: &GameSummary) -> Result<Option<ListItem>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(LOCK_LIST_SQL)
            .bind(list_id)
            .execute(&mut *tx)
            .await?;

        let item = sqlx::query_as::<_, ListItem>(
            r#"
            INSERT INTO list_items (list_id, game_id, name, cover_url, position)
            SELECT $1, $2, $3, $4, COALESCE(MAX(position), -1) + 1
            FROM list_items WHERE list_id = $1
            ON CONFLICT (list_id, game_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(list_id)
        .bind(game.id)
        .bind(&game.name)
        .bind(&game.cover_url)
        .fetch_optional(&mut *tx)
        .await?;

        if item.is_some() {
            sqlx::query("UPDATE game_lists SET updated_at = NOW() WHERE id = $1")
                .bind(list_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(item)
    }

    /// Removes a game and closes the gap in positions.
    pub async fn remove_list_item(&self, list_id: i64, game_id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(LOCK_LIST_SQL)
            .bind(list_id)
            .execute(&mut *tx)
            .await?;

        let removed: Option<i32> = sqlx::query_scalar(
            "DELETE FROM list_items WHERE list_id = $1 AND game_id = $2 RETURNING position",
        )
        .bind(list_id)
        .bind(game_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(position) = removed else {
            return Ok(false);
        };

        sqlx::query(
            "UPDATE list_items SET position = position - 1
             WHERE list_id = $1 AND position > $2",
        )
        .bind(list_id)
        .bind(position)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE game_lists SET updated_at = NOW() WHERE id = $1")
            .bind(list_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}

// ==================== SHARE QUERIES ====================
impl Database {
    pub async fn upsert_share(&self, list_id: i64, user_id: Uuid, role: ShareRole) -> Result<ListShare> {
        let share = sqlx::query_as::<_, ListShare>(
            r#"
            INSERT INTO list_shares (list_id, user_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (list_id, user_id) DO UPDATE SET role = EXCLUDED.role
            RETURNING *
            "#,
        )
        .bind(list_id)
        .bind(user_id)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(share)
    }

    pub async fn list_shares(&self, list_id: i64) -> Result<Vec<ListShare>> {
        let shares = sqlx::query_as::<_, ListShare>(
            "SELECT * FROM list_shares WHERE list_id = $1 ORDER BY created_at ASC",
        )
        .bind(list_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(shares)
    }

    pub async fn revoke_share(&self, list_id: i64, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM list_shares WHERE list_id = $1 AND user_id = $2")
            .bind(list_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ==================== TIER LIST QUERIES ====================
impl Database {
    /// Writes a whole tier list in one transaction. With `existing`, the
    /// list is updated in place and its columns and items are replaced.
    pub async fn save_tier_list(
        &self,
        owner_id: Uuid,
        existing: Option<i64>,
        plan: &TierListPlan,
    ) -> Result<TierList> {
        let mut tx = self.pool.begin().await?;

        let list = match existing {
            Some(tier_list_id) => {
                let list = sqlx::query_as::<_, TierList>(
                    r#"
                    UPDATE tier_lists
                    SET name = $3, is_public = $4, type = $5, updated_at = NOW()
                    WHERE id = $1 AND owner_id = $2
                    RETURNING *
                    "#,
                )
                .bind(tier_list_id)
                .bind(owner_id)
                .bind(&plan.list.name)
                .bind(plan.list.is_public)
                .bind(plan.list.kind.as_str())
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound("Tier list not found".to_string()))?;

                sqlx::query("DELETE FROM tier_list_columns WHERE tier_list_id = $1")
                    .bind(tier_list_id)
                    .execute(&mut *tx)
                    .await?;
                list
            }
            None => {
                sqlx::query_as::<_, TierList>(
                    "INSERT INTO tier_lists (owner_id, name, is_public, type)
                     VALUES ($1, $2, $3, $4)
                     RETURNING *",
                )
                .bind(owner_id)
                .bind(&plan.list.name)
                .bind(plan.list.is_public)
                .bind(plan.list.kind.as_str())
                .fetch_one(&mut *tx)
                .await?
            }
        };

        let mut column_ids = Vec::with_capacity(plan.columns.len());
        for column in &plan.columns {
            let row = sqlx::query(
                "INSERT INTO tier_list_columns (tier_list_id, label, color, position)
                 VALUES ($1, $2, $3, $4)
                 RETURNING id",
            )
            .bind(list.id)
            .bind(&column.label)
            .bind(&column.color)
            .bind(column.position)
            .fetch_one(&mut *tx)
            .await?;
            let id: i64 = row.try_get("id")?;
            column_ids.push(id);
        }

        for item in &plan.items {
            let column_id = *column_ids.get(item.column).ok_or_else(|| {
                AppError::Internal(format!("Planned item references missing column {}", item.column))
            })?;
            sqlx::query(
                r#"
                INSERT INTO tier_list_items
                    (column_id, item_id, game_id, franchise_id, name, cover_url, position)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(column_id)
            .bind(item.item_id)
            .bind(item.game_id)
            .bind(item.franchise_id)
            .bind(&item.name)
            .bind(&item.cover_url)
            .bind(item.position)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            "Tier list saved: id={}, owner={}, columns={}, items={}",
            list.id,
            owner_id,
            plan.columns.len(),
            plan.items.len()
        );

        Ok(list)
    }

    pub async fn get_tier_list(&self, tier_list_id: i64) -> Result<Option<TierList>> {
        let list = sqlx::query_as::<_, TierList>("SELECT * FROM tier_lists WHERE id = $1")
            .bind(tier_list_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(list)
    }

    pub async fn tier_lists_for_owner(&self, owner_id: Uuid) -> Result<Vec<TierList>> {
        let lists = sqlx::query_as::<_, TierList>(
            "SELECT * FROM tier_lists WHERE owner_id = $1 ORDER BY updated_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lists)
    }

    pub async fn tier_list_rows(
        &self,
        tier_list_id: i64,
    ) -> Result<(Vec<TierListColumn>, Vec<TierListItem>)> {
        let columns = sqlx::query_as::<_, TierListColumn>(
            "SELECT * FROM tier_list_columns WHERE tier_list_id = $1 ORDER BY position ASC",
        )
        .bind(tier_list_id)
        .fetch_all(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, TierListItem>(
            r#"
            SELECT i.* FROM tier_list_items i
            JOIN tier_list_columns c ON c.id = i.column_id
            WHERE c.tier_list_id = $1
            ORDER BY c.position ASC, i.position ASC
            "#,
        )
        .bind(tier_list_id)
        .fetch_all(&self.pool)
        .await?;

        Ok((columns, items))
    }

    pub async fn delete_tier_list(&self, tier_list_id: i64, owner_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tier_lists WHERE id = $1 AND owner_id = $2")
            .bind(tier_list_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
