pub mod igdb;
pub mod twitch_auth;

pub use igdb::IgdbClient;
pub use twitch_auth::TwitchAuthClient;

use crate::{
    error::Result,
    models::{FranchiseSummary, GameDetails, GameSummary},
};

/// Read access to the third-party game catalog.
#[async_trait::async_trait]
pub trait GameCatalog: Send + Sync {
    async fn search_games(&self, query: &str, limit: u32) -> Result<Vec<GameSummary>>;

    async fn game(&self, id: i64) -> Result<Option<GameDetails>>;

    /// Details for several games. Unknown ids are skipped.
    async fn games_by_ids(&self, ids: &[i64]) -> Result<Vec<GameDetails>>;

    /// Highest-rated games having any of `genre_ids`.
    async fn top_rated_in_genres(&self, genre_ids: &[i64], limit: usize) -> Result<Vec<GameSummary>>;

    async fn random_game(&self) -> Result<Option<GameSummary>>;

    async fn search_franchises(&self, query: &str, limit: u32) -> Result<Vec<FranchiseSummary>>;

    async fn random_franchise(&self) -> Result<Option<FranchiseSummary>>;
}
