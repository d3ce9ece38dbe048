use chrono::{DateTime, Datelike};
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration;

use super::{GameCatalog, TwitchAuthClient};
use crate::{
    config::Config,
    constants::{IGDB_COVER_SIZE, IGDB_IMAGE_BASE_URL, RANDOM_PICK_MIN_RATINGS, TOP_RATED_MIN_RATINGS},
    error::{AppError, Result},
    models::{FranchiseSummary, GameDetails, GameSummary, Genre},
};

const GAME_SUMMARY_FIELDS: &str = "name, cover.image_id, first_release_date, total_rating";
const GAME_DETAIL_FIELDS: &str = "name, cover.image_id, first_release_date, total_rating, summary, \
     genres.name, franchises.name, similar_games.name, similar_games.cover.image_id, \
     similar_games.first_release_date, similar_games.total_rating";
const FRANCHISE_FIELDS: &str = "name, games.cover.image_id";

// ==================== RAW PAYLOADS ====================

#[derive(Debug, Deserialize)]
struct RawImage {
    image_id: String,
}

#[derive(Debug, Deserialize)]
struct RawGenre {
    id: i64,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawFranchiseRef {
    id: i64,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawGame {
    id: i64,
    #[serde(default)]
    name: String,
    cover: Option<RawImage>,
    first_release_date: Option<i64>,
    total_rating: Option<f64>,
    summary: Option<String>,
    #[serde(default)]
    genres: Vec<RawGenre>,
    #[serde(default)]
    similar_games: Vec<RawGame>,
    #[serde(default)]
    franchises: Vec<RawFranchiseRef>,
}

#[derive(Debug, Deserialize)]
struct RawCoverOnly {
    cover: Option<RawImage>,
}

#[derive(Debug, Deserialize)]
struct RawFranchise {
    id: i64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    games: Vec<RawCoverOnly>,
}

#[derive(Debug, Deserialize)]
struct RawCount {
    count: u64,
}

pub fn cover_url(image_id: &str) -> String {
    format!("{}/{}/{}.jpg", IGDB_IMAGE_BASE_URL, IGDB_COVER_SIZE, image_id)
}

fn release_year(timestamp: Option<i64>) -> Option<i32> {
    timestamp
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.year())
}

impl RawGame {
    fn to_summary(&self) -> GameSummary {
        GameSummary {
            id: self.id,
            name: self.name.clone(),
            cover_url: self.cover.as_ref().map(|c| cover_url(&c.image_id)),
            release_year: release_year(self.first_release_date),
            rating: self.total_rating,
        }
    }

    fn into_details(self) -> GameDetails {
        GameDetails {
            game: self.to_summary(),
            summary: self.summary,
            genres: self
                .genres
                .into_iter()
                .map(|g| Genre { id: g.id, name: g.name })
                .collect(),
            similar_games: self.similar_games.iter().map(RawGame::to_summary).collect(),
            franchises: self
                .franchises
                .into_iter()
                .map(|f| FranchiseSummary {
                    id: f.id,
                    name: f.name,
                    cover_url: None,
                })
                .collect(),
        }
    }
}

impl RawFranchise {
    fn into_summary(self) -> FranchiseSummary {
        let cover = self
            .games
            .iter()
            .find_map(|g| g.cover.as_ref())
            .map(|c| cover_url(&c.image_id));
        FranchiseSummary {
            id: self.id,
            name: self.name,
            cover_url: cover,
        }
    }
}

// ==================== QUERY BUILDERS ====================

/// Quotes a user string for an Apicalypse body.
fn quote(raw: &str) -> String {
    let escaped: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .flat_map(|c| match c {
            '"' | '\\' => vec!['\\', c],
            _ => vec![c],
        })
        .collect();
    format!("\"{}\"", escaped)
}

fn id_tuple(ids: &[i64]) -> String {
    let joined: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    format!("({})", joined.join(","))
}

fn search_games_query(query: &str, limit: u32) -> String {
    format!(
        "search {}; fields {}; where version_parent = null; limit {};",
        quote(query),
        GAME_SUMMARY_FIELDS,
        limit
    )
}

fn games_by_ids_query(ids: &[i64]) -> String {
    format!(
        "fields {}; where id = {}; limit {};",
        GAME_DETAIL_FIELDS,
        id_tuple(ids),
        ids.len()
    )
}

fn top_rated_query(genre_ids: &[i64], limit: usize) -> String {
    format!(
        "fields {}; where genres = {} & total_rating_count > {}; sort total_rating desc; limit {};",
        GAME_SUMMARY_FIELDS,
        id_tuple(genre_ids),
        TOP_RATED_MIN_RATINGS,
        limit
    )
}

fn random_game_filter() -> String {
    format!("where total_rating_count > {} & version_parent = null;", RANDOM_PICK_MIN_RATINGS)
}

fn search_franchises_query(query: &str, limit: u32) -> String {
    format!(
        "fields {}; where name ~ *{}*; limit {};",
        FRANCHISE_FIELDS,
        quote(query),
        limit
    )
}

// ==================== CLIENT ====================

#[derive(Clone, Debug)]
pub struct IgdbClient {
    api_url: String,
    auth: TwitchAuthClient,
    client: Client,
}

impl IgdbClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(config.catalog_timeout_secs.max(1)))
            .build()
            .map_err(|e| AppError::Internal(format!("Catalog HTTP client init failed: {}", e)))?;

        let auth = TwitchAuthClient::new(
            config.twitch_token_url.clone(),
            config.igdb_client_id.clone(),
            config.igdb_client_secret.clone(),
            client.clone(),
        );

        Ok(Self {
            api_url: config.igdb_api_url.trim_end_matches('/').to_string(),
            auth,
            client,
        })
    }

    async fn post<T: DeserializeOwned>(&self, endpoint: &str, body: String) -> Result<T> {
        let token = self.auth.access_token().await?;
        let url = format!("{}/{}", self.api_url, endpoint);

        tracing::debug!("IGDB {} <- {}", endpoint, body);

        let response = self
            .client
            .post(&url)
            .header("Client-ID", self.auth.client_id())
            .bearer_auth(token)
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::ExternalAPI(format!("IGDB {} request failed: {}", endpoint, e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.auth.invalidate().await;
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalAPI(format!(
                "IGDB {} returned {}: {}",
                endpoint, status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::ExternalAPI(format!("IGDB {} parse failed: {}", endpoint, e)))
    }

    async fn count(&self, endpoint: &str, filter: String) -> Result<u64> {
        let count: RawCount = self.post(&format!("{}/count", endpoint), filter).await?;
        Ok(count.count)
    }
}

#[async_trait::async_trait]
impl GameCatalog for IgdbClient {
    async fn search_games(&self, query: &str, limit: u32) -> Result<Vec<GameSummary>> {
        let games: Vec<RawGame> = self.post("games", search_games_query(query, limit)).await?;
        Ok(games.iter().map(RawGame::to_summary).collect())
    }

    async fn game(&self, id: i64) -> Result<Option<GameDetails>> {
        let mut games = self.games_by_ids(&[id]).await?;
        Ok(games.pop())
    }

    async fn games_by_ids(&self, ids: &[i64]) -> Result<Vec<GameDetails>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let games: Vec<RawGame> = self.post("games", games_by_ids_query(ids)).await?;
        Ok(games.into_iter().map(RawGame::into_details).collect())
    }

    async fn top_rated_in_genres(&self, genre_ids: &[i64], limit: usize) -> Result<Vec<GameSummary>> {
        if genre_ids.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let games: Vec<RawGame> = self.post("games", top_rated_query(genre_ids, limit)).await?;
        Ok(games.iter().map(RawGame::to_summary).collect())
    }

    async fn random_game(&self) -> Result<Option<GameSummary>> {
        let total = self.count("games", random_game_filter()).await?;
        if total == 0 {
            return Ok(None);
        }
        let offset = rand::rng().random_range(0..total);
        let body = format!(
            "fields {}; {} limit 1; offset {};",
            GAME_SUMMARY_FIELDS,
            random_game_filter(),
            offset
        );
        let games: Vec<RawGame> = self.post("games", body).await?;
        Ok(games.first().map(RawGame::to_summary))
    }

    async fn search_franchises(&self, query: &str, limit: u32) -> Result<Vec<FranchiseSummary>> {
        let franchises: Vec<RawFranchise> =
            self.post("franchises", search_franchises_query(query, limit)).await?;
        Ok(franchises.into_iter().map(RawFranchise::into_summary).collect())
    }

    async fn random_franchise(&self) -> Result<Option<FranchiseSummary>> {
        let total = self.count("franchises", String::new()).await?;
        if total == 0 {
            return Ok(None);
        }
        let offset = rand::rng().random_range(0..total);
        let body = format!("fields {}; limit 1; offset {};", FRANCHISE_FIELDS, offset);
        let franchises: Vec<RawFranchise> = self.post("franchises", body).await?;
        Ok(franchises.into_iter().next().map(RawFranchise::into_summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_escapes_apicalypse_strings() {
        assert_eq!(quote(" zelda "), "\"zelda\"");
        assert_eq!(quote("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(quote("a\\b\n"), "\"a\\\\b\"");
    }

    #[test]
    fn query_builders_produce_expected_bodies() {
        assert_eq!(
            games_by_ids_query(&[1, 2, 3]),
            format!("fields {}; where id = (1,2,3); limit 3;", GAME_DETAIL_FIELDS)
        );
        let top = top_rated_query(&[12, 31], 20);
        assert!(top.contains("where genres = (12,31)"));
        assert!(top.contains("sort total_rating desc; limit 20;"));
        assert!(search_games_query("Hades", 10).starts_with("search \"Hades\";"));
        assert!(search_franchises_query("Mario", 5).contains("where name ~ *\"Mario\"*;"));
    }

    #[test]
    fn raw_game_maps_to_details() {
        let json = serde_json::json!({
            "id": 1942,
            "name": "The Witcher 3: Wild Hunt",
            "cover": { "id": 89386, "image_id": "co1wyy" },
            "first_release_date": 1431993600,
            "total_rating": 92.4,
            "genres": [{ "id": 12, "name": "Role-playing (RPG)" }],
            "similar_games": [
                { "id": 472, "name": "The Elder Scrolls V: Skyrim" },
                { "id": 1020, "name": "Grand Theft Auto V", "cover": { "id": 1, "image_id": "co2lbd" } }
            ],
            "franchises": [{ "id": 452, "name": "The Witcher" }]
        });
        let raw: RawGame = serde_json::from_value(json).unwrap();
        let details = raw.into_details();

        assert_eq!(details.game.id, 1942);
        assert_eq!(details.game.release_year, Some(2015));
        assert_eq!(
            details.game.cover_url.as_deref(),
            Some("https://images.igdb.com/igdb/image/upload/t_cover_big/co1wyy.jpg")
        );
        assert_eq!(details.genres, vec![Genre { id: 12, name: "Role-playing (RPG)".to_string() }]);
        assert_eq!(details.similar_games.len(), 2);
        assert_eq!(details.similar_games[0].cover_url, None);
        assert!(details.similar_games[1].cover_url.is_some());
        assert_eq!(details.franchises[0].name, "The Witcher");
    }

    #[test]
    fn franchise_cover_comes_from_first_covered_game() {
        let json = serde_json::json!({
            "id": 596,
            "name": "Zelda",
            "games": [{ "id": 1 }, { "id": 2, "cover": { "id": 3, "image_id": "abc" } }]
        });
        let raw: RawFranchise = serde_json::from_value(json).unwrap();
        let summary = raw.into_summary();
        assert_eq!(summary.cover_url, Some(cover_url("abc")));
    }
}
