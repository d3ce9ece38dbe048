use serde::{Deserialize, Serialize};

// ==================== CATALOG ====================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub id: i64,
    pub name: String,
    pub cover_url: Option<String>,
    pub release_year: Option<i32>,
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameDetails {
    #[serde(flatten)]
    pub game: GameSummary,
    pub summary: Option<String>,
    pub genres: Vec<Genre>,
    pub similar_games: Vec<GameSummary>,
    pub franchises: Vec<FranchiseSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FranchiseSummary {
    pub id: i64,
    pub name: String,
    pub cover_url: Option<String>,
}
