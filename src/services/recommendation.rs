use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::{
    constants::{FALLBACK_FETCH_LIMIT, FALLBACK_GENRE_COUNT, FALLBACK_GENRE_WEIGHT, RECOMMENDATION_LIMIT},
    error::Result,
    integrations::GameCatalog,
    models::{GameDetails, GameSummary},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    SimilarGames,
    Genre,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub game: GameSummary,
    /// Raw score: similarity hits, or the fallback weight.
    pub score: f64,
    /// `score` rounded up for display.
    pub display_score: i64,
    pub source: RecommendationSource,
}

#[derive(Debug, Clone)]
struct Candidate {
    game: GameSummary,
    score: f64,
    source: RecommendationSource,
}

/// Candidate scores keyed by game id, in order of first occurrence.
#[derive(Debug, Default)]
pub struct CandidateTally {
    candidates: Vec<Candidate>,
    index: HashMap<i64, usize>,
    excluded: HashSet<i64>,
}

impl CandidateTally {
    pub fn new(excluded: impl IntoIterator<Item = i64>) -> Self {
        Self {
            excluded: excluded.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// One point per appearance in a list game's similar games.
    pub fn add_similar(&mut self, games: &[GameDetails]) {
        for similar in games.iter().flat_map(|g| g.similar_games.iter()) {
            if self.excluded.contains(&similar.id) {
                continue;
            }
            match self.index.get(&similar.id) {
                Some(&pos) => self.candidates[pos].score += 1.0,
                None => {
                    self.index.insert(similar.id, self.candidates.len());
                    self.candidates.push(Candidate {
                        game: similar.clone(),
                        score: 1.0,
                        source: RecommendationSource::SimilarGames,
                    });
                }
            }
        }
    }

    /// Genre-based games not already in the list or counted.
    pub fn add_fallback(&mut self, games: &[GameSummary], weight: f64) {
        for game in games {
            if self.excluded.contains(&game.id) || self.index.contains_key(&game.id) {
                continue;
            }
            self.index.insert(game.id, self.candidates.len());
            self.candidates.push(Candidate {
                game: game.clone(),
                score: weight,
                source: RecommendationSource::Genre,
            });
        }
    }

    /// Highest scores first; equal scores keep first-occurrence order.
    pub fn finish(self, limit: usize) -> Vec<Recommendation> {
        let mut candidates = self.candidates;
        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        candidates
            .into_iter()
            .take(limit)
            .map(|c| Recommendation {
                display_score: c.score.ceil() as i64,
                score: c.score,
                game: c.game,
                source: c.source,
            })
            .collect()
    }
}

/// The `count` most frequent genre ids across `games`, ties broken by first
/// occurrence.
pub fn top_genres(games: &[GameDetails], count: usize) -> Vec<i64> {
    let mut order: Vec<i64> = Vec::new();
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for genre in games.iter().flat_map(|g| g.genres.iter()) {
        let entry = counts.entry(genre.id).or_insert(0);
        if *entry == 0 {
            order.push(genre.id);
        }
        *entry += 1;
    }
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order.truncate(count);
    order
}

/// Puts catalog results back into list order; the catalog does not
/// preserve the order ids were requested in.
fn order_by_list(games: &mut [GameDetails], list_game_ids: &[i64]) {
    let rank: HashMap<i64, usize> = list_game_ids
        .iter()
        .enumerate()
        .map(|(pos, &id)| (id, pos))
        .collect();
    games.sort_by_key(|g| rank.get(&g.game.id).copied().unwrap_or(usize::MAX));
}

/// Recommender - suggests games for a list from similar-game links, falling
/// back to top-rated games in the list's main genres.
pub struct Recommender {
    catalog: Arc<dyn GameCatalog>,
}

impl Recommender {
    pub fn new(catalog: Arc<dyn GameCatalog>) -> Self {
        Self { catalog }
    }

    pub async fn recommend(&self, list_game_ids: &[i64]) -> Result<Vec<Recommendation>> {
        if list_game_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut games = self.catalog.games_by_ids(list_game_ids).await?;
        order_by_list(&mut games, list_game_ids);
        let mut tally = CandidateTally::new(list_game_ids.iter().copied());
        tally.add_similar(&games);

        if tally.len() < RECOMMENDATION_LIMIT {
            let genres = top_genres(&games, FALLBACK_GENRE_COUNT);
            if !genres.is_empty() {
                match self
                    .catalog
                    .top_rated_in_genres(&genres, FALLBACK_FETCH_LIMIT)
                    .await
                {
                    Ok(fallback) => tally.add_fallback(&fallback, FALLBACK_GENRE_WEIGHT),
                    Err(e) => tracing::warn!("Genre fallback skipped for genres {:?}: {}", genres, e),
                }
            }
        }

        let recommendations = tally.finish(RECOMMENDATION_LIMIT);
        tracing::debug!(
            "Recommendations computed: list_games={}, results={}",
            list_game_ids.len(),
            recommendations.len()
        );
        Ok(recommendations)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{FranchiseSummary, Genre};
    use std::sync::Mutex;

    pub(crate) fn summary(id: i64) -> GameSummary {
        GameSummary {
            id,
            name: format!("Game {}", id),
            cover_url: None,
            release_year: None,
            rating: None,
        }
    }

    fn details(id: i64, similar: &[i64], genres: &[i64]) -> GameDetails {
        GameDetails {
            game: summary(id),
            summary: None,
            genres: genres
                .iter()
                .map(|&g| Genre { id: g, name: format!("Genre {}", g) })
                .collect(),
            similar_games: similar.iter().map(|&s| summary(s)).collect(),
            franchises: Vec::new(),
        }
    }

    #[derive(Default)]
    pub(crate) struct FakeCatalog {
        pub games: Vec<GameDetails>,
        pub top_rated: Vec<GameSummary>,
        pub fail_top_rated: bool,
        pub genre_calls: Mutex<Vec<Vec<i64>>>,
    }

    #[async_trait::async_trait]
    impl GameCatalog for FakeCatalog {
        async fn search_games(&self, query: &str, limit: u32) -> Result<Vec<GameSummary>> {
            Ok(self
                .games
                .iter()
                .filter(|g| g.game.name.contains(query))
                .take(limit as usize)
                .map(|g| g.game.clone())
                .collect())
        }

        async fn game(&self, id: i64) -> Result<Option<GameDetails>> {
            Ok(self.games.iter().find(|g| g.game.id == id).cloned())
        }

        async fn games_by_ids(&self, ids: &[i64]) -> Result<Vec<GameDetails>> {
            Ok(self
                .games
                .iter()
                .filter(|g| ids.contains(&g.game.id))
                .cloned()
                .collect())
        }

        async fn top_rated_in_genres(&self, genre_ids: &[i64], limit: usize) -> Result<Vec<GameSummary>> {
            self.genre_calls.lock().unwrap().push(genre_ids.to_vec());
            if self.fail_top_rated {
                return Err(AppError::ExternalAPI("catalog down".to_string()));
            }
            Ok(self.top_rated.iter().take(limit).cloned().collect())
        }

        async fn random_game(&self) -> Result<Option<GameSummary>> {
            Ok(self.games.first().map(|g| g.game.clone()))
        }

        async fn search_franchises(&self, _query: &str, _limit: u32) -> Result<Vec<FranchiseSummary>> {
            Ok(Vec::new())
        }

        async fn random_franchise(&self) -> Result<Option<FranchiseSummary>> {
            Ok(None)
        }
    }

    fn ids(recs: &[Recommendation]) -> Vec<i64> {
        recs.iter().map(|r| r.game.id).collect()
    }

    #[test]
    fn similar_games_are_counted_across_the_list() {
        // A -> [C, D], B -> [C, E]
        let games = vec![details(1, &[3, 4], &[]), details(2, &[3, 5], &[])];
        let mut tally = CandidateTally::new([1, 2]);
        tally.add_similar(&games);
        let recs = tally.finish(5);

        assert_eq!(ids(&recs), vec![3, 4, 5]);
        let scores: Vec<i64> = recs.iter().map(|r| r.display_score).collect();
        assert_eq!(scores, vec![2, 1, 1]);
    }

    #[test]
    fn games_in_the_list_are_never_recommended() {
        let games = vec![details(1, &[2, 3], &[]), details(2, &[1, 3], &[])];
        let mut tally = CandidateTally::new([1, 2]);
        tally.add_similar(&games);
        tally.add_fallback(&[summary(1), summary(2), summary(9)], 0.5);
        let recs = tally.finish(5);
        assert_eq!(ids(&recs), vec![3, 9]);
    }

    #[test]
    fn fallback_skips_counted_games_and_uses_half_weight() {
        let games = vec![details(1, &[3], &[])];
        let mut tally = CandidateTally::new([1]);
        tally.add_similar(&games);
        tally.add_fallback(&[summary(3), summary(7), summary(8)], 0.5);
        let recs = tally.finish(5);

        assert_eq!(ids(&recs), vec![3, 7, 8]);
        assert_eq!(recs[0].score, 1.0);
        assert_eq!(recs[1].score, 0.5);
        assert_eq!(recs[1].display_score, 1);
        assert_eq!(recs[1].source, RecommendationSource::Genre);
    }

    #[test]
    fn output_is_truncated_to_limit() {
        let games = vec![details(1, &[10, 11, 12, 13, 14, 15, 16], &[])];
        let mut tally = CandidateTally::new([1]);
        tally.add_similar(&games);
        assert_eq!(tally.finish(5).len(), 5);
    }

    #[test]
    fn top_genres_by_frequency_then_first_seen() {
        let games = vec![
            details(1, &[], &[5, 7]),
            details(2, &[], &[7, 9]),
            details(3, &[], &[9, 11]),
        ];
        assert_eq!(top_genres(&games, 2), vec![7, 9]);
        assert!(top_genres(&[], 2).is_empty());
    }

    #[tokio::test]
    async fn recommender_falls_back_to_genres_when_short() {
        let catalog = Arc::new(FakeCatalog {
            games: vec![details(1, &[3, 4], &[12, 31]), details(2, &[3, 5], &[12])],
            top_rated: vec![summary(1), summary(4), summary(20), summary(21), summary(22)],
            ..Default::default()
        });
        let recommender = Recommender::new(catalog.clone());

        let recs = recommender.recommend(&[1, 2]).await.unwrap();

        assert_eq!(ids(&recs), vec![3, 4, 5, 20, 21]);
        assert_eq!(catalog.genre_calls.lock().unwrap().as_slice(), &[vec![12, 31]]);
    }

    #[tokio::test]
    async fn ties_follow_list_order_not_catalog_order() {
        let catalog = Arc::new(FakeCatalog {
            games: vec![details(2, &[30], &[]), details(1, &[10], &[])],
            ..Default::default()
        });
        let recommender = Recommender::new(catalog);

        let recs = recommender.recommend(&[1, 2]).await.unwrap();
        assert_eq!(ids(&recs), vec![10, 30]);
    }

    #[tokio::test]
    async fn recommender_skips_fallback_with_enough_candidates() {
        let catalog = Arc::new(FakeCatalog {
            games: vec![details(1, &[3, 4, 5, 6, 7], &[12])],
            top_rated: vec![summary(20)],
            ..Default::default()
        });
        let recommender = Recommender::new(catalog.clone());

        let recs = recommender.recommend(&[1]).await.unwrap();

        assert_eq!(ids(&recs), vec![3, 4, 5, 6, 7]);
        assert!(catalog.genre_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn recommender_degrades_when_fallback_fails() {
        let catalog = Arc::new(FakeCatalog {
            games: vec![details(1, &[3], &[12])],
            fail_top_rated: true,
            ..Default::default()
        });
        let recommender = Recommender::new(catalog);

        let recs = recommender.recommend(&[1]).await.unwrap();
        assert_eq!(ids(&recs), vec![3]);
    }

    #[tokio::test]
    async fn empty_list_has_no_recommendations() {
        let recommender = Recommender::new(Arc::new(FakeCatalog::default()));
        assert!(recommender.recommend(&[]).await.unwrap().is_empty());
    }
}
