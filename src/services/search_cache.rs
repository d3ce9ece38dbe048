use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{de::DeserializeOwned, Serialize};

use crate::constants::SEARCH_KEY_PREFIX;

/// Search Cache - short-lived Redis cache in front of catalog searches.
/// Cache failures are logged and treated as misses.
#[derive(Clone)]
pub struct SearchCache {
    redis: ConnectionManager,
    ttl_secs: u64,
}

/// Cache key for a search; the query is lowercased and whitespace-collapsed
/// so trivially different inputs share an entry.
pub fn search_key(scope: &str, query: &str, limit: u32) -> String {
    let normalized = query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    format!("{}:{}:{}:{}", SEARCH_KEY_PREFIX, scope, limit, normalized)
}

impl SearchCache {
    pub fn new(redis: ConnectionManager, ttl_secs: u64) -> Self {
        Self { redis, ttl_secs }
    }

    pub fn enabled(&self) -> bool {
        self.ttl_secs > 0
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.enabled() {
            return None;
        }
        let mut conn = self.redis.clone();
        let payload: Option<String> = match conn.get(key).await {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("Search cache read failed key={} err={}", key, err);
                return None;
            }
        };
        payload.and_then(|raw| match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!("Search cache entry unreadable key={} err={}", key, err);
                None
            }
        })
    }

    pub async fn put<T: Serialize>(&self, key: &str, value: &T) {
        if !self.enabled() {
            return;
        }
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!("Search cache encode failed key={} err={}", key, err);
                return;
            }
        };
        let mut conn = self.redis.clone();
        let result: std::result::Result<(), redis::RedisError> =
            conn.set_ex(key, payload, self.ttl_secs).await;
        if let Err(err) = result {
            tracing::warn!("Search cache write failed key={} err={}", key, err);
        }
    }
}
