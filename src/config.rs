use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Redis
    pub redis_url: String,

    // Auth (tokens are issued by the hosted auth provider)
    pub jwt_secret: String,

    // Game catalog
    pub igdb_client_id: String,
    pub igdb_client_secret: String,
    pub igdb_api_url: String,
    pub twitch_token_url: String,
    pub catalog_timeout_secs: u64,

    // Caching
    pub search_cache_ttl_secs: u64,
    pub draft_ttl_secs: u64,

    // Paging
    pub max_page_limit: u32,

    // CORS
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            database_url: env::var("DATABASE_URL")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()?,

            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),

            jwt_secret: env::var("JWT_SECRET")?,

            igdb_client_id: env::var("IGDB_CLIENT_ID")?,
            igdb_client_secret: env::var("IGDB_CLIENT_SECRET")?,
            igdb_api_url: env::var("IGDB_API_URL")
                .unwrap_or_else(|_| "https://api.igdb.com/v4".to_string()),
            twitch_token_url: env::var("TWITCH_TOKEN_URL")
                .unwrap_or_else(|_| "https://id.twitch.tv/oauth2/token".to_string()),
            catalog_timeout_secs: env::var("CATALOG_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,

            search_cache_ttl_secs: env::var("SEARCH_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()?,
            draft_ttl_secs: env::var("DRAFT_TTL_SECS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()?,

            max_page_limit: env::var("MAX_PAGE_LIMIT")
                .unwrap_or_else(|_| "50".to_string())
                .parse()?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL is empty");
        }
        if self.jwt_secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET is empty");
        }
        if self.igdb_client_id.trim().is_empty() || self.igdb_client_secret.trim().is_empty() {
            anyhow::bail!("IGDB credentials are missing");
        }
        if self.draft_ttl_secs == 0 {
            anyhow::bail!("DRAFT_TTL_SECS must be > 0");
        }

        if self.jwt_secret.contains("super_secret") || self.jwt_secret.len() < 32 {
            if self.is_production() {
                anyhow::bail!("JWT_SECRET is too weak for production");
            }
            tracing::warn!("JWT_SECRET looks like a development secret");
        }
        if self.search_cache_ttl_secs == 0 {
            tracing::warn!("Search cache disabled (SEARCH_CACHE_TTL_SECS=0)");
        }
        if self.max_page_limit == 0 {
            tracing::warn!("MAX_PAGE_LIMIT should be > 0");
        }
        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}
