use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use url::Url;

use crate::{
    constants::TOKEN_REFRESH_MARGIN_SECS,
    error::{AppError, Result},
};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        now + Duration::from_secs(TOKEN_REFRESH_MARGIN_SECS) < self.expires_at
    }
}

/// Client-credentials token for the catalog API, cached until shortly
/// before it expires.
#[derive(Clone, Debug)]
pub struct TwitchAuthClient {
    token_url: String,
    client_id: String,
    client_secret: String,
    client: Client,
    cached: Arc<RwLock<Option<CachedToken>>>,
}

impl TwitchAuthClient {
    pub fn new(token_url: String, client_id: String, client_secret: String, client: Client) -> Self {
        Self {
            token_url,
            client_id,
            client_secret,
            client,
            cached: Arc::new(RwLock::new(None)),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub async fn access_token(&self) -> Result<String> {
        let now = Instant::now();
        if let Some(token) = self.cached.read().await.as_ref() {
            if token.is_fresh(now) {
                return Ok(token.value.clone());
            }
        }

        let mut guard = self.cached.write().await;
        if let Some(token) = guard.as_ref() {
            if token.is_fresh(Instant::now()) {
                return Ok(token.value.clone());
            }
        }

        let fresh = self.fetch_token().await?;
        let value = fresh.value.clone();
        *guard = Some(fresh);
        Ok(value)
    }

    /// Drops the cached token so the next call fetches a new one.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }

    async fn fetch_token(&self) -> Result<CachedToken> {
        let mut url = Url::parse(&self.token_url)
            .map_err(|e| AppError::Internal(format!("Invalid token URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("client_secret", &self.client_secret)
            .append_pair("grant_type", "client_credentials");

        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|e| AppError::ExternalAPI(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalAPI(format!(
                "Token request rejected ({}): {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalAPI(format!("Token response parse failed: {}", e)))?;

        tracing::debug!("Catalog access token refreshed (expires_in={}s)", token.expires_in);

        Ok(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        })
    }
}
