use crate::circuit_breaker::{ApiCircuitBreaker, ApiCircuitBreakerConfig, ApiCircuitState};
use crate::error::QueryError;
use crate::models::BroadcastRecord;
use chrono::{DateTime, Utc};
use log::{debug, info};
use parking_lot::RwLock;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

const TWITCH_API: &str = "https://api.twitch.tv";
const TWITCH_TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";

/// Helix caps `first` at 100; anything past the first page is not fetched.
pub const MAX_PAGE_SIZE: usize = 100;

/// How the client authenticates against Helix.
#[derive(Clone)]
pub enum TwitchAuth {
    /// Only the `Client-Id` header is sent.
    ClientIdOnly,
    /// A pre-issued access token.
    Static(String),
    /// App access token obtained with the client-credentials grant.
    ClientCredentials { client_secret: String },
}

#[derive(Clone)]
pub struct TwitchClient {
    client: Client,
    base_url: String,
    token_url: String,
    client_id: String,
    auth: TwitchAuth,
    app_token: Arc<RwLock<Option<String>>>,
    circuit_breaker: Arc<ApiCircuitBreaker>,
}

impl std::fmt::Debug for TwitchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitchClient")
            .field("base_url", &self.base_url)
            .field("circuit_breaker_state", &self.circuit_breaker.state())
            .finish()
    }
}

/// Query parameters for `GET /helix/streams`.
#[derive(Debug, Clone)]
pub struct StreamQuery {
    pub game_id: String,
    pub first: usize,
}

/// One entry of the Helix `streams` response.
#[derive(Debug, Clone, Deserialize)]
pub struct HelixStream {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub user_login: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub game_id: String,
    #[serde(default)]
    pub game_name: String,
    #[serde(rename = "type", default)]
    pub stream_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub viewer_count: u64,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub thumbnail_url: String,
    // Legacy tag ids, still returned (possibly null) by some deployments.
    #[serde(default)]
    pub tag_ids: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl From<HelixStream> for BroadcastRecord {
    fn from(stream: HelixStream) -> Self {
        let mut tags = stream.tag_ids.unwrap_or_default();
        for tag in stream.tags.unwrap_or_default() {
            if !tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
                tags.push(tag);
            }
        }

        BroadcastRecord {
            id: stream.id,
            user_id: stream.user_id,
            user_login: stream.user_login,
            user_name: stream.user_name,
            game_id: stream.game_id,
            game_name: stream.game_name,
            title: stream.title,
            viewer_count: stream.viewer_count,
            started_at: stream.started_at,
            language: stream.language,
            thumbnail_url: stream.thumbnail_url,
            tags,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StreamsResponse {
    #[serde(default)]
    data: Vec<HelixStream>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl TwitchClient {
    pub fn new(client_id: String, auth: TwitchAuth) -> Self {
        Self::with_base_url(client_id, auth, TWITCH_API.to_string())
    }

    /// Point the client at a different Helix host (proxies, local fakes).
    pub fn with_base_url(client_id: String, auth: TwitchAuth, base_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            token_url: TWITCH_TOKEN_URL.to_string(),
            client_id,
            auth,
            app_token: Arc::new(RwLock::new(None)),
            circuit_breaker: Arc::new(ApiCircuitBreaker::new(
                "twitch",
                ApiCircuitBreakerConfig {
                    failure_threshold: 5,
                    recovery_timeout: Duration::from_secs(30),
                    success_threshold: 1,
                },
            )),
        }
    }

    /// Check if the Twitch API is available (circuit breaker is not open)
    pub fn is_available(&self) -> bool {
        self.circuit_breaker.is_available()
    }

    pub fn circuit_state(&self) -> ApiCircuitState {
        self.circuit_breaker.state()
    }

    /// Fetch live streams for one game. Returns at most `query.first` entries.
    pub async fn get_streams(&self, query: &StreamQuery) -> Result<Vec<BroadcastRecord>, QueryError> {
        if !self.circuit_breaker.is_available() {
            return Err(QueryError::CircuitOpen {
                api: self.circuit_breaker.name().to_string(),
            });
        }

        let result = self.fetch_streams_internal(query).await;

        match &result {
            Ok(_) => self.circuit_breaker.record_success(),
            Err(_) => self.circuit_breaker.record_failure(),
        }

        result
    }

    async fn fetch_streams_internal(&self, query: &StreamQuery) -> Result<Vec<BroadcastRecord>, QueryError> {
        let url = format!("{}/helix/streams", self.base_url);
        let first = query.first.clamp(1, MAX_PAGE_SIZE).to_string();

        let mut request = self
            .client
            .get(&url)
            .query(&[
                ("game_id", query.game_id.as_str()),
                ("type", "live"),
                ("first", first.as_str()),
            ])
            .header("Client-Id", &self.client_id)
            .header("Accept", "application/json");

        if let Some(token) = self.bearer_token().await? {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await?;
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED {
            // Drop a cached app token so the next call re-authenticates.
            self.app_token.write().take();
            let body = resp.text().await.unwrap_or_default();
            return Err(QueryError::Auth(format!("Helix rejected credentials: {}", body)));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = resp
                .headers()
                .get("Ratelimit-Reset")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<i64>().ok())
                .map(|reset| (reset - Utc::now().timestamp()).max(0) as u64);
            return Err(QueryError::RateLimited { retry_after_secs });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(QueryError::Status { status, body });
        }

        let body = resp.text().await?;
        let records = parse_streams(&body)?;
        debug!("Helix returned {} live streams for game {}", records.len(), query.game_id);
        Ok(records)
    }

    async fn bearer_token(&self) -> Result<Option<String>, QueryError> {
        match &self.auth {
            TwitchAuth::ClientIdOnly => Ok(None),
            TwitchAuth::Static(token) => Ok(Some(token.clone())),
            TwitchAuth::ClientCredentials { client_secret } => {
                let cached = self.app_token.read().clone();
                if cached.is_some() {
                    return Ok(cached);
                }
                let token = self.request_app_token(client_secret).await?;
                *self.app_token.write() = Some(token.clone());
                Ok(Some(token))
            }
        }
    }

    async fn request_app_token(&self, client_secret: &str) -> Result<String, QueryError> {
        let resp = self
            .client
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", client_secret),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(QueryError::Auth(format!("token request returned {}: {}", status, body)));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| QueryError::Decode(format!("token response: {}", e)))?;
        info!("Obtained Twitch app access token");
        Ok(token.access_token)
    }
}

/// Parse a Helix `streams` response body into broadcast records.
pub fn parse_streams(body: &str) -> Result<Vec<BroadcastRecord>, QueryError> {
    let parsed: StreamsResponse =
        serde_json::from_str(body).map_err(|e| QueryError::Decode(format!("streams response: {}", e)))?;
    Ok(parsed.data.into_iter().map(BroadcastRecord::from).collect())
}
