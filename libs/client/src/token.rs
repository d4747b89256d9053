use reqwest::Client;
use serde::Deserialize;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use crate::errors::ClientError;

/// Tokens are refreshed once they are this close to expiry.
const REFRESH_MARGIN: Duration = Duration::seconds(60);

#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Option<OffsetDateTime>,
}

impl CachedToken {
    fn is_fresh(&self, now: OffsetDateTime) -> bool {
        match self.expires_at {
            Some(expires_at) => now + REFRESH_MARGIN < expires_at,
            None => true,
        }
    }
}

/// OAuth2 client-credentials token source with an in-memory cache.
pub struct TokenSource {
    http: Client,
    endpoint: Url,
    client_id: String,
    client_secret: String,
    cached: RwLock<Option<CachedToken>>,
}

impl TokenSource {
    pub fn new(http: Client, endpoint: Url, client_id: String, client_secret: String) -> Self {
        Self {
            http,
            endpoint,
            client_id,
            client_secret,
            cached: RwLock::new(None),
        }
    }

    /// Returns a bearer token, exchanging credentials only when the cached
    /// token is missing or close to expiry.
    pub async fn bearer(&self) -> Result<String, ClientError> {
        let now = OffsetDateTime::now_utc();
        if let Some(token) = self.cached.read().await.as_ref() {
            if token.is_fresh(now) {
                return Ok(token.value.clone());
            }
        }

        let mut guard = self.cached.write().await;
        if let Some(token) = guard.as_ref() {
            if token.is_fresh(now) {
                return Ok(token.value.clone());
            }
        }

        let token = self.exchange().await?;
        let expires_at = token.expires_in.map(|secs| now + Duration::seconds(secs));
        debug!(
            token_type = token.token_type.as_deref().unwrap_or("unknown"),
            expires_in = token.expires_in,
            "obtained access token"
        );
        let value = token.access_token.clone();
        *guard = Some(CachedToken {
            value: token.access_token,
            expires_at,
        });
        Ok(value)
    }

    async fn exchange(&self) -> Result<AccessToken, ClientError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        let response = self
            .http
            .post(self.endpoint.clone())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::Token(format!(
                "status={} body={}",
                status.as_u16(),
                body
            )));
        }

        let token: AccessToken = serde_json::from_str(&body)
            .map_err(|err| ClientError::Token(format!("invalid token response: {err}")))?;
        if token.access_token.trim().is_empty() {
            return Err(ClientError::Token("missing access_token".into()));
        }
        Ok(token)
    }
}
