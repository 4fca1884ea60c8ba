//! OAuth2 client-credentials token exchange with a lazily refreshed cache.

use chrono::Utc;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::ClientError;
use crate::models::OAuthToken;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token_type: String,
    access_token: String,
    /// Seconds until expiry, per the OAuth2 wire format.
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct TokenError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlatformInfo {
    token_endpoint: String,
}

/// Client for the platform token-exchange endpoint.
///
/// The cached token is checked before every authorized call and replaced
/// wholesale once stale. The lock is held across a refresh so concurrent
/// callers never race a second exchange.
pub struct UaaClient {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: Secret<String>,
    cached: Mutex<Option<OAuthToken>>,
}

impl UaaClient {
    pub fn new(
        client: Client,
        token_url: String,
        client_id: String,
        client_secret: Secret<String>,
    ) -> Self {
        Self {
            client,
            token_url,
            client_id,
            client_secret,
            cached: Mutex::new(None),
        }
    }

    /// Discover the token endpoint from the cloud controller API.
    pub async fn discover_token_url(client: &Client, cf_api_url: &str) -> Result<String, ClientError> {
        let url = format!("{}/v2/info", cf_api_url);
        let info: PlatformInfo = client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(format!("{}/oauth/token", info.token_endpoint))
    }

    /// `Authorization` header value backed by the cached token.
    ///
    /// Refreshes through the exchange endpoint when the cache is empty or
    /// the token has lapsed. Nothing is cached when the exchange fails, so
    /// the next call retries it.
    pub async fn authorization(&self) -> Result<String, ClientError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_valid(Utc::now()) {
                return Ok(token.header_value().to_string());
            }
        }

        tracing::debug!(token_url = %self.token_url, "Cached token absent or stale, exchanging");
        let token = self.exchange().await?;
        let header = token.header_value().to_string();
        *cached = Some(token);
        Ok(header)
    }

    async fn exchange(&self) -> Result<OAuthToken, ClientError> {
        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(self.client_secret.expose_secret()))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let body: serde_json::Value = response.json().await?;
        if body.get("error").is_some() {
            let envelope: TokenError = serde_json::from_value(body).map_err(|e| {
                ClientError::AuthError(anyhow::anyhow!("unreadable token error envelope: {}", e))
            })?;
            let description = envelope.error_description.unwrap_or_default();
            tracing::warn!(
                client_id = %self.client_id,
                error = %envelope.error,
                "Token exchange rejected"
            );
            return Err(ClientError::AuthError(anyhow::anyhow!(
                "token exchange failed: {} {}",
                envelope.error,
                description
            )));
        }

        let token: TokenResponse = serde_json::from_value(body).map_err(|e| {
            ClientError::AuthError(anyhow::anyhow!("unexpected token response: {}", e))
        })?;
        Ok(OAuthToken::issue(
            &token.token_type,
            &token.access_token,
            token.expires_in * 1000,
            Utc::now(),
        ))
    }
}
