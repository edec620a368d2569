//! Daraja credential exchange and the single-slot token cache.

use super::MpesaError;
use crate::config::MpesaConfig;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use time::OffsetDateTime;
use tokio::sync::Mutex;

/// Tokens are refreshed this long before the provider's stated expiry.
const EXPIRY_MARGIN: time::Duration = time::Duration::seconds(60);

/// A freshly issued access token, as returned by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct IssuedToken {
    pub access_token: String,
    /// Provider TTL in seconds. Daraja returns this as a JSON string.
    #[serde(deserialize_with = "string_or_number")]
    pub expires_in: u64,
}

/// Seam for the credential exchange, so the cache can be tested without a
/// live endpoint.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch(&self) -> Result<IssuedToken, MpesaError>;
}

/// Performs the OAuth-style client-credentials exchange against Daraja.
pub struct DarajaAuth {
    http: reqwest::Client,
    consumer_key: String,
    consumer_secret: String,
    base_url: url::Url,
}

impl DarajaAuth {
    pub fn new(http: reqwest::Client, config: &MpesaConfig) -> Self {
        Self {
            http,
            consumer_key: config.consumer_key.clone(),
            consumer_secret: config.consumer_secret.clone(),
            base_url: config.base_url.clone(),
        }
    }
}

#[async_trait]
impl TokenSource for DarajaAuth {
    async fn fetch(&self) -> Result<IssuedToken, MpesaError> {
        let url = self
            .base_url
            .join("/oauth/v1/generate?grant_type=client_credentials")?;

        let response = self
            .http
            .get(url)
            .basic_auth(&self.consumer_key, Some(&self.consumer_secret))
            .send()
            .await
            .map_err(MpesaError::AuthRequest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MpesaError::AuthRejected {
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(MpesaError::AuthResponse)
    }
}

struct CachedToken {
    token: String,
    expires_at: OffsetDateTime,
}

/// Holds at most one access token and refreshes it lazily.
///
/// The slot mutex is held across the exchange, so concurrent callers that
/// find the token expired trigger exactly one refresh.
pub struct TokenCache<S> {
    source: S,
    slot: Mutex<Option<CachedToken>>,
}

impl<S: TokenSource> TokenCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            slot: Mutex::new(None),
        }
    }

    /// Return the cached token while valid, otherwise exchange credentials
    /// for a new one and cache it with the safety margin applied.
    pub async fn get(&self) -> Result<String, MpesaError> {
        let mut slot = self.slot.lock().await;

        if let Some(cached) = slot.as_ref() {
            if OffsetDateTime::now_utc() < cached.expires_at {
                return Ok(cached.token.clone());
            }
        }

        let issued = self.source.fetch().await?;
        let ttl = time::Duration::seconds(issued.expires_in.min(i64::MAX as u64) as i64);
        let expires_at = OffsetDateTime::now_utc() + ttl - EXPIRY_MARGIN;
        tracing::debug!(expires_in = issued.expires_in, "Access token refreshed");

        let token = issued.access_token;
        *slot = Some(CachedToken {
            token: token.clone(),
            expires_at,
        });
        Ok(token)
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}
