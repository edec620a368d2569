//! M-Pesa Daraja gateway client.
//!
//! Covers the two outbound calls the payment flow needs: the OAuth-style
//! credential exchange (with a single-slot token cache, see [`auth`]) and the
//! STK push itself (see [`stk`]). Asynchronous result callbacks from the
//! gateway are parsed by [`callback`].
//!
//! Nothing here is retried; failures propagate to the order service, which
//! leaves the order untouched.

pub mod auth;
pub mod callback;
pub mod phone;
pub mod stk;

use crate::config::MpesaConfig;
use crate::entities::Order;
use async_trait::async_trait;
use rust_decimal::Decimal;
use self::auth::{DarajaAuth, TokenCache};
use self::stk::{StkPushRequest, StkPushResponse};
use thiserror::Error;

/// Errors raised by the gateway client.
#[derive(Debug, Error)]
pub enum MpesaError {
    /// The credential exchange request could not be sent.
    #[error("credential exchange request failed: {0}")]
    AuthRequest(reqwest::Error),

    /// The credential exchange returned a non-2xx status.
    #[error("credential exchange rejected with status {status}")]
    AuthRejected { status: u16, body: String },

    /// The credential exchange body did not parse.
    #[error("malformed credential exchange response: {0}")]
    AuthResponse(reqwest::Error),

    /// The STK push request could not be sent.
    #[error("STK push request failed: {0}")]
    GatewayRequest(reqwest::Error),

    /// The STK push returned a non-2xx status.
    #[error("STK push rejected with status {status}: {body}")]
    GatewayRejected { status: u16, body: String },

    /// The STK push body did not parse.
    #[error("malformed STK push response: {0}")]
    GatewayResponse(reqwest::Error),

    /// The order total cannot be expressed as a whole currency amount.
    #[error("order total {0} is not representable as a whole amount")]
    InvalidAmount(Decimal),

    /// A gateway URL could not be built from the configured base.
    #[error("invalid gateway url: {0}")]
    Url(#[from] url::ParseError),

    /// The per-request timestamp could not be formatted.
    #[error("timestamp formatting failed: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// Seam for initiating an STK push, so the order service can be exercised
/// against a mock gateway.
#[async_trait]
pub trait StkGateway: Send + Sync {
    /// Push a PIN-entry prompt to `phone` for the order's total.
    ///
    /// Returns the gateway's checkout request id, used to correlate the
    /// asynchronous result callback.
    async fn initiate_push(&self, order: &Order, phone: &str) -> Result<String, MpesaError>;
}

/// Live Daraja client.
pub struct MpesaClient {
    http: reqwest::Client,
    config: MpesaConfig,
    tokens: TokenCache<DarajaAuth>,
}

impl MpesaClient {
    pub fn new(config: MpesaConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        let auth = DarajaAuth::new(http.clone(), &config);
        Self {
            http,
            config,
            tokens: TokenCache::new(auth),
        }
    }
}

#[async_trait]
impl StkGateway for MpesaClient {
    async fn initiate_push(&self, order: &Order, phone: &str) -> Result<String, MpesaError> {
        let msisdn = phone::normalize(phone);
        let token = self.tokens.get().await?;
        let request = StkPushRequest::build(&self.config, order, &msisdn)?;
        let url = self.config.base_url.join("/mpesa/stkpush/v1/processrequest")?;

        let response = self
            .http
            .post(url)
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await
            .map_err(MpesaError::GatewayRequest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MpesaError::GatewayRejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: StkPushResponse = response.json().await.map_err(MpesaError::GatewayResponse)?;
        tracing::debug!(
            order_id = %order.id,
            checkout_request_id = %parsed.checkout_request_id,
            "STK push accepted by gateway"
        );
        Ok(parsed.checkout_request_id)
    }
}
