//! Validated runtime configuration shared with the gateway client.
//!
//! Loading and environment parsing is handled by the server crate; this
//! module only defines the typed result.

use url::Url;

/// Daraja sandbox host; production deployments override it.
pub const DEFAULT_MPESA_BASE_URL: &str = "https://sandbox.safaricom.co.ke";

/// Credentials and routing for the M-Pesa Daraja API.
#[derive(Debug, Clone)]
pub struct MpesaConfig {
    /// OAuth consumer key for the credential exchange.
    pub consumer_key: String,
    /// OAuth consumer secret for the credential exchange.
    pub consumer_secret: String,
    /// Paybill/till number the payment is routed to.
    pub business_short_code: String,
    /// Passkey used to derive the STK push password.
    pub passkey: String,
    /// Base URL callbacks are delivered to; the order id is appended.
    pub callback_url: Url,
    /// Daraja API host.
    pub base_url: Url,
}
