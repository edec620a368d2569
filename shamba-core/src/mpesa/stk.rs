//! STK push request construction.

use super::MpesaError;
use crate::config::MpesaConfig;
use crate::entities::Order;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::FormatItem;
use time::macros::format_description;

/// Fixed Daraja transaction type for paybill payments.
pub const TRANSACTION_TYPE: &str = "CustomerPayBillOnline";

/// Compact numeric timestamp the password is derived from.
const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year][month][day][hour][minute][second]");

/// Wire format of the STK push request (Daraja field names).
#[derive(Debug, Clone, Serialize)]
pub struct StkPushRequest {
    #[serde(rename = "BusinessShortCode")]
    pub business_short_code: String,
    #[serde(rename = "Password")]
    pub password: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "TransactionType")]
    pub transaction_type: &'static str,
    #[serde(rename = "Amount")]
    pub amount: u64,
    #[serde(rename = "PartyA")]
    pub party_a: String,
    #[serde(rename = "PartyB")]
    pub party_b: String,
    #[serde(rename = "PhoneNumber")]
    pub phone_number: String,
    #[serde(rename = "CallBackURL")]
    pub callback_url: String,
    #[serde(rename = "AccountReference")]
    pub account_reference: String,
    #[serde(rename = "TransactionDesc")]
    pub transaction_desc: String,
}

impl StkPushRequest {
    /// Assemble a push request for `order`, payable by `msisdn`.
    ///
    /// The timestamp is generated fresh per request; the password is the
    /// base64 of short code + passkey + timestamp.
    pub fn build(
        config: &MpesaConfig,
        order: &Order,
        msisdn: &str,
    ) -> Result<Self, MpesaError> {
        let timestamp = OffsetDateTime::now_utc().format(TIMESTAMP_FORMAT)?;
        let password = password(&config.business_short_code, &config.passkey, &timestamp);
        let amount = order
            .total_amount
            .round()
            .to_u64()
            .ok_or(MpesaError::InvalidAmount(order.total_amount))?;

        let id = order.id.to_string();
        let short_id = &id[..8];
        let callback_url = format!(
            "{}/{}",
            config.callback_url.as_str().trim_end_matches('/'),
            order.id
        );

        Ok(Self {
            business_short_code: config.business_short_code.clone(),
            password,
            timestamp,
            transaction_type: TRANSACTION_TYPE,
            amount,
            party_a: msisdn.to_owned(),
            party_b: config.business_short_code.clone(),
            phone_number: msisdn.to_owned(),
            callback_url,
            account_reference: format!("ORDER-{short_id}"),
            transaction_desc: format!("Payment for order {short_id}"),
        })
    }
}

/// Wire format of the STK push response; only the correlation id is kept.
#[derive(Debug, Clone, Deserialize)]
pub struct StkPushResponse {
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
}

/// Base64 of `short_code + passkey + timestamp`.
pub fn password(short_code: &str, passkey: &str, timestamp: &str) -> String {
    BASE64.encode(format!("{short_code}{passkey}{timestamp}"))
}
