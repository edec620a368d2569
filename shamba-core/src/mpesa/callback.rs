//! Gateway result callback envelope.
//!
//! The gateway's envelope shape has to be trusted: a payload whose nested
//! structure does not parse is classified as [`CallbackOutcome::Ignored`]
//! rather than an error, leaving the order in its prior state.

use serde::Deserialize;
use serde_json::Value;

/// Metadata entry name carrying the receipt number on success.
pub const RECEIPT_NUMBER_KEY: &str = "MpesaReceiptNumber";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackEnvelope {
    #[serde(rename = "Body")]
    pub body: Option<CallbackBody>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackBody {
    #[serde(rename = "stkCallback")]
    pub stk_callback: Option<StkCallback>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StkCallback {
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: Option<String>,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: Option<String>,
    #[serde(rename = "ResultCode")]
    pub result_code: i64,
    #[serde(rename = "ResultDesc")]
    pub result_desc: Option<String>,
    #[serde(rename = "CallbackMetadata")]
    pub metadata: Option<CallbackMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackMetadata {
    #[serde(rename = "Item", default)]
    pub item: Vec<MetadataItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetadataItem {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value")]
    pub value: Option<Value>,
}

impl StkCallback {
    /// Scan the metadata list for the receipt number entry.
    pub fn receipt_number(&self) -> Option<String> {
        self.metadata
            .as_ref()?
            .item
            .iter()
            .find(|item| item.name == RECEIPT_NUMBER_KEY)
            .and_then(|item| item.value.as_ref())
            .map(value_to_string)
    }
}

/// What a callback payload means for the order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Result code zero; payment went through.
    Completed { receipt: Option<String> },
    /// Non-zero result code with the provider's description.
    Failed { reason: String },
    /// Envelope missing or malformed; leave the order alone.
    Ignored,
}

impl CallbackOutcome {
    pub fn from_payload(payload: &Value) -> Self {
        let Ok(envelope) = serde_json::from_value::<CallbackEnvelope>(payload.clone()) else {
            return CallbackOutcome::Ignored;
        };
        let Some(callback) = envelope.body.and_then(|body| body.stk_callback) else {
            return CallbackOutcome::Ignored;
        };

        if callback.result_code == 0 {
            CallbackOutcome::Completed {
                receipt: callback.receipt_number(),
            }
        } else {
            let reason = callback.result_desc.clone().unwrap_or_else(|| {
                format!("payment failed with result code {}", callback.result_code)
            });
            CallbackOutcome::Failed { reason }
        }
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
