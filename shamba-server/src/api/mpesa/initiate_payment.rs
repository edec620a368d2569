use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::super::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PaymentRequest {
    order_id: Option<Uuid>,
    phone_number: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PaymentResponse {
    message: &'static str,
    checkout_request_id: String,
}

/// `POST /mpesa/payment` — push a payment prompt to the customer's phone.
///
/// The request blocks until the gateway answers; on gateway failure the
/// order is left untouched and a generic 500 is returned.
pub(super) async fn initiate_payment(
    state: State<AppState>,
    Json(body): Json<PaymentRequest>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let order_id = body.order_id.ok_or(ApiError::Validation("orderId"))?;
    let phone_number = body
        .phone_number
        .filter(|phone| !phone.trim().is_empty())
        .ok_or(ApiError::Validation("phoneNumber"))?;

    let checkout_request_id = state
        .service
        .initiate_payment(order_id, &phone_number)
        .await?;

    Ok(Json(PaymentResponse {
        message: "Payment initiated successfully",
        checkout_request_id,
    }))
}
