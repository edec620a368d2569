use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shamba_core::entities::{CustomerInfo, LineItem, NewOrder};
use uuid::Uuid;

use super::super::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateOrderRequest {
    #[serde(default)]
    items: Vec<LineItem>,
    customer_info: Option<CustomerPayload>,
    total_amount: Option<Decimal>,
}

/// Customer details with every field defaulted, so an incomplete object is
/// reported as a 400 validation error rather than a deserialization failure.
#[derive(Deserialize)]
pub(super) struct CustomerPayload {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    address: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrderResponse {
    order_id: Uuid,
    message: &'static str,
}

/// `POST /orders` — create an order from the submitted cart.
///
/// Line items and the total are copied verbatim from the request; the total
/// is not recomputed server-side.
pub(super) async fn create_order(
    state: State<AppState>,
    Json(body): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = body.customer_info.ok_or(ApiError::Validation("customerInfo"))?;
    let total_amount = body.total_amount.ok_or(ApiError::Validation("totalAmount"))?;

    let order_id = state
        .service
        .create_order(NewOrder {
            items: body.items,
            customer: CustomerInfo {
                name: customer.name,
                email: customer.email,
                phone: customer.phone,
                address: customer.address,
            },
            total_amount,
        })
        .await?;

    Ok(Json(CreateOrderResponse {
        order_id,
        message: "Order created successfully",
    }))
}
