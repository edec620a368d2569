//! Order API handlers.
//!
//! # Endpoints
//!
//! - `POST /orders`                     – create an order from the cart
//! - `GET  /orders`                     – admin listing (bearer token)
//! - `GET  /orders/{order_id}/status`  – status read, optional long-poll

use axum::{
    Router,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Serialize;
use shamba_core::entities::{CustomerInfo, Order, OrderStatus};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::state::AppState;

mod create_order;
mod get_status;
mod list_orders;

/// Build the order API router.
pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/orders",
            post(create_order::create_order).get(list_orders::list_orders),
        )
        .route("/orders/{order_id}/status", get(get_status::get_status))
}

/// Status view of a single order.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct StatusResponse {
    order_id: Uuid,
    status: OrderStatus,
    total_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    mpesa_receipt_number: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    paid_at: Option<OffsetDateTime>,
}

/// Convert an `Order` (store model) into a `StatusResponse` (API model).
pub(super) fn to_status_response(order: &Order) -> StatusResponse {
    StatusResponse {
        order_id: order.id,
        status: order.status,
        total_amount: order.total_amount,
        mpesa_receipt_number: order.mpesa_receipt_number.clone(),
        paid_at: order.paid_at,
    }
}

/// Administrative summary of an order. Carries customer contact details, so
/// it is only served behind admin auth.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OrderSummary {
    id: Uuid,
    customer_info: CustomerInfo,
    total_amount: Decimal,
    status: OrderStatus,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    paid_at: Option<OffsetDateTime>,
    item_count: usize,
}

pub(super) fn to_summary(order: &Order) -> OrderSummary {
    OrderSummary {
        id: order.id,
        customer_info: order.customer.clone(),
        total_amount: order.total_amount,
        status: order.status,
        created_at: order.created_at,
        paid_at: order.paid_at,
        item_count: order.items.len(),
    }
}
