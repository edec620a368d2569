use axum::{Json, extract::State};

use super::super::ApiError;
use super::{OrderSummary, to_summary};
use crate::api::extractors::AdminAuth;
use crate::state::AppState;

/// `GET /orders` — administrative listing of every order, oldest first.
///
/// No filtering or pagination; requires the admin bearer token because the
/// summaries expose customer contact details.
pub(super) async fn list_orders(
    state: State<AppState>,
    _auth: AdminAuth,
) -> Result<Json<Vec<OrderSummary>>, ApiError> {
    let orders = state.service.list_orders().await;
    Ok(Json(orders.iter().map(to_summary).collect()))
}
