use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use uuid::Uuid;

use super::super::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub(super) struct CallbackResponse {
    message: &'static str,
}

/// `POST /mpesa/callback/{order_id}` — gateway result callback.
///
/// The payload is taken as raw JSON: an envelope whose nested structure does
/// not parse leaves the order untouched and is still acknowledged, since the
/// gateway's shape has to be trusted. Duplicate deliveries of a settled
/// outcome are acknowledged as well.
pub(super) async fn callback(
    state: State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<CallbackResponse>, ApiError> {
    tracing::info!(order_id = %order_id, "M-Pesa callback received");

    state.service.handle_callback(order_id, payload).await?;

    Ok(Json(CallbackResponse {
        message: "Callback processed successfully",
    }))
}
