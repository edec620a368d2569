use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use super::super::ApiError;
use super::{StatusResponse, to_status_response};
use crate::state::AppState;

/// Upper bound on how long a single status request may be held open.
const MAX_WAIT_MS: u64 = 30_000;

#[derive(Deserialize)]
pub(super) struct StatusQuery {
    /// Hold the request open up to this long waiting for a status change.
    wait_ms: Option<u64>,
}

/// `GET /orders/{order_id}/status` — read order status.
///
/// Without `wait_ms` this is a plain read. With it, the request long-polls:
/// if the order is not yet terminal, the response is deferred until a status
/// change lands or the wait expires, sparing the client a fixed-interval
/// retry loop.
pub(super) async fn get_status(
    state: State<AppState>,
    Path(order_id): Path<Uuid>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusResponse>, ApiError> {
    // Subscribe before the read so a transition racing us is still observed.
    let mut status_rx = state.service.subscribe();

    let order = state.service.get_status(order_id).await?;

    let wait_ms = query.wait_ms.unwrap_or(0).min(MAX_WAIT_MS);
    if wait_ms == 0 || order.status.is_terminal() {
        return Ok(Json(to_status_response(&order)));
    }

    let wait = std::time::Duration::from_millis(wait_ms);
    let _ = tokio::time::timeout(wait, async {
        loop {
            match status_rx.recv().await {
                Ok(event) if event.order_id == order_id => break,
                Ok(_) => continue,
                // Lagged means we missed updates; re-read the store.
                Err(RecvError::Lagged(_)) | Err(RecvError::Closed) => break,
            }
        }
    })
    .await;

    let order = state.service.get_status(order_id).await?;
    Ok(Json(to_status_response(&order)))
}
