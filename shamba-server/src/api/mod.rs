//! HTTP API.
//!
//! Everything is served under `/api` (see `server.rs`):
//!
//! - `POST /api/orders`                       – create an order
//! - `GET  /api/orders`                       – admin listing (bearer token)
//! - `GET  /api/orders/{order_id}/status`    – status read, optional long-poll
//! - `POST /api/mpesa/payment`                – initiate STK push
//! - `POST /api/mpesa/callback/{order_id}`   – gateway result callback
//!
//! Errors are caught here, logged, and turned into a generic JSON body; no
//! detail beyond a short message reaches the client.

pub mod extractors;
mod mpesa;
mod orders;

use crate::state::AppState;
use axum::{Json, Router, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use shamba_core::service::ServiceError;

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new().merge(orders::router()).merge(mpesa::router())
}

/// Generic JSON error body.
#[derive(Serialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

/// Errors that can occur in API handlers.
#[derive(Debug)]
pub(crate) enum ApiError {
    /// A required request field is missing or empty.
    Validation(&'static str),
    /// The requested order was not found.
    NotFound,
    /// The order is not in the state the operation requires.
    Conflict(&'static str),
    /// Upstream provider or internal failure; detail stays in the logs.
    Internal,
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(field) => ApiError::Validation(field),
            ServiceError::NotFound(_) => ApiError::NotFound,
            ServiceError::InvalidState(message) => ApiError::Conflict(message),
            ServiceError::Mpesa(e) => {
                tracing::error!(error = %e, "Payment gateway failure");
                ApiError::Internal
            }
            ServiceError::Store(e) => {
                tracing::error!(error = %e, "Order store failure");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Validation(field) => (
                StatusCode::BAD_REQUEST,
                format!("missing required field: {field}"),
            ),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "order not found".to_owned()),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, message.to_owned()),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_owned(),
            ),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}
