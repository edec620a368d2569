//! M-Pesa payment API handlers.
//!
//! # Endpoints
//!
//! - `POST /mpesa/payment`               – initiate an STK push for an order
//! - `POST /mpesa/callback/{order_id}`  – gateway result callback

use axum::{Router, routing::post};

use crate::state::AppState;

mod callback;
mod initiate_payment;

/// Build the M-Pesa API router.
pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/mpesa/payment", post(initiate_payment::initiate_payment))
        .route("/mpesa/callback/{order_id}", post(callback::callback))
}
