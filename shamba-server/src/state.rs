//! Application state shared across all request handlers.

use shamba_core::service::OrderService;
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// The order/payment service.
    pub service: Arc<OrderService>,
    /// Bearer token required by the administrative endpoints.
    pub admin_token: Arc<str>,
}

impl AppState {
    pub fn new(service: Arc<OrderService>, admin_token: &str) -> Self {
        Self {
            service,
            admin_token: Arc::from(admin_token),
        }
    }
}
