//! Order persistence seam.
//!
//! The service talks to an [`OrderStore`] trait so the in-memory map can be
//! swapped for a real database without touching the state machine. All
//! mutations after creation go through [`OrderStore::apply`], a
//! compare-and-swap on the order's current status, which closes the race
//! between a payment initiation finishing and the gateway callback landing.

mod memory;

pub use memory::MemoryOrderStore;

use crate::entities::{Order, OrderStatus};
use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

/// Errors raised by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An order with the same id already exists.
    #[error("duplicate order id: {0}")]
    DuplicateId(Uuid),
}

/// A typed mutation applied to an order via compare-and-swap.
#[derive(Debug, Clone)]
pub enum OrderUpdate {
    /// Record the gateway correlation id and move to `PaymentInitiated`.
    PaymentInitiated { checkout_request_id: String },
    /// Record the receipt and completion time and move to `Paid`.
    Paid {
        receipt: Option<String>,
        paid_at: OffsetDateTime,
    },
    /// Record the provider's failure description and move to `PaymentFailed`.
    Failed { reason: String },
}

impl OrderUpdate {
    /// The status an order ends up in once this update is applied.
    pub fn target_status(&self) -> OrderStatus {
        match self {
            OrderUpdate::PaymentInitiated { .. } => OrderStatus::PaymentInitiated,
            OrderUpdate::Paid { .. } => OrderStatus::Paid,
            OrderUpdate::Failed { .. } => OrderStatus::PaymentFailed,
        }
    }
}

/// Result of a compare-and-swap attempt.
#[derive(Debug, Clone)]
pub enum CasOutcome {
    /// The order matched the expected status and the update was applied.
    Applied(Order),
    /// The order was in a different status; returned unmodified.
    Conflict(Order),
}

/// Keyed order storage.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a freshly created order.
    async fn insert(&self, order: Order) -> Result<(), StoreError>;

    /// Fetch an order by id.
    async fn get(&self, id: Uuid) -> Option<Order>;

    /// Apply `update` iff the order is currently in `expected` status.
    ///
    /// Returns `None` if the id is unknown.
    async fn apply(
        &self,
        id: Uuid,
        expected: OrderStatus,
        update: OrderUpdate,
    ) -> Option<CasOutcome>;

    /// All orders, oldest first.
    async fn list(&self) -> Vec<Order>;
}
