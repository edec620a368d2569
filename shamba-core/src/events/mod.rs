//! Order status change notifications.
//!
//! Successful state transitions are broadcast so the HTTP layer can answer
//! long-poll status requests without the client re-fetching on a fixed
//! interval.

use crate::entities::OrderStatus;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Buffer size for the status broadcast channel.
///
/// Enough to absorb bursts; a lagged receiver re-reads the store.
pub const STATUS_CHANNEL_BUFFER: usize = 256;

/// Emitted after an order transition is committed to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderStatusChanged {
    pub order_id: Uuid,
    pub status: OrderStatus,
}

/// Sender handle for OrderStatusChanged events.
pub type OrderStatusSender = broadcast::Sender<OrderStatusChanged>;
/// Receiver handle for OrderStatusChanged events.
pub type OrderStatusReceiver = broadcast::Receiver<OrderStatusChanged>;

/// Create a new OrderStatusChanged channel.
///
/// The sender can be cloned freely; each status watcher subscribes for its
/// own receiver.
pub fn order_status_channel() -> (OrderStatusSender, OrderStatusReceiver) {
    broadcast::channel(STATUS_CHANNEL_BUFFER)
}
