use super::{CasOutcome, OrderStore, OrderUpdate, StoreError};
use crate::entities::{Order, OrderStatus};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-lifetime order storage over a keyed map.
///
/// Orders are never deleted. The compare-and-swap in [`OrderStore::apply`]
/// runs under the write lock, so concurrent transitions on the same order
/// cannot overwrite each other silently.
#[derive(Default)]
pub struct MemoryOrderStore {
    orders: RwLock<HashMap<Uuid, Order>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, order: Order) -> Result<(), StoreError> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(StoreError::DuplicateId(order.id));
        }
        orders.insert(order.id, order);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Option<Order> {
        self.orders.read().await.get(&id).cloned()
    }

    async fn apply(
        &self,
        id: Uuid,
        expected: OrderStatus,
        update: OrderUpdate,
    ) -> Option<CasOutcome> {
        let mut orders = self.orders.write().await;
        let order = orders.get_mut(&id)?;

        if order.status != expected {
            return Some(CasOutcome::Conflict(order.clone()));
        }

        order.status = update.target_status();
        match update {
            OrderUpdate::PaymentInitiated {
                checkout_request_id,
            } => {
                order.checkout_request_id = Some(checkout_request_id);
            }
            OrderUpdate::Paid { receipt, paid_at } => {
                order.mpesa_receipt_number = receipt;
                order.paid_at = Some(paid_at);
            }
            OrderUpdate::Failed { reason } => {
                order.failure_reason = Some(reason);
            }
        }

        Some(CasOutcome::Applied(order.clone()))
    }

    async fn list(&self) -> Vec<Order> {
        let orders = self.orders.read().await;
        let mut all: Vec<Order> = orders.values().cloned().collect();
        all.sort_by_key(|o| o.created_at);
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{CustomerInfo, NewOrder};
    use rust_decimal::Decimal;
    use time::OffsetDateTime;

    fn sample_order() -> Order {
        Order::create(NewOrder {
            items: vec![],
            customer: CustomerInfo {
                name: "Jane Wanjiku".into(),
                email: "jane@example.com".into(),
                phone: "0712345678".into(),
                address: "Nakuru".into(),
            },
            total_amount: Decimal::from(1299),
        })
    }

    #[tokio::test]
    async fn insert_then_get() {
        let store = MemoryOrderStore::new();
        let order = sample_order();
        let id = order.id;

        store.insert(order.clone()).await.unwrap();
        assert_eq!(store.get(id).await, Some(order));
        assert!(store.get(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn duplicate_insert_rejected() {
        let store = MemoryOrderStore::new();
        let order = sample_order();

        store.insert(order.clone()).await.unwrap();
        assert!(matches!(
            store.insert(order).await,
            Err(StoreError::DuplicateId(_))
        ));
    }

    #[tokio::test]
    async fn cas_applies_on_expected_status() {
        let store = MemoryOrderStore::new();
        let order = sample_order();
        let id = order.id;
        store.insert(order).await.unwrap();

        let outcome = store
            .apply(
                id,
                OrderStatus::Pending,
                OrderUpdate::PaymentInitiated {
                    checkout_request_id: "ws_CO_191220191020363925".into(),
                },
            )
            .await
            .unwrap();

        let CasOutcome::Applied(updated) = outcome else {
            panic!("expected Applied");
        };
        assert_eq!(updated.status, OrderStatus::PaymentInitiated);
        assert_eq!(
            updated.checkout_request_id.as_deref(),
            Some("ws_CO_191220191020363925")
        );
    }

    #[tokio::test]
    async fn cas_conflict_leaves_order_unchanged() {
        let store = MemoryOrderStore::new();
        let order = sample_order();
        let id = order.id;
        store.insert(order).await.unwrap();

        let outcome = store
            .apply(
                id,
                OrderStatus::PaymentInitiated,
                OrderUpdate::Paid {
                    receipt: Some("QWE123".into()),
                    paid_at: OffsetDateTime::now_utc(),
                },
            )
            .await
            .unwrap();

        assert!(matches!(outcome, CasOutcome::Conflict(_)));
        let current = store.get(id).await.unwrap();
        assert_eq!(current.status, OrderStatus::Pending);
        assert!(current.mpesa_receipt_number.is_none());
        assert!(current.paid_at.is_none());
    }

    #[tokio::test]
    async fn cas_unknown_id_is_none() {
        let store = MemoryOrderStore::new();
        let outcome = store
            .apply(
                Uuid::new_v4(),
                OrderStatus::Pending,
                OrderUpdate::Failed {
                    reason: "whatever".into(),
                },
            )
            .await;
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn list_returns_oldest_first() {
        let store = MemoryOrderStore::new();
        let mut first = sample_order();
        first.created_at -= time::Duration::seconds(10);
        let second = sample_order();

        store.insert(second.clone()).await.unwrap();
        store.insert(first.clone()).await.unwrap();

        let all = store.list().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, first.id);
        assert_eq!(all[1].id, second.id);
    }
}
