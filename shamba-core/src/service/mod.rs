//! Order lifecycle state machine.
//!
//! States: `Pending → PaymentInitiated → {Paid | PaymentFailed}`; the two
//! outcomes are terminal. Every transition after creation is a
//! compare-and-swap through the store, so a callback racing the initiating
//! request cannot silently overwrite it.

use crate::entities::{NewOrder, Order, OrderStatus};
use crate::events::{OrderStatusChanged, OrderStatusReceiver, OrderStatusSender, order_status_channel};
use crate::mpesa::callback::CallbackOutcome;
use crate::mpesa::{MpesaError, StkGateway};
use crate::store::{CasOutcome, OrderStore, OrderUpdate, StoreError};
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

/// Errors surfaced by the order service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A required request field is missing or empty.
    #[error("missing required field: {0}")]
    Validation(&'static str),

    /// No order with the given id.
    #[error("order not found: {0}")]
    NotFound(Uuid),

    /// The order is not in the state the operation requires.
    #[error("invalid order state: {0}")]
    InvalidState(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Mpesa(#[from] MpesaError),
}

/// Drives order creation, payment initiation, callback ingestion, and
/// status reads over an injected store and gateway.
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    gateway: Arc<dyn StkGateway>,
    status_tx: OrderStatusSender,
}

impl OrderService {
    pub fn new(store: Arc<dyn OrderStore>, gateway: Arc<dyn StkGateway>) -> Self {
        let (status_tx, _) = order_status_channel();
        Self {
            store,
            gateway,
            status_tx,
        }
    }

    /// Subscribe to committed status transitions.
    pub fn subscribe(&self) -> OrderStatusReceiver {
        self.status_tx.subscribe()
    }

    /// Validate the request, assign a fresh id, and store the order as
    /// `Pending`.
    ///
    /// The total is trusted from the client and never recomputed from the
    /// line items.
    pub async fn create_order(&self, new: NewOrder) -> Result<Uuid, ServiceError> {
        if new.items.is_empty() {
            return Err(ServiceError::Validation("items"));
        }
        if !new.customer.is_complete() {
            return Err(ServiceError::Validation("customerInfo"));
        }
        if new.total_amount <= Decimal::ZERO {
            return Err(ServiceError::Validation("totalAmount"));
        }

        let order = Order::create(new);
        let order_id = order.id;
        self.store.insert(order).await?;

        tracing::info!(order_id = %order_id, "Order created");
        Ok(order_id)
    }

    /// Push a payment prompt for the order and record the correlation id.
    ///
    /// The gateway is called before any state is touched; on gateway failure
    /// the order stays `Pending` with no correlation id. Nothing is retried.
    pub async fn initiate_payment(
        &self,
        order_id: Uuid,
        phone: &str,
    ) -> Result<String, ServiceError> {
        let order = self
            .store
            .get(order_id)
            .await
            .ok_or(ServiceError::NotFound(order_id))?;

        if order.status != OrderStatus::Pending {
            return Err(ServiceError::InvalidState(
                "payment has already been initiated for this order",
            ));
        }

        let checkout_request_id = self.gateway.initiate_push(&order, phone).await?;

        let update = OrderUpdate::PaymentInitiated {
            checkout_request_id: checkout_request_id.clone(),
        };
        match self.store.apply(order_id, OrderStatus::Pending, update).await {
            Some(CasOutcome::Applied(updated)) => {
                tracing::info!(
                    order_id = %order_id,
                    checkout_request_id = %checkout_request_id,
                    "Payment initiated"
                );
                self.notify(&updated);
                Ok(checkout_request_id)
            }
            Some(CasOutcome::Conflict(current)) => {
                tracing::warn!(
                    order_id = %order_id,
                    status = ?current.status,
                    "Order changed while the STK push was in flight"
                );
                Err(ServiceError::InvalidState(
                    "order changed while payment was being initiated",
                ))
            }
            None => Err(ServiceError::NotFound(order_id)),
        }
    }

    /// Ingest the gateway's asynchronous result callback.
    ///
    /// A payload whose nested envelope does not parse is a no-op. A duplicate
    /// delivery that finds the order already settled with the same outcome is
    /// an idempotent no-op; any other out-of-sequence callback is rejected.
    pub async fn handle_callback(
        &self,
        order_id: Uuid,
        payload: serde_json::Value,
    ) -> Result<(), ServiceError> {
        if self.store.get(order_id).await.is_none() {
            return Err(ServiceError::NotFound(order_id));
        }

        let update = match CallbackOutcome::from_payload(&payload) {
            CallbackOutcome::Completed { receipt } => OrderUpdate::Paid {
                receipt,
                paid_at: OffsetDateTime::now_utc(),
            },
            CallbackOutcome::Failed { reason } => OrderUpdate::Failed { reason },
            CallbackOutcome::Ignored => {
                tracing::warn!(order_id = %order_id, "Callback envelope not recognized, ignoring");
                return Ok(());
            }
        };
        let target = update.target_status();

        match self
            .store
            .apply(order_id, OrderStatus::PaymentInitiated, update)
            .await
        {
            Some(CasOutcome::Applied(updated)) => {
                tracing::info!(
                    order_id = %order_id,
                    status = ?updated.status,
                    "Callback processed"
                );
                self.notify(&updated);
                Ok(())
            }
            Some(CasOutcome::Conflict(current)) if current.status == target => {
                tracing::debug!(order_id = %order_id, "Duplicate callback, order already settled");
                Ok(())
            }
            Some(CasOutcome::Conflict(current)) => {
                tracing::warn!(
                    order_id = %order_id,
                    status = ?current.status,
                    "Callback for an order that is not awaiting payment"
                );
                Err(ServiceError::InvalidState(
                    "order is not awaiting a payment result",
                ))
            }
            None => Err(ServiceError::NotFound(order_id)),
        }
    }

    /// Pure read of a single order.
    pub async fn get_status(&self, order_id: Uuid) -> Result<Order, ServiceError> {
        self.store
            .get(order_id)
            .await
            .ok_or(ServiceError::NotFound(order_id))
    }

    /// All orders, oldest first.
    pub async fn list_orders(&self) -> Vec<Order> {
        self.store.list().await
    }

    fn notify(&self, order: &Order) {
        // No receivers is fine; status watchers come and go.
        let _ = self.status_tx.send(OrderStatusChanged {
            order_id: order.id,
            status: order.status,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{CustomerInfo, LineItem};
    use crate::store::MemoryOrderStore;
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::Mutex;

    struct MockGateway {
        response: Mutex<Result<String, ()>>,
        calls: Mutex<Vec<(Uuid, String)>>,
    }

    impl MockGateway {
        fn succeeding(checkout_request_id: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Mutex::new(Ok(checkout_request_id.to_owned())),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                response: Mutex::new(Err(())),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl StkGateway for MockGateway {
        async fn initiate_push(&self, order: &Order, phone: &str) -> Result<String, MpesaError> {
            self.calls.lock().await.push((order.id, phone.to_owned()));
            match &*self.response.lock().await {
                Ok(id) => Ok(id.clone()),
                Err(()) => Err(MpesaError::GatewayRejected {
                    status: 503,
                    body: "Service unavailable".into(),
                }),
            }
        }
    }

    fn service_with(gateway: Arc<MockGateway>) -> OrderService {
        OrderService::new(Arc::new(MemoryOrderStore::new()), gateway)
    }

    fn valid_new_order() -> NewOrder {
        NewOrder {
            items: vec![LineItem {
                product_id: "tomatoes-1kg".into(),
                name: "Tomatoes (1kg)".into(),
                unit_price: Decimal::from(433),
                quantity: 3,
            }],
            customer: CustomerInfo {
                name: "Jane Wanjiku".into(),
                email: "jane@example.com".into(),
                phone: "0712345678".into(),
                address: "Nakuru".into(),
            },
            total_amount: Decimal::from(1299),
        }
    }

    fn success_callback(receipt: &str) -> serde_json::Value {
        json!({
            "Body": {
                "stkCallback": {
                    "ResultCode": 0,
                    "ResultDesc": "The service request is processed successfully.",
                    "CallbackMetadata": {
                        "Item": [{ "Name": "MpesaReceiptNumber", "Value": receipt }]
                    }
                }
            }
        })
    }

    #[tokio::test]
    async fn created_order_is_pending_and_retrievable() {
        let service = service_with(MockGateway::succeeding("ws_CO_1"));

        let first = service.create_order(valid_new_order()).await.unwrap();
        let second = service.create_order(valid_new_order()).await.unwrap();
        assert_ne!(first, second);

        let order = service.get_status(first).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount, Decimal::from(1299));
        assert!(order.checkout_request_id.is_none());
    }

    #[tokio::test]
    async fn create_order_validates_all_three_fields() {
        let service = service_with(MockGateway::succeeding("ws_CO_1"));

        let no_items = NewOrder {
            items: vec![],
            ..valid_new_order()
        };
        assert!(matches!(
            service.create_order(no_items).await,
            Err(ServiceError::Validation("items"))
        ));

        let mut blank_customer = valid_new_order();
        blank_customer.customer.email = String::new();
        assert!(matches!(
            service.create_order(blank_customer).await,
            Err(ServiceError::Validation("customerInfo"))
        ));

        let zero_total = NewOrder {
            total_amount: Decimal::ZERO,
            ..valid_new_order()
        };
        assert!(matches!(
            service.create_order(zero_total).await,
            Err(ServiceError::Validation("totalAmount"))
        ));

        assert!(service.list_orders().await.is_empty());
    }

    #[tokio::test]
    async fn initiate_payment_unknown_order() {
        let service = service_with(MockGateway::succeeding("ws_CO_1"));
        let err = service
            .initiate_payment(Uuid::new_v4(), "0712345678")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(service.list_orders().await.is_empty());
    }

    #[tokio::test]
    async fn initiate_payment_records_correlation_id() {
        let gateway = MockGateway::succeeding("ws_CO_191220191020363925");
        let service = service_with(gateway.clone());
        let order_id = service.create_order(valid_new_order()).await.unwrap();

        let checkout_request_id = service
            .initiate_payment(order_id, "0712345678")
            .await
            .unwrap();
        assert_eq!(checkout_request_id, "ws_CO_191220191020363925");

        let order = service.get_status(order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::PaymentInitiated);
        assert_eq!(
            order.checkout_request_id.as_deref(),
            Some("ws_CO_191220191020363925")
        );
        assert_eq!(gateway.calls.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn gateway_failure_leaves_order_pending() {
        let service = service_with(MockGateway::failing());
        let order_id = service.create_order(valid_new_order()).await.unwrap();

        let err = service
            .initiate_payment(order_id, "0712345678")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Mpesa(_)));

        let order = service.get_status(order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.checkout_request_id.is_none());
    }

    #[tokio::test]
    async fn re_initiation_is_rejected() {
        let service = service_with(MockGateway::succeeding("ws_CO_1"));
        let order_id = service.create_order(valid_new_order()).await.unwrap();

        service.initiate_payment(order_id, "0712345678").await.unwrap();
        let err = service
            .initiate_payment(order_id, "0712345678")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn successful_callback_marks_paid_idempotently() {
        let service = service_with(MockGateway::succeeding("ws_CO_1"));
        let order_id = service.create_order(valid_new_order()).await.unwrap();
        service.initiate_payment(order_id, "0712345678").await.unwrap();

        service
            .handle_callback(order_id, success_callback("QWE123"))
            .await
            .unwrap();

        let order = service.get_status(order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.mpesa_receipt_number.as_deref(), Some("QWE123"));
        let paid_at = order.paid_at.unwrap();

        // Redelivery of the same payload is a no-op success.
        service
            .handle_callback(order_id, success_callback("QWE123"))
            .await
            .unwrap();
        let order = service.get_status(order_id).await.unwrap();
        assert_eq!(order.paid_at, Some(paid_at));
        assert_eq!(order.mpesa_receipt_number.as_deref(), Some("QWE123"));
    }

    #[tokio::test]
    async fn failure_callback_records_reason() {
        let service = service_with(MockGateway::succeeding("ws_CO_1"));
        let order_id = service.create_order(valid_new_order()).await.unwrap();
        service.initiate_payment(order_id, "0712345678").await.unwrap();

        let payload = json!({
            "Body": {
                "stkCallback": {
                    "ResultCode": 1032,
                    "ResultDesc": "Request cancelled by user"
                }
            }
        });
        service.handle_callback(order_id, payload).await.unwrap();

        let order = service.get_status(order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::PaymentFailed);
        assert_eq!(
            order.failure_reason.as_deref(),
            Some("Request cancelled by user")
        );
        assert!(order.paid_at.is_none());
    }

    #[tokio::test]
    async fn malformed_callback_is_a_no_op() {
        let service = service_with(MockGateway::succeeding("ws_CO_1"));
        let order_id = service.create_order(valid_new_order()).await.unwrap();
        service.initiate_payment(order_id, "0712345678").await.unwrap();

        service
            .handle_callback(order_id, json!({ "Body": {} }))
            .await
            .unwrap();

        let order = service.get_status(order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::PaymentInitiated);
    }

    #[tokio::test]
    async fn callback_before_initiation_is_rejected() {
        let service = service_with(MockGateway::succeeding("ws_CO_1"));
        let order_id = service.create_order(valid_new_order()).await.unwrap();

        let err = service
            .handle_callback(order_id, success_callback("QWE123"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let order = service.get_status(order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn callback_unknown_order() {
        let service = service_with(MockGateway::succeeding("ws_CO_1"));
        let err = service
            .handle_callback(Uuid::new_v4(), success_callback("QWE123"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn transitions_are_broadcast() {
        let service = service_with(MockGateway::succeeding("ws_CO_1"));
        let order_id = service.create_order(valid_new_order()).await.unwrap();
        let mut rx = service.subscribe();

        service.initiate_payment(order_id, "0712345678").await.unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.order_id, order_id);
        assert_eq!(event.status, OrderStatus::PaymentInitiated);

        service
            .handle_callback(order_id, success_callback("QWE123"))
            .await
            .unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.status, OrderStatus::Paid);
    }
}
