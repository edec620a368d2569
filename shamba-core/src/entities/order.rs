use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A single line of a customer's cart, copied verbatim from the request.
///
/// Line items are not validated against a product catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

/// Free-form customer contact details, provided by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl CustomerInfo {
    /// All four fields must be non-blank.
    pub fn is_complete(&self) -> bool {
        [&self.name, &self.email, &self.phone, &self.address]
            .iter()
            .all(|f| !f.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    PaymentInitiated,
    Paid,
    PaymentFailed,
}

impl OrderStatus {
    /// `Paid` and `PaymentFailed` are final; no transition leaves them.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::PaymentFailed)
    }
}

/// The fields a client supplies when creating an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub items: Vec<LineItem>,
    pub customer: CustomerInfo,
    pub total_amount: Decimal,
}

/// An order record as held by the store.
///
/// `total_amount` is trusted from the client request and never recomputed
/// from the line items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: Uuid,
    pub items: Vec<LineItem>,
    pub customer: CustomerInfo,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub checkout_request_id: Option<String>,
    pub mpesa_receipt_number: Option<String>,
    pub paid_at: Option<OffsetDateTime>,
    pub failure_reason: Option<String>,
    pub created_at: OffsetDateTime,
}

impl Order {
    /// Build a fresh `Pending` order with a newly assigned id.
    pub fn create(new: NewOrder) -> Self {
        Self {
            id: Uuid::new_v4(),
            items: new.items,
            customer: new.customer,
            total_amount: new.total_amount,
            status: OrderStatus::Pending,
            checkout_request_id: None,
            mpesa_receipt_number: None,
            paid_at: None,
            failure_reason: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}
