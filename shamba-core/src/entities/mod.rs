pub mod order;

pub use order::{CustomerInfo, LineItem, NewOrder, Order, OrderStatus};
