//! Order records and the store that owns them.

mod model;
mod store;

pub use model::{NewOrder, Order, OrderLineItem, OrderSortField, OrderStatus, OrderUpdate};
pub use store::OrderStore;
