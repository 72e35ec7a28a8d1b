//! Domain layer for the warehouse services.
//!
//! This crate provides the two record-owning components:
//! - [`StockLedger`]: authoritative quantity-on-hand per SKU, with race-free
//!   conditional decrement and increment
//! - [`OrderStore`]: order records, their line items and status
//!
//! plus read-only [`ReportService`] aggregations over both. Each component
//! receives its [`record_store::RecordStore`] at construction time.

pub mod error;
pub mod order;
pub mod report;
pub mod retry;
pub mod stock;

pub use error::{DomainError, Result};
pub use order::{NewOrder, Order, OrderLineItem, OrderSortField, OrderStatus, OrderStore, OrderUpdate};
pub use report::{DEFAULT_LOW_STOCK_THRESHOLD, InventoryReport, MonthlySales, ReportService};
pub use retry::RetryPolicy;
pub use stock::{NewStockItem, Sku, StockItem, StockItemUpdate, StockLedger, StockSortField};
