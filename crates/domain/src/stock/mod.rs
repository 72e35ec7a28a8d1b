//! Stock ledger: the single owner of quantity-on-hand for every SKU.

mod item;
mod ledger;
mod sku;

pub use item::{NewStockItem, StockItem, StockItemUpdate, StockSortField};
pub use ledger::StockLedger;
pub use sku::Sku;
