//! Shared application state.

use domain::{OrderStore, ReportService, StockLedger};
use fulfillment::FulfillmentCoordinator;
use record_store::RecordStore;

/// Components shared by all handlers. Stock items and orders live in two
/// separate stores of the same kind.
pub struct AppState<S: RecordStore> {
    pub ledger: StockLedger<S>,
    pub orders: OrderStore<S>,
    pub coordinator: FulfillmentCoordinator<S, S>,
    pub reports: ReportService<S, S>,
}
