//! Fulfillment error types.

use domain::DomainError;
use thiserror::Error;

/// Why a fulfillment did not commit.
///
/// Every variant except `CompensationFailed` guarantees that no stock was
/// taken and no order was recorded.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// The request is malformed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A requested SKU has no stock item.
    #[error("Inventory item with SKU {0} not found")]
    ItemNotFound(String),

    /// A requested quantity exceeds what is on hand.
    #[error("Insufficient stock for item with SKU {sku}: requested {requested}, available {available}")]
    InsufficientStock {
        sku: String,
        requested: u32,
        available: u32,
    },

    /// Concurrent writers kept winning the race for a SKU.
    #[error("Contention on SKU {sku}: gave up after {attempts} attempts")]
    Contention { sku: String, attempts: u32 },

    /// The stock store failed while taking stock for a SKU.
    #[error("Persistence failure for SKU {sku}: {reason}")]
    PersistenceFailure { sku: String, reason: String },

    /// Stock was taken but the order could not be recorded; the stock was restored.
    #[error("Order {order_number} could not be persisted: {reason}")]
    OrderPersistenceFailed {
        order_number: String,
        reason: String,
    },

    /// Restoring stock after a failure did not fully succeed. The listed SKUs
    /// are over-decremented and need manual reconciliation.
    #[error("Compensation for order {order_number} failed for SKUs {unrestored:?} after: {cause}")]
    CompensationFailed {
        order_number: String,
        unrestored: Vec<String>,
        cause: Box<FulfillmentError>,
    },

    /// An invariant of the coordinator was broken.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FulfillmentError {
    /// Stable machine-readable code for callers.
    pub fn code(&self) -> &'static str {
        match self {
            FulfillmentError::InvalidRequest(_) => "INVALID_REQUEST",
            FulfillmentError::ItemNotFound(_) => "ITEM_NOT_FOUND",
            FulfillmentError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            FulfillmentError::Contention { .. } => "CONTENTION",
            FulfillmentError::PersistenceFailure { .. } => "PERSISTENCE_FAILURE",
            FulfillmentError::OrderPersistenceFailed { .. } => "ORDER_PERSISTENCE_FAILED",
            FulfillmentError::CompensationFailed { .. } => "COMPENSATION_FAILED",
            FulfillmentError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Maps a ledger failure for `sku` into the fulfillment taxonomy.
    pub(crate) fn from_ledger(sku: &str, err: DomainError) -> Self {
        match err {
            DomainError::ItemNotFound(sku) => FulfillmentError::ItemNotFound(sku),
            DomainError::InsufficientStock {
                sku,
                requested,
                available,
            } => FulfillmentError::InsufficientStock {
                sku,
                requested,
                available,
            },
            DomainError::InvalidRequest(msg) => FulfillmentError::InvalidRequest(msg),
            DomainError::Contention { attempts, .. } => FulfillmentError::Contention {
                sku: sku.to_string(),
                attempts,
            },
            other => FulfillmentError::PersistenceFailure {
                sku: sku.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

/// Convenience type alias for fulfillment results.
pub type Result<T> = std::result::Result<T, FulfillmentError>;
