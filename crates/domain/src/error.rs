//! Domain error types.

use common::RecordId;
use record_store::StoreError;
use thiserror::Error;

/// Errors that can occur during stock ledger and order store operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No stock item exists for the SKU.
    #[error("Inventory item with SKU {0} not found")]
    ItemNotFound(String),

    /// No order exists with the ID.
    #[error("Order with ID {0} not found")]
    OrderNotFound(RecordId),

    /// A stock item with the same SKU (ignoring case) already exists.
    #[error("Inventory item with SKU {0} already exists")]
    SkuAlreadyExists(String),

    /// The requested amount exceeds the quantity on hand.
    #[error("Insufficient stock for item with SKU {sku}: requested {requested}, available {available}")]
    InsufficientStock {
        sku: String,
        requested: u32,
        available: u32,
    },

    /// The request is malformed (blank fields, zero amounts, unknown sort field).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Every retry lost the compare-and-set race against other writers.
    #[error("Contention on {key}: gave up after {attempts} attempts")]
    Contention { key: String, attempts: u32 },

    /// The underlying record store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl DomainError {
    /// Creates an invalid request error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Stable machine-readable code for callers.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::ItemNotFound(_) => "ITEM_NOT_FOUND",
            DomainError::OrderNotFound(_) => "ORDER_NOT_FOUND",
            DomainError::SkuAlreadyExists(_) => "SKU_ALREADY_EXISTS",
            DomainError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            DomainError::InvalidRequest(_) => "INVALID_REQUEST",
            DomainError::Contention { .. } => "CONTENTION",
            DomainError::Store(_) => "PERSISTENCE_FAILURE",
        }
    }
}

/// Convenience type alias for domain results.
pub type Result<T> = std::result::Result<T, DomainError>;
