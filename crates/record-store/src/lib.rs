//! Durable keyed record store with per-key compare-and-set.
//!
//! Every record carries a [`Version`] that starts at 1 and increases by one on
//! each successful conditional update. Writers read a record, compute the new
//! payload, and commit it with [`RecordStore::compare_and_set`]; a concurrent
//! writer that committed first causes a [`StoreError::ConcurrencyConflict`]
//! instead of a lost update.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryRecordStore;
pub use postgres::PostgresRecordStore;
pub use record::{StoredRecord, Version, Versioned};
pub use store::{RecordStore, RecordStoreExt};
