use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{Result, StoredRecord, Version, Versioned};

/// Core trait for record store implementations.
///
/// A record store persists JSON records under string keys. All implementations
/// must be thread-safe (Send + Sync) and must apply each operation atomically
/// with respect to a single key.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts a new record at [`Version::first`].
    ///
    /// Fails with `DuplicateKey` if a record already exists under `key`.
    async fn insert(&self, key: &str, payload: serde_json::Value) -> Result<StoredRecord>;

    /// Retrieves the record stored under `key`.
    ///
    /// Returns None if no record exists.
    async fn get(&self, key: &str) -> Result<Option<StoredRecord>>;

    /// Replaces the payload of `key` if its persisted version equals `expected`.
    ///
    /// Fails with `NotFound` if the record does not exist and with
    /// `ConcurrencyConflict` if another writer committed first. On success the
    /// returned record carries the next version.
    async fn compare_and_set(
        &self,
        key: &str,
        expected: Version,
        payload: serde_json::Value,
    ) -> Result<StoredRecord>;

    /// Deletes the record stored under `key`.
    ///
    /// Returns false if no record existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Returns every record in the store, ordered by key.
    async fn scan(&self) -> Result<Vec<StoredRecord>>;
}

/// Extension trait providing typed access on top of the JSON-level store.
#[async_trait]
pub trait RecordStoreExt: RecordStore {
    /// Serializes `value` and inserts it under `key`.
    async fn insert_as<T>(&self, key: &str, value: &T) -> Result<Versioned<T>>
    where
        T: Serialize + DeserializeOwned + Sync,
    {
        let record = self.insert(key, serde_json::to_value(value)?).await?;
        decode(record)
    }

    /// Loads and deserializes the record under `key`.
    async fn get_as<T>(&self, key: &str) -> Result<Option<Versioned<T>>>
    where
        T: DeserializeOwned,
    {
        match self.get(key).await? {
            Some(record) => Ok(Some(decode(record)?)),
            None => Ok(None),
        }
    }

    /// Serializes `value` and commits it under `key` if the record is still at
    /// `expected`.
    async fn compare_and_set_as<T>(
        &self,
        key: &str,
        expected: Version,
        value: &T,
    ) -> Result<Versioned<T>>
    where
        T: Serialize + DeserializeOwned + Sync,
    {
        let record = self
            .compare_and_set(key, expected, serde_json::to_value(value)?)
            .await?;
        decode(record)
    }

    /// Loads and deserializes every record in the store.
    async fn scan_as<T>(&self) -> Result<Vec<Versioned<T>>>
    where
        T: DeserializeOwned,
    {
        self.scan().await?.into_iter().map(decode).collect()
    }
}

// Blanket implementation for all RecordStore implementations
impl<T: RecordStore + ?Sized> RecordStoreExt for T {}

fn decode<T: DeserializeOwned>(record: StoredRecord) -> Result<Versioned<T>> {
    Ok(Versioned {
        value: serde_json::from_value(record.payload)?,
        version: record.version,
    })
}
