use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{RecordStore, Result, StoreError, StoredRecord, Version};

/// Failure switches for exercising error paths in tests.
#[derive(Debug, Default)]
struct FaultState {
    fail_on_insert: AtomicBool,
    fail_on_update: AtomicBool,
    pending_conflicts: AtomicU32,
    latency_micros: AtomicU64,
}

/// In-memory record store implementation.
///
/// Provides the same interface and per-key atomicity as the PostgreSQL
/// implementation. Clones share the same underlying records, so one handle can
/// be given to a component while the test keeps another to inject faults.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    records: Arc<RwLock<BTreeMap<String, StoredRecord>>>,
    faults: Arc<FaultState>,
}

impl InMemoryRecordStore {
    /// Creates a new empty in-memory record store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records stored.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true if the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Makes every insert fail with `Unavailable` while set.
    pub fn set_fail_on_insert(&self, fail: bool) {
        self.faults.fail_on_insert.store(fail, Ordering::SeqCst);
    }

    /// Makes every compare-and-set fail with `Unavailable` while set.
    pub fn set_fail_on_update(&self, fail: bool) {
        self.faults.fail_on_update.store(fail, Ordering::SeqCst);
    }

    /// Makes the next `count` compare-and-set calls report a concurrency
    /// conflict without writing, as if another writer had won each race.
    pub fn inject_conflicts(&self, count: u32) {
        self.faults.pending_conflicts.store(count, Ordering::SeqCst);
    }

    /// Delays every operation by `latency` before it touches the records.
    pub fn set_latency(&self, latency: Duration) {
        self.faults
            .latency_micros
            .store(latency.as_micros() as u64, Ordering::SeqCst);
    }

    async fn simulate_latency(&self) {
        let micros = self.faults.latency_micros.load(Ordering::SeqCst);
        if micros > 0 {
            tokio::time::sleep(Duration::from_micros(micros)).await;
        }
    }

    fn take_injected_conflict(&self) -> bool {
        self.faults
            .pending_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert(&self, key: &str, payload: serde_json::Value) -> Result<StoredRecord> {
        self.simulate_latency().await;
        if self.faults.fail_on_insert.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("insert of {key} rejected")));
        }

        let mut records = self.records.write().await;
        if records.contains_key(key) {
            return Err(StoreError::DuplicateKey(key.to_string()));
        }

        let record = StoredRecord::new(key, payload);
        records.insert(key.to_string(), record.clone());
        Ok(record)
    }

    async fn get(&self, key: &str) -> Result<Option<StoredRecord>> {
        self.simulate_latency().await;
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: Version,
        payload: serde_json::Value,
    ) -> Result<StoredRecord> {
        self.simulate_latency().await;
        if self.faults.fail_on_update.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("update of {key} rejected")));
        }

        let mut records = self.records.write().await;
        let current = records
            .get(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        if self.take_injected_conflict() {
            return Err(StoreError::ConcurrencyConflict {
                key: key.to_string(),
                expected,
                actual: current.version.next(),
            });
        }

        if current.version != expected {
            return Err(StoreError::ConcurrencyConflict {
                key: key.to_string(),
                expected,
                actual: current.version,
            });
        }

        let updated = current.updated(payload);
        records.insert(key.to_string(), updated.clone());
        Ok(updated)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.simulate_latency().await;
        Ok(self.records.write().await.remove(key).is_some())
    }

    async fn scan(&self) -> Result<Vec<StoredRecord>> {
        self.simulate_latency().await;
        Ok(self.records.read().await.values().cloned().collect())
    }
}
