use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version number of a stored record, used for optimistic concurrency control.
///
/// A freshly inserted record is at version 1; each successful
/// compare-and-set moves it to the next version.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the version (0) reported for a record that does not exist.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the version (1) assigned on insert.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// A record as persisted by the store: an opaque JSON payload plus the
/// bookkeeping needed for conditional updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Key the record is stored under. Unique within a store.
    pub key: String,

    /// Current version of the record.
    pub version: Version,

    /// The record body as JSON.
    pub payload: serde_json::Value,

    /// When the record was first inserted.
    pub created_at: DateTime<Utc>,

    /// When the record was last written.
    pub updated_at: DateTime<Utc>,
}

impl StoredRecord {
    /// Creates a version-1 record stamped with the current time.
    pub fn new(key: impl Into<String>, payload: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            key: key.into(),
            version: Version::first(),
            payload,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the record with a new payload at the next version.
    pub fn updated(&self, payload: serde_json::Value) -> Self {
        Self {
            key: self.key.clone(),
            version: self.version.next(),
            payload,
            created_at: self.created_at,
            updated_at: Utc::now(),
        }
    }
}

/// A typed record together with the version it was read at.
///
/// Hand the version back to [`crate::RecordStoreExt::compare_and_set_as`] to
/// commit an update conditioned on nobody else having written in between.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: Version,
}
