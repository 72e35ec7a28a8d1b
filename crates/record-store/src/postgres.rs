use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{RecordStore, Result, StoreError, StoredRecord, Version};

/// PostgreSQL-backed record store implementation.
///
/// All stores share the `records` table; each instance is bound to one
/// collection and only ever sees rows of that collection.
#[derive(Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
    collection: String,
}

impl PostgresRecordStore {
    /// Creates a store over `collection` using the given connection pool.
    pub fn new(pool: PgPool, collection: impl Into<String>) -> Self {
        Self {
            pool,
            collection: collection.into(),
        }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_record(row: PgRow) -> Result<StoredRecord> {
        Ok(StoredRecord {
            key: row.try_get("key")?,
            version: Version::new(row.try_get("version")?),
            payload: row.try_get("payload")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn insert(&self, key: &str, payload: serde_json::Value) -> Result<StoredRecord> {
        let now = Utc::now();

        let row = sqlx::query(
            r#"
            INSERT INTO records (collection, key, version, payload, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING key, version, payload, created_at, updated_at
            "#,
        )
        .bind(&self.collection)
        .bind(key)
        .bind(Version::first().as_i64())
        .bind(&payload)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("records_pkey")
            {
                return StoreError::DuplicateKey(key.to_string());
            }
            StoreError::Database(e)
        })?;

        Self::row_to_record(row)
    }

    async fn get(&self, key: &str) -> Result<Option<StoredRecord>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT key, version, payload, created_at, updated_at
            FROM records
            WHERE collection = $1 AND key = $2
            "#,
        )
        .bind(&self.collection)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: Version,
        payload: serde_json::Value,
    ) -> Result<StoredRecord> {
        // Single conditional statement: the row lock taken by UPDATE makes the
        // version check and the write one atomic step.
        let row: Option<PgRow> = sqlx::query(
            r#"
            UPDATE records
            SET payload = $4, version = version + 1, updated_at = $5
            WHERE collection = $1 AND key = $2 AND version = $3
            RETURNING key, version, payload, created_at, updated_at
            "#,
        )
        .bind(&self.collection)
        .bind(key)
        .bind(expected.as_i64())
        .bind(&payload)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Self::row_to_record(row);
        }

        let actual: Option<i64> =
            sqlx::query_scalar("SELECT version FROM records WHERE collection = $1 AND key = $2")
                .bind(&self.collection)
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        match actual {
            Some(actual) => Err(StoreError::ConcurrencyConflict {
                key: key.to_string(),
                expected,
                actual: Version::new(actual),
            }),
            None => Err(StoreError::NotFound(key.to_string())),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM records WHERE collection = $1 AND key = $2")
            .bind(&self.collection)
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn scan(&self) -> Result<Vec<StoredRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT key, version, payload, created_at, updated_at
            FROM records
            WHERE collection = $1
            ORDER BY key ASC
            "#,
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_record).collect()
    }
}
