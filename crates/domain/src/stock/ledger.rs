//! Stock ledger over a versioned record store.

use common::{ListQuery, Page};
use record_store::{RecordStore, RecordStoreExt, StoreError};

use super::{NewStockItem, Sku, StockItem, StockItemUpdate, StockSortField};
use crate::error::{DomainError, Result};
use crate::retry::{RetryPolicy, update_with_retry};

/// Authoritative quantity-on-hand for every SKU.
///
/// Records are keyed by the lowercased SKU, which makes uniqueness and lookup
/// case-insensitive. Every quantity change is a compare-and-set against the
/// version that was read, retried under the ledger's [`RetryPolicy`] when a
/// concurrent writer got there first, so concurrent decrements can never
/// jointly take more than what is on hand.
#[derive(Clone)]
pub struct StockLedger<S: RecordStore> {
    store: S,
    retry: RetryPolicy,
}

impl<S: RecordStore> StockLedger<S> {
    /// Creates a ledger over `store` with the default retry policy.
    pub fn new(store: S) -> Self {
        Self::with_retry_policy(store, RetryPolicy::default())
    }

    /// Creates a ledger over `store` with an explicit retry policy.
    pub fn with_retry_policy(store: S, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Creates a stock item. Fails if the SKU exists, ignoring case.
    #[tracing::instrument(skip(self, item), fields(sku = %item.sku))]
    pub async fn create_item(&self, item: NewStockItem) -> Result<StockItem> {
        let item = item.into_item()?;
        let key = item.sku.key();

        match self.store.insert_as(&key, &item).await {
            Ok(created) => {
                tracing::info!(sku = %created.value.sku, quantity = created.value.quantity, "stock item created");
                Ok(created.value)
            }
            Err(StoreError::DuplicateKey(_)) => Err(DomainError::SkuAlreadyExists(item.sku.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Loads a stock item by SKU, ignoring case.
    #[tracing::instrument(skip(self))]
    pub async fn get_by_sku(&self, sku: &str) -> Result<StockItem> {
        let sku = Sku::parse(sku)?;
        self.store
            .get_as::<StockItem>(&sku.key())
            .await?
            .map(|v| v.value)
            .ok_or_else(|| DomainError::ItemNotFound(sku.to_string()))
    }

    /// Returns true if no stock item uses this SKU, ignoring case.
    #[tracing::instrument(skip(self))]
    pub async fn check_sku_unique(&self, sku: &str) -> Result<bool> {
        let sku = Sku::parse(sku)?;
        Ok(self.store.get(&sku.key()).await?.is_none())
    }

    /// Takes `amount` units off the SKU's quantity if at least that many are
    /// on hand; otherwise fails with `InsufficientStock` and writes nothing.
    ///
    /// The check runs against the freshly read record on every attempt and the
    /// write is conditioned on that record's version, so a concurrent decrement
    /// that commits in between forces a re-read rather than an oversell.
    /// Returns the item as committed.
    #[tracing::instrument(skip(self))]
    pub async fn try_decrement(&self, sku: &str, amount: u32) -> Result<StockItem> {
        let sku = Sku::parse(sku)?;
        if amount == 0 {
            return Err(DomainError::invalid("decrement amount must be greater than 0"));
        }

        let item = self
            .modify(&sku, &self.retry, |current| {
                if current.quantity < amount {
                    return Err(DomainError::InsufficientStock {
                        sku: current.sku.to_string(),
                        requested: amount,
                        available: current.quantity,
                    });
                }
                let mut next = current.clone();
                next.quantity = current.quantity - amount;
                next.updated_at = chrono::Utc::now();
                Ok(next)
            })
            .await?;

        tracing::debug!(sku = %item.sku, amount, remaining = item.quantity, "stock decremented");
        Ok(item)
    }

    /// Adds `amount` units to the SKU's quantity. Used for restocking.
    #[tracing::instrument(skip(self))]
    pub async fn increment(&self, sku: &str, amount: u32) -> Result<StockItem> {
        let item = self.add(sku, amount, &self.retry).await?;
        tracing::debug!(sku = %item.sku, amount, quantity = item.quantity, "stock incremented");
        Ok(item)
    }

    /// Puts back `amount` units taken by a fulfillment that is being undone.
    ///
    /// Unlike [`increment`](Self::increment), lost races never exhaust the
    /// retry budget: the write is retried with backoff until it lands. Only a
    /// missing item or a store failure ends it early.
    #[tracing::instrument(skip(self))]
    pub async fn restore(&self, sku: &str, amount: u32) -> Result<StockItem> {
        let policy = self.retry.without_attempt_limit();
        let item = self.add(sku, amount, &policy).await?;
        tracing::debug!(sku = %item.sku, amount, quantity = item.quantity, "stock restored");
        Ok(item)
    }

    async fn add(&self, sku: &str, amount: u32, policy: &RetryPolicy) -> Result<StockItem> {
        let sku = Sku::parse(sku)?;
        if amount == 0 {
            return Err(DomainError::invalid("increment amount must be greater than 0"));
        }

        self.modify(&sku, policy, |current| {
            let quantity = current.quantity.checked_add(amount).ok_or_else(|| {
                DomainError::invalid(format!(
                    "increment of {amount} would overflow quantity of {}",
                    current.sku
                ))
            })?;
            let mut next = current.clone();
            next.quantity = quantity;
            next.updated_at = chrono::Utc::now();
            Ok(next)
        })
        .await
    }

    /// Edits name, location and/or quantity. The SKU cannot change.
    #[tracing::instrument(skip(self))]
    pub async fn update_fields(&self, sku: &str, update: StockItemUpdate) -> Result<StockItem> {
        let sku = Sku::parse(sku)?;
        update.validate()?;
        if update.is_empty() {
            return self.get_by_sku(sku.as_str()).await;
        }

        let item = self.modify(&sku, &self.retry, |current| Ok(update.apply(current))).await?;
        tracing::info!(sku = %item.sku, "stock item updated");
        Ok(item)
    }

    /// Removes a stock item. Orders that reference it keep their copy of the SKU.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, sku: &str) -> Result<()> {
        let sku = Sku::parse(sku)?;
        if !self.store.delete(&sku.key()).await? {
            return Err(DomainError::ItemNotFound(sku.to_string()));
        }
        tracing::info!(%sku, "stock item deleted");
        Ok(())
    }

    /// Lists stock items filtered by a case-insensitive substring match on
    /// name, SKU or location, sorted and paginated.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, query: &ListQuery) -> Result<Page<StockItem>> {
        let field = StockSortField::parse(query.sort_by.as_deref())?;
        let needle = query.needle();

        let mut items: Vec<StockItem> = self
            .all_items()
            .await?
            .into_iter()
            .filter(|item| needle.as_deref().is_none_or(|n| item.matches(n)))
            .collect();
        items.sort_by(|a, b| query.direction.apply(field.compare(a, b)));

        Ok(query.paginate(items))
    }

    /// Returns every stock item, ordered by SKU key.
    pub async fn all_items(&self) -> Result<Vec<StockItem>> {
        Ok(self
            .store
            .scan_as::<StockItem>()
            .await?
            .into_iter()
            .map(|v| v.value)
            .collect())
    }

    async fn modify<F>(&self, sku: &Sku, policy: &RetryPolicy, op: F) -> Result<StockItem>
    where
        F: FnMut(&StockItem) -> Result<StockItem> + Send,
    {
        update_with_retry(
            &self.store,
            &sku.key(),
            policy,
            "stock",
            || DomainError::ItemNotFound(sku.to_string()),
            op,
        )
        .await
    }
}
