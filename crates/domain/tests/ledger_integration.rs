//! Integration tests for the stock ledger.
//!
//! These tests hammer one SKU from many tasks at once and check that the
//! conditional decrement never oversells.

use std::sync::Arc;

use domain::{DomainError, NewStockItem, RetryPolicy, StockLedger};
use futures_util::future::join_all;
use record_store::InMemoryRecordStore;

fn create_ledger() -> StockLedger<InMemoryRecordStore> {
    // Enough attempts that losing races never turns into contention here.
    StockLedger::with_retry_policy(InMemoryRecordStore::new(), RetryPolicy::immediate(1_000))
}

mod concurrency {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_decrements_never_oversell() {
        let ledger = Arc::new(create_ledger());
        ledger
            .create_item(NewStockItem::new("Widget", "SKU001", "A1", 50))
            .await
            .unwrap();

        let tasks = (0..80).map(|_| {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move { ledger.try_decrement("SKU001", 1).await })
        });
        let results: Vec<_> = join_all(tasks)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();

        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        let insufficient = results
            .iter()
            .filter(|r| matches!(r, Err(DomainError::InsufficientStock { .. })))
            .count();

        assert_eq!(succeeded, 50);
        assert_eq!(insufficient, 30);
        assert_eq!(ledger.get_by_sku("SKU001").await.unwrap().quantity, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn two_requests_for_three_of_five() {
        let ledger = Arc::new(create_ledger());
        ledger
            .create_item(NewStockItem::new("Widget", "SKU001", "A1", 5))
            .await
            .unwrap();

        let first = {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move { ledger.try_decrement("SKU001", 3).await })
        };
        let second = {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move { ledger.try_decrement("SKU001", 3).await })
        };
        let results = [first.await.unwrap(), second.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results.iter().any(|r| matches!(
            r,
            Err(DomainError::InsufficientStock { sku, requested: 3, available: 2 }) if sku == "SKU001"
        )));
        assert_eq!(ledger.get_by_sku("SKU001").await.unwrap().quantity, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn mixed_increments_and_decrements_conserve_quantity() {
        let ledger = Arc::new(create_ledger());
        ledger
            .create_item(NewStockItem::new("Widget", "SKU001", "A1", 100))
            .await
            .unwrap();

        let decrements = (0..40).map(|_| {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move { ledger.try_decrement("sku001", 2).await.map(|_| ()) })
        });
        let increments = (0..20).map(|_| {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move { ledger.increment("SKU001", 1).await.map(|_| ()) })
        });
        let results = join_all(decrements.chain(increments)).await;

        assert!(results.into_iter().all(|r| r.unwrap().is_ok()));
        assert_eq!(ledger.get_by_sku("SKU001").await.unwrap().quantity, 100 - 80 + 20);
    }
}

mod sku_identity {
    use super::*;

    #[tokio::test]
    async fn uniqueness_ignores_case() {
        let ledger = create_ledger();
        ledger
            .create_item(NewStockItem::new("Lower", "abc", "A1", 1))
            .await
            .unwrap();

        let result = ledger
            .create_item(NewStockItem::new("Upper", "ABC", "A2", 1))
            .await;

        assert!(matches!(result, Err(DomainError::SkuAlreadyExists(_))));
        assert_eq!(ledger.get_by_sku("ABC").await.unwrap().name, "Lower");
    }

    #[tokio::test]
    async fn concurrent_creates_of_one_sku_admit_one() {
        let ledger = Arc::new(create_ledger());
        let tasks = ["dup", "DUP", "Dup", "dUp"].into_iter().map(|sku| {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move {
                ledger
                    .create_item(NewStockItem::new("Item", sku, "A1", 1))
                    .await
            })
        });

        let created = join_all(tasks)
            .await
            .into_iter()
            .filter(|r| matches!(r, Ok(Ok(_))))
            .count();
        assert_eq!(created, 1);
    }
}
