use criterion::{Criterion, criterion_group, criterion_main};
use domain::{NewStockItem, OrderStore, RetryPolicy, StockLedger};
use fulfillment::{FulfillmentCoordinator, FulfillmentRequest, LineItemRequest};
use futures_util::future::join_all;
use record_store::InMemoryRecordStore;

type BenchCoordinator = FulfillmentCoordinator<InMemoryRecordStore, InMemoryRecordStore>;

async fn coordinator_with_stock(skus: &[&str], quantity: u32) -> BenchCoordinator {
    let ledger = StockLedger::with_retry_policy(InMemoryRecordStore::new(), RetryPolicy::immediate(1_000));
    for sku in skus {
        ledger
            .create_item(NewStockItem::new(*sku, *sku, "BENCH", quantity))
            .await
            .unwrap();
    }
    FulfillmentCoordinator::new(ledger, OrderStore::new(InMemoryRecordStore::new()))
}

fn request(skus: &[&str]) -> FulfillmentRequest {
    FulfillmentRequest::new(
        "ORD-BENCH",
        "Bench Customer",
        skus.iter().map(|sku| LineItemRequest::new(*sku, 1)).collect(),
    )
}

fn bench_single_line(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let coordinator = rt.block_on(coordinator_with_stock(&["SKU-001"], u32::MAX));

    c.bench_function("fulfillment/single_line", |b| {
        b.to_async(&rt).iter(|| async {
            coordinator
                .fulfill_order(request(&["SKU-001"]))
                .await
                .unwrap();
        });
    });
}

fn bench_five_lines(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let skus = ["SKU-001", "SKU-002", "SKU-003", "SKU-004", "SKU-005"];
    let coordinator = rt.block_on(coordinator_with_stock(&skus, u32::MAX));

    c.bench_function("fulfillment/five_lines", |b| {
        b.to_async(&rt).iter(|| async {
            coordinator.fulfill_order(request(&skus)).await.unwrap();
        });
    });
}

fn bench_contended(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let coordinator = rt.block_on(coordinator_with_stock(&["HOT"], u32::MAX));

    c.bench_function("fulfillment/16_concurrent_same_sku", |b| {
        b.to_async(&rt).iter(|| async {
            let attempts = (0..16).map(|_| coordinator.fulfill_order(request(&["HOT"])));
            for result in join_all(attempts).await {
                result.unwrap();
            }
        });
    });
}

fn bench_insufficient_with_compensation(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let coordinator = rt.block_on(async {
        let coordinator = coordinator_with_stock(&["PLENTY"], u32::MAX).await;
        coordinator
            .ledger()
            .create_item(NewStockItem::new("EMPTY", "ZZ-EMPTY", "BENCH", 0))
            .await
            .unwrap();
        coordinator
    });

    c.bench_function("fulfillment/abort_and_compensate", |b| {
        b.to_async(&rt).iter(|| async {
            coordinator
                .fulfill_order(request(&["PLENTY", "ZZ-EMPTY"]))
                .await
                .unwrap_err();
        });
    });
}

criterion_group!(
    benches,
    bench_single_line,
    bench_five_lines,
    bench_contended,
    bench_insufficient_with_compensation
);
criterion_main!(benches);
