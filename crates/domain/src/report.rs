//! Read-only aggregations over the ledger and the order store.

use std::collections::BTreeMap;

use chrono::Datelike;
use record_store::RecordStore;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::order::OrderStore;
use crate::stock::{StockItem, StockLedger};

/// Items below this quantity are reported as low on stock by default.
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 10;

/// Every stock item plus the ones running low.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    pub inventory_levels: Vec<StockItem>,
    pub low_stock_items: Vec<StockItem>,
    pub low_stock_threshold: u32,
}

/// Order volume for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySales {
    pub year: i32,
    pub month: u32,
    pub total_orders: u64,
    pub total_quantity: u64,
}

#[derive(Clone)]
pub struct ReportService<S: RecordStore, O: RecordStore> {
    ledger: StockLedger<S>,
    orders: OrderStore<O>,
    low_stock_threshold: u32,
}

impl<S: RecordStore, O: RecordStore> ReportService<S, O> {
    pub fn new(ledger: StockLedger<S>, orders: OrderStore<O>) -> Self {
        Self {
            ledger,
            orders,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }

    pub fn with_low_stock_threshold(mut self, threshold: u32) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    #[tracing::instrument(skip(self))]
    pub async fn inventory_report(&self) -> Result<InventoryReport> {
        let inventory_levels = self.ledger.all_items().await?;
        let low_stock_items = inventory_levels
            .iter()
            .filter(|item| item.quantity < self.low_stock_threshold)
            .cloned()
            .collect();

        Ok(InventoryReport {
            inventory_levels,
            low_stock_items,
            low_stock_threshold: self.low_stock_threshold,
        })
    }

    /// Orders grouped by the year and month of their order date, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn sales_report(&self) -> Result<Vec<MonthlySales>> {
        let mut months: BTreeMap<(i32, u32), MonthlySales> = BTreeMap::new();
        for order in self.orders.all_orders().await? {
            let (year, month) = (order.ordered_at.year(), order.ordered_at.month());
            let entry = months.entry((year, month)).or_insert(MonthlySales {
                year,
                month,
                total_orders: 0,
                total_quantity: 0,
            });
            entry.total_orders += 1;
            entry.total_quantity += order.total_quantity;
        }

        Ok(months.into_values().rev().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{NewOrder, OrderLineItem};
    use crate::stock::NewStockItem;
    use chrono::{TimeZone, Utc};
    use record_store::InMemoryRecordStore;

    fn service() -> ReportService<InMemoryRecordStore, InMemoryRecordStore> {
        ReportService::new(
            StockLedger::new(InMemoryRecordStore::new()),
            OrderStore::new(InMemoryRecordStore::new()),
        )
    }

    #[tokio::test]
    async fn inventory_report_flags_low_stock() {
        let reports = service().with_low_stock_threshold(5);
        for (sku, qty) in [("A", 4), ("B", 5), ("C", 0)] {
            reports
                .ledger
                .create_item(NewStockItem::new(sku, sku, "A1", qty))
                .await
                .unwrap();
        }

        let report = reports.inventory_report().await.unwrap();
        assert_eq!(report.inventory_levels.len(), 3);
        let low: Vec<_> = report.low_stock_items.iter().map(|i| i.sku.as_str()).collect();
        assert_eq!(low, vec!["A", "C"]);
        assert_eq!(report.low_stock_threshold, 5);
    }

    #[tokio::test]
    async fn sales_report_groups_by_month_newest_first() {
        let reports = service();
        let item = reports
            .ledger
            .create_item(NewStockItem::new("Widget", "W", "A1", 100))
            .await
            .unwrap();
        let line = |q| OrderLineItem::new(item.id, item.sku.clone(), q);

        for (day, month, qty) in [(3, 1, 2), (20, 1, 5), (1, 3, 7)] {
            let at = Utc.with_ymd_and_hms(2024, month, day, 12, 0, 0).unwrap();
            reports
                .orders
                .insert(NewOrder::new("ORD", "Ada", vec![line(qty)]).ordered_at(at))
                .await
                .unwrap();
        }

        let sales = reports.sales_report().await.unwrap();
        assert_eq!(
            sales,
            vec![
                MonthlySales {
                    year: 2024,
                    month: 3,
                    total_orders: 1,
                    total_quantity: 7
                },
                MonthlySales {
                    year: 2024,
                    month: 1,
                    total_orders: 2,
                    total_quantity: 7
                },
            ]
        );
    }
}
