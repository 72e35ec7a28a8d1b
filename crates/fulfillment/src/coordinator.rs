//! Fulfillment coordinator.

use std::time::Instant;

use domain::{NewOrder, Order, OrderStore, StockLedger};
use record_store::RecordStore;
use tracing::Instrument;

use crate::attempt::{FulfillmentAttempt, Reservation};
use crate::error::{FulfillmentError, Result};
use crate::request::{FulfillmentRequest, ReservationLine, ValidatedRequest};
use crate::state::FulfillmentState;

/// Turns fulfillment requests into orders, taking the matching stock.
///
/// Stock for each SKU is taken with the ledger's conditional decrement, one
/// SKU at a time in ascending SKU order; the order is inserted only after every
/// decrement succeeded. A failure at any step restores the stock already taken
/// (in reverse order) before the failure is returned, so callers observe either
/// the full effect or none of it.
///
/// No lock is held across SKUs: concurrent fulfillments for overlapping SKUs
/// are serialized per SKU by the ledger's compare-and-set.
#[derive(Clone)]
pub struct FulfillmentCoordinator<S: RecordStore, O: RecordStore> {
    ledger: StockLedger<S>,
    orders: OrderStore<O>,
}

impl<S, O> FulfillmentCoordinator<S, O>
where
    S: RecordStore + Clone + 'static,
    O: RecordStore + Clone + 'static,
{
    /// Creates a coordinator over the given ledger and order store.
    pub fn new(ledger: StockLedger<S>, orders: OrderStore<O>) -> Self {
        Self { ledger, orders }
    }

    /// Returns the stock ledger reservations are taken from.
    pub fn ledger(&self) -> &StockLedger<S> {
        &self.ledger
    }

    /// Returns the store committed orders are written to.
    pub fn orders(&self) -> &OrderStore<O> {
        &self.orders
    }

    /// Fulfills an order: takes stock for every line and records the order,
    /// or changes nothing and reports why.
    ///
    /// The attempt runs on its own task. Dropping the returned future (for
    /// example on a client timeout) does not interrupt it: it still runs to
    /// `Committed` or, after compensating, to `Aborted`.
    #[tracing::instrument(skip(self, request), fields(order_number = %request.order_number))]
    pub async fn fulfill_order(&self, request: FulfillmentRequest) -> Result<Order> {
        let coordinator = self.clone();
        let task = tokio::spawn(async move { coordinator.run(request).await }.in_current_span());

        task.await
            .map_err(|e| FulfillmentError::Internal(format!("fulfillment task failed: {e}")))?
    }

    async fn run(&self, request: FulfillmentRequest) -> Result<Order> {
        metrics::counter!("fulfillment_attempts_total").increment(1);
        let started = Instant::now();

        let mut attempt = FulfillmentAttempt::new(request.order_number.trim());
        let result = self.execute(&mut attempt, &request).await;

        let duration = started.elapsed().as_secs_f64();
        metrics::histogram!("fulfillment_duration_seconds").record(duration);
        match &result {
            Ok(order) => {
                metrics::counter!("fulfillment_committed_total").increment(1);
                tracing::info!(
                    order_id = %order.id,
                    total_quantity = order.total_quantity,
                    duration,
                    "fulfillment committed"
                );
            }
            Err(e) => {
                metrics::counter!("fulfillment_aborted_total", "code" => e.code()).increment(1);
                tracing::warn!(code = e.code(), error = %e, state = %attempt.state(), "fulfillment aborted");
            }
        }
        result
    }

    async fn execute(
        &self,
        attempt: &mut FulfillmentAttempt,
        request: &FulfillmentRequest,
    ) -> Result<Order> {
        let validated = match self.prepare(request).await {
            Ok(validated) => validated,
            Err(e) => {
                attempt.transition(FulfillmentState::Aborted)?;
                return Err(e);
            }
        };

        for (index, line) in validated.lines.iter().enumerate() {
            if let Err(e) = self.reserve(attempt, index, line).await {
                return self.abort(attempt, e).await;
            }
        }

        if let Err(e) = attempt.transition(FulfillmentState::Persisting) {
            return self.abort(attempt, e).await;
        }
        let new_order = NewOrder::new(
            validated.order_number.clone(),
            validated.customer_name.clone(),
            attempt.line_items(),
        );
        let order = match self.orders.insert(new_order).await {
            Ok(order) => order,
            Err(e) => {
                let failure = FulfillmentError::OrderPersistenceFailed {
                    order_number: validated.order_number.clone(),
                    reason: e.to_string(),
                };
                return self.abort(attempt, failure).await;
            }
        };

        attempt.transition(FulfillmentState::Committed)?;
        Ok(order)
    }

    /// Validates the request and checks that every SKU exists, before any
    /// stock is touched.
    async fn prepare(&self, request: &FulfillmentRequest) -> Result<ValidatedRequest> {
        let validated = request.validate()?;
        for line in &validated.lines {
            self.ledger
                .get_by_sku(line.sku.as_str())
                .await
                .map_err(|e| FulfillmentError::from_ledger(line.sku.as_str(), e))?;
        }
        Ok(validated)
    }

    async fn reserve(
        &self,
        attempt: &mut FulfillmentAttempt,
        index: usize,
        line: &ReservationLine,
    ) -> Result<()> {
        attempt.transition(FulfillmentState::Reserving(index))?;

        let item = self
            .ledger
            .try_decrement(line.sku.as_str(), line.quantity)
            .await
            .map_err(|e| FulfillmentError::from_ledger(line.sku.as_str(), e))?;

        attempt.record_reservation(Reservation {
            item_id: item.id,
            sku: item.sku,
            quantity: line.quantity,
        })
    }

    /// Restores the stock taken so far and ends the attempt in `Aborted`.
    async fn abort(
        &self,
        attempt: &mut FulfillmentAttempt,
        cause: FulfillmentError,
    ) -> Result<Order> {
        if let Err(e) = attempt.transition(FulfillmentState::Compensating) {
            tracing::error!(error = %e, "compensating from unexpected state");
        }

        let unrestored = self.compensate(attempt).await;

        if let Err(e) = attempt.transition(FulfillmentState::Aborted) {
            tracing::error!(error = %e, "aborting from unexpected state");
        }

        if unrestored.is_empty() {
            return Err(cause);
        }
        Err(FulfillmentError::CompensationFailed {
            order_number: attempt.order_number().to_string(),
            unrestored,
            cause: Box::new(cause),
        })
    }

    /// Restores every reserved SKU, newest first. Lost races are retried until
    /// the restore lands, so only store failures leave a SKU unrestored. Keeps
    /// going past those and returns the SKUs that could not be restored.
    async fn compensate(&self, attempt: &FulfillmentAttempt) -> Vec<String> {
        let mut unrestored = Vec::new();

        for reservation in attempt.reservations().iter().rev() {
            match self
                .ledger
                .restore(reservation.sku.as_str(), reservation.quantity)
                .await
            {
                Ok(item) => {
                    tracing::debug!(
                        sku = %reservation.sku,
                        amount = reservation.quantity,
                        quantity = item.quantity,
                        "reservation released"
                    );
                }
                Err(e) => {
                    metrics::counter!("fulfillment_compensation_failures_total").increment(1);
                    tracing::error!(
                        order_number = attempt.order_number(),
                        sku = %reservation.sku,
                        amount = reservation.quantity,
                        error = %e,
                        "failed to restore stock, manual reconciliation required"
                    );
                    unrestored.push(reservation.sku.to_string());
                }
            }
        }

        unrestored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::LineItemRequest;
    use domain::{NewStockItem, RetryPolicy};
    use record_store::{InMemoryRecordStore, Version};

    struct Harness {
        coordinator: FulfillmentCoordinator<InMemoryRecordStore, InMemoryRecordStore>,
        stock: InMemoryRecordStore,
        orders: InMemoryRecordStore,
    }

    async fn setup(items: &[(&str, u32)]) -> Harness {
        let stock = InMemoryRecordStore::new();
        let orders = InMemoryRecordStore::new();
        let ledger = StockLedger::with_retry_policy(stock.clone(), RetryPolicy::immediate(3));
        for (sku, quantity) in items {
            ledger
                .create_item(NewStockItem::new(format!("Item {sku}"), *sku, "A1", *quantity))
                .await
                .unwrap();
        }
        let coordinator = FulfillmentCoordinator::new(
            ledger,
            OrderStore::with_retry_policy(orders.clone(), RetryPolicy::immediate(3)),
        );
        Harness {
            coordinator,
            stock,
            orders,
        }
    }

    impl Harness {
        async fn quantity(&self, sku: &str) -> u32 {
            self.coordinator.ledger().get_by_sku(sku).await.unwrap().quantity
        }
    }

    fn request(items: &[(&str, u32)]) -> FulfillmentRequest {
        FulfillmentRequest::new(
            "ORD1",
            "Ada",
            items
                .iter()
                .map(|(sku, q)| LineItemRequest::new(*sku, *q))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_happy_path() {
        let h = setup(&[("SKU001", 5), ("SKU002", 4)]).await;

        let order = h
            .coordinator
            .fulfill_order(request(&[("SKU002", 1), ("sku001", 2)]))
            .await
            .unwrap();

        assert_eq!(order.total_quantity, 3);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].sku.as_str(), "SKU001");
        assert_eq!(order.items[1].sku.as_str(), "SKU002");
        assert_eq!(h.quantity("SKU001").await, 3);
        assert_eq!(h.quantity("SKU002").await, 3);
        assert_eq!(h.coordinator.orders().get(order.id).await.unwrap(), order);
    }

    #[tokio::test]
    async fn test_duplicate_lines_are_summed() {
        let h = setup(&[("SKU001", 5)]).await;

        let order = h
            .coordinator
            .fulfill_order(request(&[("SKU001", 2), ("sku001", 2)]))
            .await
            .unwrap();

        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 4);
        assert_eq!(h.quantity("SKU001").await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_lines_exceeding_stock_fail() {
        let h = setup(&[("SKU001", 5)]).await;

        let err = h
            .coordinator
            .fulfill_order(request(&[("SKU001", 3), ("SKU001", 3)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FulfillmentError::InsufficientStock {
                requested: 6,
                available: 5,
                ..
            }
        ));
        assert_eq!(h.quantity("SKU001").await, 5);
    }

    #[tokio::test]
    async fn test_missing_sku_touches_nothing() {
        let h = setup(&[("SKU001", 5)]).await;

        let err = h
            .coordinator
            .fulfill_order(request(&[("SKU001", 2), ("MISSING", 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, FulfillmentError::ItemNotFound(ref sku) if sku == "MISSING"));
        let record = h.stock.get("sku001").await.unwrap().unwrap();
        assert_eq!(record.version, Version::first());
        assert!(h.orders.is_empty().await);
    }

    #[tokio::test]
    async fn test_insufficient_stock_compensates_earlier_lines() {
        let h = setup(&[("A", 5), ("B", 1)]).await;

        let err = h
            .coordinator
            .fulfill_order(request(&[("A", 2), ("B", 3)]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "INSUFFICIENT_STOCK");
        assert_eq!(h.quantity("A").await, 5);
        assert_eq!(h.quantity("B").await, 1);
        assert!(h.orders.is_empty().await);
    }

    #[tokio::test]
    async fn test_order_persistence_failure_compensates() {
        let h = setup(&[("A", 5), ("B", 5)]).await;
        h.orders.set_fail_on_insert(true);

        let err = h
            .coordinator
            .fulfill_order(request(&[("A", 2), ("B", 3)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FulfillmentError::OrderPersistenceFailed { ref order_number, .. } if order_number == "ORD1"
        ));
        assert_eq!(h.quantity("A").await, 5);
        assert_eq!(h.quantity("B").await, 5);
    }

    #[tokio::test]
    async fn test_invalid_request_touches_nothing() {
        let h = setup(&[("A", 5)]).await;

        let err = h
            .coordinator
            .fulfill_order(request(&[("A", 0)]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "INVALID_REQUEST");
        assert_eq!(h.quantity("A").await, 5);

        let err = h.coordinator.fulfill_order(request(&[])).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn test_contention_is_surfaced_after_retries() {
        let h = setup(&[("A", 5)]).await;
        h.stock.inject_conflicts(3);

        let err = h
            .coordinator
            .fulfill_order(request(&[("A", 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, FulfillmentError::Contention { attempts: 3, .. }));
        assert_eq!(h.quantity("A").await, 5);
        assert!(h.orders.is_empty().await);
    }
}
