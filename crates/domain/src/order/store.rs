//! Order store over a versioned record store.

use common::{ListQuery, Page, RecordId};
use record_store::{RecordStore, RecordStoreExt};

use super::{NewOrder, Order, OrderSortField, OrderUpdate};
use crate::error::{DomainError, Result};
use crate::retry::{RetryPolicy, update_with_retry};

/// Owns order records, keyed by order id.
///
/// Inserting an order never touches stock; checking that the referenced SKUs
/// exist and taking their quantities is the fulfillment coordinator's job.
#[derive(Clone)]
pub struct OrderStore<S: RecordStore> {
    store: S,
    retry: RetryPolicy,
}

impl<S: RecordStore> OrderStore<S> {
    pub fn new(store: S) -> Self {
        Self::with_retry_policy(store, RetryPolicy::default())
    }

    pub fn with_retry_policy(store: S, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Persists a new order with a fresh id and `pending` status.
    #[tracing::instrument(skip(self, order), fields(order_number = %order.order_number))]
    pub async fn insert(&self, order: NewOrder) -> Result<Order> {
        let order = order.into_order()?;
        let created = self.store.insert_as(&order.id.to_string(), &order).await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(
            order_id = %created.value.id,
            total_quantity = created.value.total_quantity,
            "order persisted"
        );
        Ok(created.value)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: RecordId) -> Result<Order> {
        self.store
            .get_as::<Order>(&id.to_string())
            .await?
            .map(|v| v.value)
            .ok_or(DomainError::OrderNotFound(id))
    }

    /// Lists orders filtered by a case-insensitive substring match on customer
    /// name, order number or status, sorted and paginated.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, query: &ListQuery) -> Result<Page<Order>> {
        let field = OrderSortField::parse(query.sort_by.as_deref())?;
        let needle = query.needle();

        let mut orders: Vec<Order> = self
            .all_orders()
            .await?
            .into_iter()
            .filter(|order| needle.as_deref().is_none_or(|n| order.matches(n)))
            .collect();
        orders.sort_by(|a, b| query.direction.apply(field.compare(a, b)));

        Ok(query.paginate(orders))
    }

    /// Edits order number, customer name and/or status.
    #[tracing::instrument(skip(self))]
    pub async fn update(&self, id: RecordId, update: OrderUpdate) -> Result<Order> {
        update.validate()?;
        if update.is_empty() {
            return self.get(id).await;
        }

        let order = update_with_retry(
            &self.store,
            &id.to_string(),
            &self.retry,
            "orders",
            || DomainError::OrderNotFound(id),
            |current: &Order| Ok(update.apply(current)),
        )
        .await?;

        tracing::info!(order_id = %id, status = %order.status, "order updated");
        Ok(order)
    }

    /// Removes an order. Stock consumed by the order is not restored.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: RecordId) -> Result<()> {
        if !self.store.delete(&id.to_string()).await? {
            return Err(DomainError::OrderNotFound(id));
        }
        tracing::info!(order_id = %id, "order deleted");
        Ok(())
    }

    pub async fn all_orders(&self) -> Result<Vec<Order>> {
        Ok(self
            .store
            .scan_as::<Order>()
            .await?
            .into_iter()
            .map(|v| v.value)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{OrderLineItem, OrderStatus};
    use crate::stock::Sku;
    use common::SortDirection;
    use record_store::InMemoryRecordStore;

    fn orders() -> (OrderStore<InMemoryRecordStore>, InMemoryRecordStore) {
        let store = InMemoryRecordStore::new();
        (
            OrderStore::with_retry_policy(store.clone(), RetryPolicy::immediate(3)),
            store,
        )
    }

    fn new_order(number: &str, customer: &str, quantities: &[u32]) -> NewOrder {
        let items = quantities
            .iter()
            .enumerate()
            .map(|(i, q)| {
                OrderLineItem::new(RecordId::new(), Sku::parse(&format!("SKU{i}")).unwrap(), *q)
            })
            .collect();
        NewOrder::new(number, customer, items)
    }

    #[tokio::test]
    async fn insert_and_get() {
        let (orders, _) = orders();
        let created = orders
            .insert(new_order("ORD1", "Ada", &[2, 3]))
            .await
            .unwrap();

        assert_eq!(created.total_quantity, 5);
        assert_eq!(orders.get(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let (orders, _) = orders();
        let id = RecordId::new();
        assert!(matches!(
            orders.get(id).await,
            Err(DomainError::OrderNotFound(missing)) if missing == id
        ));
    }

    #[tokio::test]
    async fn insert_failure_surfaces_store_error() {
        let (orders, store) = orders();
        store.set_fail_on_insert(true);

        let result = orders.insert(new_order("ORD1", "Ada", &[1])).await;
        assert!(matches!(result, Err(DomainError::Store(_))));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn update_status_and_fields() {
        let (orders, _) = orders();
        let created = orders.insert(new_order("ORD1", "Ada", &[1])).await.unwrap();

        let updated = orders
            .update(
                created.id,
                OrderUpdate::new()
                    .status(OrderStatus::Fulfilled)
                    .order_number("ORD1-A"),
            )
            .await
            .unwrap();

        assert_eq!(updated.status, OrderStatus::Fulfilled);
        assert_eq!(updated.order_number, "ORD1-A");
        assert_eq!(updated.items, created.items);
    }

    #[tokio::test]
    async fn update_retries_lost_races() {
        let (orders, store) = orders();
        let created = orders.insert(new_order("ORD1", "Ada", &[1])).await.unwrap();
        store.inject_conflicts(2);

        let updated = orders
            .update(created.id, OrderUpdate::new().status(OrderStatus::Processing))
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Processing);
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let (orders, _) = orders();
        let result = orders
            .update(RecordId::new(), OrderUpdate::new().customer_name("Bob"))
            .await;
        assert!(matches!(result, Err(DomainError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn delete_then_missing() {
        let (orders, _) = orders();
        let created = orders.insert(new_order("ORD1", "Ada", &[1])).await.unwrap();

        orders.delete(created.id).await.unwrap();
        assert!(matches!(
            orders.delete(created.id).await,
            Err(DomainError::OrderNotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_searches_and_sorts() {
        let (orders, _) = orders();
        orders.insert(new_order("ORD1", "Ada Lovelace", &[5])).await.unwrap();
        orders.insert(new_order("ORD2", "Grace Hopper", &[1])).await.unwrap();
        let third = orders.insert(new_order("ORD3", "Ada Byron", &[9])).await.unwrap();
        orders
            .update(third.id, OrderUpdate::new().status(OrderStatus::Fulfilled))
            .await
            .unwrap();

        let page = orders
            .list(
                &ListQuery::new()
                    .search("ada")
                    .sort_by("totalQuantity", SortDirection::Desc),
            )
            .await
            .unwrap();
        let numbers: Vec<_> = page.items.iter().map(|o| o.order_number.as_str()).collect();
        assert_eq!(numbers, vec!["ORD3", "ORD1"]);

        let page = orders
            .list(&ListQuery::new().search("FULFILLED"))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, third.id);

        let page = orders
            .list(&ListQuery::new().sort_by("orderNumber", SortDirection::Asc).size(2))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].order_number, "ORD1");
    }

    #[tokio::test]
    async fn identical_list_queries_return_identical_pages() {
        let (orders, _) = orders();
        for i in 0..7 {
            orders
                .insert(new_order(&format!("ORD{i}"), "Ada", &[1]))
                .await
                .unwrap();
        }
        // Every order is pending, so the status sort ties throughout.
        let query = ListQuery::new()
            .sort_by("status", SortDirection::Asc)
            .page(2)
            .size(3);

        let first = orders.list(&query).await.unwrap();
        let second = orders.list(&query).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.total, 7);
        assert_eq!(first.items.len(), 3);

        let ids: Vec<_> = first.items.iter().map(|o| o.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }
}
