use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use common::RecordId;
use common::listing::contains_ignore_case;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};
use crate::stock::Sku;

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Fulfilled,
    Cancelled,
}

impl OrderStatus {
    /// Parses a status name, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "fulfilled" => Ok(OrderStatus::Fulfilled),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::invalid(format!("unknown order status: {other}"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Fulfilled => "fulfilled",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of an order: which stock item was consumed and how much of it.
///
/// The SKU is copied onto the line so the order stays readable after the
/// stock item is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    pub item_id: RecordId,
    pub sku: Sku,
    pub quantity: u32,
}

impl OrderLineItem {
    pub fn new(item_id: RecordId, sku: Sku, quantity: u32) -> Self {
        Self {
            item_id,
            sku,
            quantity,
        }
    }
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: RecordId,
    pub order_number: String,
    pub customer_name: String,
    #[serde(rename = "orderDate")]
    pub ordered_at: DateTime<Utc>,
    pub status: OrderStatus,
    /// Always the sum of the line item quantities.
    pub total_quantity: u64,
    pub items: Vec<OrderLineItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns true if customer name, order number or status contains the
    /// lowercased needle.
    pub fn matches(&self, needle: &str) -> bool {
        contains_ignore_case(&self.customer_name, needle)
            || contains_ignore_case(&self.order_number, needle)
            || self.status.as_str().contains(needle)
    }

    /// Sum of the line item quantities.
    pub fn line_total(items: &[OrderLineItem]) -> u64 {
        items.iter().map(|line| u64::from(line.quantity)).sum()
    }
}

/// Input for inserting an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub order_number: String,
    pub customer_name: String,
    pub ordered_at: DateTime<Utc>,
    pub items: Vec<OrderLineItem>,
}

impl NewOrder {
    /// Creates an order input dated now.
    pub fn new(
        order_number: impl Into<String>,
        customer_name: impl Into<String>,
        items: Vec<OrderLineItem>,
    ) -> Self {
        Self {
            order_number: order_number.into(),
            customer_name: customer_name.into(),
            ordered_at: Utc::now(),
            items,
        }
    }

    /// Overrides the order date.
    pub fn ordered_at(mut self, ordered_at: DateTime<Utc>) -> Self {
        self.ordered_at = ordered_at;
        self
    }

    pub(crate) fn into_order(self) -> Result<Order> {
        let order_number = required("orderNumber", &self.order_number)?;
        let customer_name = required("customerName", &self.customer_name)?;
        if self.items.is_empty() {
            return Err(DomainError::invalid("an order needs at least one line item"));
        }
        let now = Utc::now();

        Ok(Order {
            id: RecordId::new(),
            order_number,
            customer_name,
            ordered_at: self.ordered_at,
            status: OrderStatus::default(),
            total_quantity: Order::line_total(&self.items),
            items: self.items,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial edit of an order. Line items and the total are fixed at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderUpdate {
    pub order_number: Option<String>,
    pub customer_name: Option<String>,
    pub status: Option<OrderStatus>,
}

impl OrderUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order_number(mut self, order_number: impl Into<String>) -> Self {
        self.order_number = Some(order_number.into());
        self
    }

    pub fn customer_name(mut self, customer_name: impl Into<String>) -> Self {
        self.customer_name = Some(customer_name.into());
        self
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.order_number.is_none() && self.customer_name.is_none() && self.status.is_none()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(order_number) = &self.order_number {
            required("orderNumber", order_number)?;
        }
        if let Some(customer_name) = &self.customer_name {
            required("customerName", customer_name)?;
        }
        Ok(())
    }

    pub(crate) fn apply(&self, order: &Order) -> Order {
        let mut next = order.clone();
        if let Some(order_number) = &self.order_number {
            next.order_number = order_number.trim().to_string();
        }
        if let Some(customer_name) = &self.customer_name {
            next.customer_name = customer_name.trim().to_string();
        }
        if let Some(status) = self.status {
            next.status = status;
        }
        next.updated_at = Utc::now();
        next
    }
}

/// Fields an order listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderSortField {
    #[default]
    CreatedAt,
    OrderDate,
    OrderNumber,
    CustomerName,
    Status,
    TotalQuantity,
}

impl OrderSortField {
    /// Parses a sort field name; `None` or a blank name selects the default.
    pub fn parse(field: Option<&str>) -> Result<Self> {
        let Some(field) = field.map(str::trim).filter(|f| !f.is_empty()) else {
            return Ok(Self::default());
        };
        match field {
            "createdAt" | "created_at" => Ok(OrderSortField::CreatedAt),
            "orderDate" | "ordered_at" => Ok(OrderSortField::OrderDate),
            "orderNumber" | "order_number" => Ok(OrderSortField::OrderNumber),
            "customerName" | "customer_name" => Ok(OrderSortField::CustomerName),
            "status" => Ok(OrderSortField::Status),
            "totalQuantity" | "total_quantity" => Ok(OrderSortField::TotalQuantity),
            other => Err(DomainError::invalid(format!(
                "unknown order sort field: {other}"
            ))),
        }
    }

    /// Compares two orders on this field, ascending, with ties broken by id.
    pub fn compare(&self, a: &Order, b: &Order) -> Ordering {
        let primary = match self {
            OrderSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            OrderSortField::OrderDate => a.ordered_at.cmp(&b.ordered_at),
            OrderSortField::OrderNumber => a.order_number.cmp(&b.order_number),
            OrderSortField::CustomerName => a
                .customer_name
                .to_lowercase()
                .cmp(&b.customer_name.to_lowercase()),
            OrderSortField::Status => a.status.as_str().cmp(b.status.as_str()),
            OrderSortField::TotalQuantity => a.total_quantity.cmp(&b.total_quantity),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::invalid(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}
