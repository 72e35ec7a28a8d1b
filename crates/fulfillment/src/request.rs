//! Fulfillment requests and their normalized form.

use std::collections::BTreeMap;

use domain::Sku;
use serde::{Deserialize, Serialize};

use crate::error::{FulfillmentError, Result};

/// One requested `(sku, quantity)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemRequest {
    pub sku: String,
    pub quantity: u32,
}

impl LineItemRequest {
    pub fn new(sku: impl Into<String>, quantity: u32) -> Self {
        Self {
            sku: sku.into(),
            quantity,
        }
    }
}

/// A caller's request to fulfill an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentRequest {
    pub order_number: String,
    pub customer_name: String,
    pub items: Vec<LineItemRequest>,
}

impl FulfillmentRequest {
    pub fn new(
        order_number: impl Into<String>,
        customer_name: impl Into<String>,
        items: Vec<LineItemRequest>,
    ) -> Self {
        Self {
            order_number: order_number.into(),
            customer_name: customer_name.into(),
            items,
        }
    }

    /// Checks the request and normalizes its lines.
    ///
    /// Lines naming the same SKU (ignoring case) are summed into one, which
    /// keeps the casing of the first occurrence. The result is sorted by SKU
    /// key, the order in which stock is taken.
    pub fn validate(&self) -> Result<ValidatedRequest> {
        let order_number = required("orderNumber", &self.order_number)?;
        let customer_name = required("customerName", &self.customer_name)?;
        if self.items.is_empty() {
            return Err(FulfillmentError::InvalidRequest(
                "an order needs at least one line item".to_string(),
            ));
        }

        let mut lines: BTreeMap<String, ReservationLine> = BTreeMap::new();
        for item in &self.items {
            let sku = Sku::parse(&item.sku)
                .map_err(|e| FulfillmentError::InvalidRequest(e.to_string()))?;
            if item.quantity == 0 {
                return Err(FulfillmentError::InvalidRequest(format!(
                    "quantity for SKU {sku} must be greater than 0"
                )));
            }

            match lines.get_mut(&sku.key()) {
                Some(line) => {
                    line.quantity = line.quantity.checked_add(item.quantity).ok_or_else(|| {
                        FulfillmentError::InvalidRequest(format!(
                            "total quantity for SKU {sku} is too large"
                        ))
                    })?;
                }
                None => {
                    lines.insert(
                        sku.key(),
                        ReservationLine {
                            sku,
                            quantity: item.quantity,
                        },
                    );
                }
            }
        }

        Ok(ValidatedRequest {
            order_number,
            customer_name,
            lines: lines.into_values().collect(),
        })
    }
}

/// A validated request with one line per SKU, in reservation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub order_number: String,
    pub customer_name: String,
    pub lines: Vec<ReservationLine>,
}

/// The amount to take for one SKU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationLine {
    pub sku: Sku,
    pub quantity: u32,
}

fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FulfillmentError::InvalidRequest(format!(
            "{field} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}
