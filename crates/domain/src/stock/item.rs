use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use common::RecordId;
use serde::{Deserialize, Serialize};

use super::Sku;
use crate::error::{DomainError, Result};

/// A stock item and its quantity on hand.
///
/// `quantity` is unsigned: the ledger rejects any change that would take it
/// below zero before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockItem {
    pub id: RecordId,
    pub sku: Sku,
    pub name: String,
    pub location: String,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockItem {
    /// Returns true if any of name, SKU or location contains the lowercased needle.
    pub fn matches(&self, needle: &str) -> bool {
        common::listing::contains_ignore_case(&self.name, needle)
            || common::listing::contains_ignore_case(self.sku.as_str(), needle)
            || common::listing::contains_ignore_case(&self.location, needle)
    }
}

/// Input for creating a stock item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStockItem {
    pub name: String,
    pub sku: String,
    pub location: String,
    pub quantity: u32,
}

impl NewStockItem {
    pub fn new(
        name: impl Into<String>,
        sku: impl Into<String>,
        location: impl Into<String>,
        quantity: u32,
    ) -> Self {
        Self {
            name: name.into(),
            sku: sku.into(),
            location: location.into(),
            quantity,
        }
    }

    /// Validates the input and builds the record to persist.
    pub(crate) fn into_item(self) -> Result<StockItem> {
        let sku = Sku::parse(&self.sku)?;
        let name = required("name", &self.name)?;
        let location = required("location", &self.location)?;
        let now = Utc::now();

        Ok(StockItem {
            id: RecordId::new(),
            sku,
            name,
            location,
            quantity: self.quantity,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial edit of a stock item's descriptive fields or quantity.
///
/// The SKU is immutable and cannot be changed through an update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockItemUpdate {
    pub name: Option<String>,
    pub location: Option<String>,
    pub quantity: Option<u32>,
}

impl StockItemUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Returns true if the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.location.is_none() && self.quantity.is_none()
    }

    /// Checks field contents without touching any record.
    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            required("name", name)?;
        }
        if let Some(location) = &self.location {
            required("location", location)?;
        }
        Ok(())
    }

    pub(crate) fn apply(&self, item: &StockItem) -> StockItem {
        let mut next = item.clone();
        if let Some(name) = &self.name {
            next.name = name.trim().to_string();
        }
        if let Some(location) = &self.location {
            next.location = location.trim().to_string();
        }
        if let Some(quantity) = self.quantity {
            next.quantity = quantity;
        }
        next.updated_at = Utc::now();
        next
    }
}

/// Fields a stock listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockSortField {
    #[default]
    Sku,
    Name,
    Location,
    Quantity,
    CreatedAt,
}

impl StockSortField {
    /// Parses a sort field name; `None` or a blank name selects the default.
    pub fn parse(field: Option<&str>) -> Result<Self> {
        let Some(field) = field.map(str::trim).filter(|f| !f.is_empty()) else {
            return Ok(Self::default());
        };
        match field {
            "sku" => Ok(StockSortField::Sku),
            "name" => Ok(StockSortField::Name),
            "location" => Ok(StockSortField::Location),
            "quantity" => Ok(StockSortField::Quantity),
            "createdAt" | "created_at" => Ok(StockSortField::CreatedAt),
            other => Err(DomainError::invalid(format!(
                "unknown inventory sort field: {other}"
            ))),
        }
    }

    /// Compares two items on this field, ascending. Ties fall through to the
    /// SKU key so that pagination is stable.
    pub fn compare(&self, a: &StockItem, b: &StockItem) -> Ordering {
        let primary = match self {
            StockSortField::Sku => Ordering::Equal,
            StockSortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            StockSortField::Location => a.location.to_lowercase().cmp(&b.location.to_lowercase()),
            StockSortField::Quantity => a.quantity.cmp(&b.quantity),
            StockSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        primary.then_with(|| a.sku.key().cmp(&b.sku.key()))
    }
}

fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::invalid(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(sku: &str, name: &str, quantity: u32) -> StockItem {
        NewStockItem::new(name, sku, "A1", quantity)
            .into_item()
            .unwrap()
    }

    #[test]
    fn new_item_requires_name_and_location() {
        assert!(NewStockItem::new(" ", "SKU1", "A1", 1).into_item().is_err());
        assert!(NewStockItem::new("Widget", "SKU1", "", 1).into_item().is_err());
    }

    #[test]
    fn update_applies_only_given_fields() {
        let original = item("SKU1", "Widget", 5);
        let updated = StockItemUpdate::new().location(" B2 ").apply(&original);

        assert_eq!(updated.location, "B2");
        assert_eq!(updated.name, "Widget");
        assert_eq!(updated.quantity, 5);
        assert_eq!(updated.sku, original.sku);
    }

    #[test]
    fn matches_searches_name_sku_and_location() {
        let widget = item("SKU-RED", "Blue Widget", 1);
        assert!(widget.matches("blue"));
        assert!(widget.matches("red"));
        assert!(widget.matches("a1"));
        assert!(!widget.matches("green"));
    }

    #[test]
    fn sort_field_parsing() {
        assert_eq!(StockSortField::parse(None).unwrap(), StockSortField::Sku);
        assert_eq!(
            StockSortField::parse(Some("quantity")).unwrap(),
            StockSortField::Quantity
        );
        assert!(StockSortField::parse(Some("price")).is_err());
    }

    #[test]
    fn ties_break_on_sku() {
        let a = item("a", "Same", 1);
        let b = item("B", "Same", 1);
        assert_eq!(StockSortField::Name.compare(&a, &b), Ordering::Less);
        assert_eq!(StockSortField::Quantity.compare(&b, &a), Ordering::Greater);
    }
}
