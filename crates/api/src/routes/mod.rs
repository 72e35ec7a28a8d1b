//! HTTP route handlers.

pub mod health;
pub mod inventory;
pub mod metrics;
pub mod orders;
pub mod reports;

use common::{ListQuery, SortDirection};
use serde::Deserialize;

use crate::error::ApiError;

/// Query parameters shared by the list endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub search: Option<String>,
}

impl ListParams {
    pub fn into_query(self) -> Result<ListQuery, ApiError> {
        let direction = match self.sort_order.as_deref() {
            None => SortDirection::default(),
            Some(order) => SortDirection::parse(order).ok_or_else(|| {
                ApiError::BadRequest(format!("sortOrder must be asc or desc, got {order}"))
            })?,
        };

        let mut query = ListQuery::new();
        if let Some(page) = self.page {
            query = query.page(page);
        }
        if let Some(size) = self.size {
            query = query.size(size);
        }
        if let Some(search) = self.search {
            query = query.search(search);
        }
        query.sort_by = self.sort_by;
        query.direction = direction;
        Ok(query)
    }
}
