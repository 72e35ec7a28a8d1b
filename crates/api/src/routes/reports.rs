//! Report endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::{InventoryReport, MonthlySales};
use record_store::RecordStore;

use crate::error::ApiError;
use crate::response::{self, ApiResponse};
use crate::state::AppState;

/// GET /v1/reports/inventory: stock levels and low-stock items.
#[tracing::instrument(skip(state))]
pub async fn inventory<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<ApiResponse<InventoryReport>>, ApiError> {
    Ok(response::ok(state.reports.inventory_report().await?))
}

/// GET /v1/reports/sales: order volume per month, newest first.
#[tracing::instrument(skip(state))]
pub async fn sales<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<ApiResponse<Vec<MonthlySales>>>, ApiError> {
    Ok(response::ok(state.reports.sales_report().await?))
}
