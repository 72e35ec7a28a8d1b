//! Inventory endpoints over the stock ledger.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::Page;
use domain::{NewStockItem, StockItem, StockItemUpdate};
use record_store::RecordStore;
use serde::{Deserialize, Serialize};

use super::ListParams;
use crate::error::ApiError;
use crate::response::{self, ApiResponse};
use crate::state::AppState;

// -- Request types --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub name: String,
    pub sku: String,
    pub location: String,
    pub quantity: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub location: Option<String>,
    pub quantity: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RestockRequest {
    pub quantity: u32,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct SkuUniqueResponse {
    pub sku: String,
    pub unique: bool,
}

type Envelope<T> = Json<ApiResponse<T>>;

// -- Handlers --

/// GET /v1/inventory: list stock items.
#[tracing::instrument(skip(state, params))]
pub async fn list<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Envelope<Page<StockItem>>, ApiError> {
    let Query(params) = params?;
    let page = state.ledger.list(&params.into_query()?).await?;
    Ok(response::ok(page))
}

/// POST /v1/inventory: create a stock item.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Envelope<StockItem>), ApiError> {
    let Json(req) = payload?;
    let item = state
        .ledger
        .create_item(NewStockItem::new(req.name, req.sku, req.location, req.quantity))
        .await?;
    Ok(response::created(item))
}

/// GET /v1/inventory/{sku}: load a stock item.
#[tracing::instrument(skip(state))]
pub async fn get<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(sku): Path<String>,
) -> Result<Envelope<StockItem>, ApiError> {
    Ok(response::ok(state.ledger.get_by_sku(&sku).await?))
}

/// PUT /v1/inventory/{sku}: edit name, location or quantity.
#[tracing::instrument(skip(state, payload))]
pub async fn update<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(sku): Path<String>,
    payload: Result<Json<UpdateItemRequest>, JsonRejection>,
) -> Result<Envelope<StockItem>, ApiError> {
    let Json(req) = payload?;
    let update = StockItemUpdate {
        name: req.name,
        location: req.location,
        quantity: req.quantity,
    };
    Ok(response::ok(state.ledger.update_fields(&sku, update).await?))
}

/// DELETE /v1/inventory/{sku}: remove a stock item.
#[tracing::instrument(skip(state))]
pub async fn delete<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(sku): Path<String>,
) -> Result<Envelope<()>, ApiError> {
    state.ledger.delete(&sku).await?;
    Ok(response::empty())
}

/// GET /v1/inventory/{sku}/unique: whether the SKU is still free.
#[tracing::instrument(skip(state))]
pub async fn check_unique<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(sku): Path<String>,
) -> Result<Envelope<SkuUniqueResponse>, ApiError> {
    let unique = state.ledger.check_sku_unique(&sku).await?;
    Ok(response::ok(SkuUniqueResponse { sku, unique }))
}

/// POST /v1/inventory/{sku}/restock: add stock.
#[tracing::instrument(skip(state, payload))]
pub async fn restock<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(sku): Path<String>,
    payload: Result<Json<RestockRequest>, JsonRejection>,
) -> Result<Envelope<StockItem>, ApiError> {
    let Json(req) = payload?;
    Ok(response::ok(state.ledger.increment(&sku, req.quantity).await?))
}
