//! Order endpoints: fulfillment plus order store passthroughs.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{Page, RecordId};
use domain::{Order, OrderStatus, OrderUpdate};
use fulfillment::FulfillmentRequest;
use record_store::RecordStore;
use serde::Deserialize;

use super::ListParams;
use crate::error::ApiError;
use crate::response::{self, ApiResponse};
use crate::state::AppState;

// -- Request types --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub order_number: Option<String>,
    pub customer_name: Option<String>,
    pub status: Option<String>,
}

impl UpdateOrderRequest {
    fn into_update(self) -> Result<OrderUpdate, ApiError> {
        let status = self
            .status
            .as_deref()
            .map(OrderStatus::parse)
            .transpose()?;
        Ok(OrderUpdate {
            order_number: self.order_number,
            customer_name: self.customer_name,
            status,
        })
    }
}

type Envelope<T> = Json<ApiResponse<T>>;

// -- Handlers --

/// POST /v1/orders: fulfill an order: take stock for every line and record it.
#[tracing::instrument(skip(state, payload))]
pub async fn fulfill<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<FulfillmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Envelope<Order>), ApiError> {
    let Json(req) = payload?;
    let order = state.coordinator.fulfill_order(req).await?;
    Ok(response::created(order))
}

/// GET /v1/orders: list orders.
#[tracing::instrument(skip(state, params))]
pub async fn list<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Envelope<Page<Order>>, ApiError> {
    let Query(params) = params?;
    let page = state.orders.list(&params.into_query()?).await?;
    Ok(response::ok(page))
}

/// GET /v1/orders/{id}: load an order.
#[tracing::instrument(skip(state))]
pub async fn get<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Envelope<Order>, ApiError> {
    let id = parse_order_id(&id)?;
    Ok(response::ok(state.orders.get(id).await?))
}

/// PUT /v1/orders/{id}: edit order number, customer name or status.
#[tracing::instrument(skip(state, payload))]
pub async fn update<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateOrderRequest>, JsonRejection>,
) -> Result<Envelope<Order>, ApiError> {
    let id = parse_order_id(&id)?;
    let Json(req) = payload?;
    let order = state.orders.update(id, req.into_update()?).await?;
    Ok(response::ok(order))
}

/// DELETE /v1/orders/{id}: remove an order without restoring its stock.
#[tracing::instrument(skip(state))]
pub async fn delete<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Envelope<()>, ApiError> {
    let id = parse_order_id(&id)?;
    state.orders.delete(id).await?;
    Ok(response::empty())
}

fn parse_order_id(id: &str) -> Result<RecordId, ApiError> {
    RecordId::parse(id).map_err(|e| ApiError::BadRequest(format!("Invalid order id {id}: {e}")))
}
