//! API error types with HTTP response mapping.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use fulfillment::FulfillmentError;

use crate::response::ApiResponse;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request that never reached the domain.
    BadRequest(String),
    /// Stock ledger, order store or report error.
    Domain(DomainError),
    /// Fulfillment error.
    Fulfillment(FulfillmentError),
}

impl ApiError {
    /// Stable machine-readable code carried in the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "INVALID_REQUEST",
            ApiError::Domain(err) => err.code(),
            ApiError::Fulfillment(err) => err.code(),
        }
    }

    pub fn status(&self) -> StatusCode {
        status_for_code(self.code())
    }
}

/// Maps an error code to its HTTP status.
pub fn status_for_code(code: &str) -> StatusCode {
    match code {
        "NOT_FOUND" | "ITEM_NOT_FOUND" | "ORDER_NOT_FOUND" => StatusCode::NOT_FOUND,
        "SKU_ALREADY_EXISTS" | "INSUFFICIENT_STOCK" | "CONTENTION" => StatusCode::CONFLICT,
        "INVALID_REQUEST" => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg) => f.write_str(msg),
            ApiError::Domain(err) => write!(f, "{err}"),
            ApiError::Fulfillment(err) => write!(f, "{err}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(code, error = %message, "request failed");
        } else {
            tracing::debug!(code, error = %message, "request rejected");
        }

        (status, axum::Json(ApiResponse::<()>::failure(code, message))).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        ApiError::Fulfillment(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
