// src/error.rs
use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;

use crate::fulfillment::FulfillmentError;

#[derive(Debug)]
pub enum AppError {
    DatabaseError(sqlx::Error),
    Unauthorized(String),
    NotFound(String),
    ValidationError(String),
    Conflict(String),
    EmptyCart,
    FulfillmentRejected(serde_json::Value),
    Upstream(String),
    Internal(String),
}

impl AppError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::Unauthorized(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        AppError::Upstream(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    pub fn db(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Database error occurred" }),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Internal server error" }),
            ),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!({ "error": msg })),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            AppError::EmptyCart => (StatusCode::BAD_REQUEST, json!({ "error": "Cart is empty" })),
            AppError::FulfillmentRejected(details) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Order placement failed", "details": details }),
            ),
            AppError::Upstream(details) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to place order", "details": details }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err)
    }
}

impl From<FulfillmentError> for AppError {
    fn from(err: FulfillmentError) -> Self {
        AppError::Upstream(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn error_variants_map_to_expected_status_codes() {
        assert_eq!(status_of(AppError::validation("bad quantity")), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(AppError::not_found("no product")), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AppError::conflict("duplicate sku")), StatusCode::CONFLICT);
        assert_eq!(status_of(AppError::unauthorized("bad creds")), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AppError::EmptyCart), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(AppError::FulfillmentRejected(json!({ "message": "declined" }))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(AppError::upstream("timeout")), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status_of(AppError::internal("boom")), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
