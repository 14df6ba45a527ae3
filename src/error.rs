use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Product unavailable: {0}")]
    ProductUnavailable(String),

    #[error("Insufficient stock for {0}")]
    InsufficientStock(String),

    #[error("Order not found")]
    OrderNotFound,

    #[error("Order is not awaiting payment (status: {0})")]
    InvalidOrderState(String),

    #[error("Paid amount {got} does not match order total {expected}")]
    AmountMismatch { expected: i64, got: i64 },

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True for payment-confirmation integrity failures. These are logged
    /// server-side with full detail but answered with a generic body.
    pub fn is_payment_integrity_failure(&self) -> bool {
        matches!(
            self,
            AppError::InvalidOrderState(_) | AppError::AmountMismatch { .. }
        )
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound | AppError::OrderNotFound => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            AppError::BadRequest(_)
            | AppError::EmptyCart
            | AppError::ProductUnavailable(_)
            | AppError::InsufficientStock(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            // Detail stays in the server-side logs; clients get a flat
            // verification failure either way.
            AppError::InvalidOrderState(_) | AppError::AmountMismatch { .. } => (
                StatusCode::CONFLICT,
                "Payment verification failed".to_string(),
            ),
            AppError::Gateway(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            AppError::DbError(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AppError::OrmError(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = ApiResponse {
            message: message.clone(),
            data: Some(ErrorData { error: message }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
