use std::time::Duration;

use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, ErrorCode};
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CartError {
    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("Product {0} is not available for purchase")]
    ProductInvisible(Uuid),

    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: Uuid,
        requested: i64,
        available: i64,
    },

    #[error("Cart item not found: {0}")]
    CartItemNotFound(Uuid),

    #[error("Invalid input: {0}")]
    Validation(String),

    /// Lost a race with a concurrent writer; the unit of work may be retried
    #[error("Concurrent update conflict: {0}")]
    Conflict(String),

    #[error("Transaction did not complete within {0:?}")]
    Timeout(Duration),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CartResult<T> = Result<T, CartError>;

impl CartError {
    /// Whether a fresh unit of work may succeed where this one failed
    pub fn is_retryable(&self) -> bool {
        matches!(self, CartError::Conflict(_))
    }

    /// Caller-correctable rejections, as opposed to system failures
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            CartError::ProductNotFound(_)
                | CartError::ProductInvisible(_)
                | CartError::InsufficientStock { .. }
                | CartError::CartItemNotFound(_)
                | CartError::Validation(_)
        )
    }
}

impl From<DbErr> for CartError {
    fn from(err: DbErr) -> Self {
        if database::postgres::is_transient(&err) {
            CartError::Conflict(err.to_string())
        } else {
            CartError::Database(err.to_string())
        }
    }
}

/// Convert CartError to AppError for standardized error responses
impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        let message = err.to_string();
        match err {
            CartError::ProductNotFound(_) => AppError::domain(ErrorCode::ProductNotFound, message),
            CartError::ProductInvisible(_) => {
                AppError::domain(ErrorCode::ProductInvisible, message)
            }
            CartError::InsufficientStock { .. } => {
                AppError::domain(ErrorCode::InsufficientStock, message)
            }
            CartError::CartItemNotFound(_) => {
                AppError::domain(ErrorCode::CartItemNotFound, message)
            }
            CartError::Validation(msg) => AppError::BadRequest(msg),
            CartError::Conflict(_) => AppError::domain(ErrorCode::TransactionConflict, message),
            CartError::Timeout(_) => AppError::domain(ErrorCode::TransactionTimeout, message),
            CartError::Database(_) => AppError::domain(ErrorCode::DatabaseError, message),
            CartError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for CartError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
