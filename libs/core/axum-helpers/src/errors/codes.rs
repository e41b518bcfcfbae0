//! Type-safe error codes for API responses.
//!
//! Each code carries:
//! - a string identifier for clients (e.g. "INVENTORY_INSUFFICIENT")
//! - an integer code for logs and dashboards (e.g. 3001)
//! - the HTTP status it is served with
//! - a default human-readable message
//!
//! # Example
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! let code = ErrorCode::InsufficientStock;
//! assert_eq!(code.as_str(), "INVENTORY_INSUFFICIENT");
//! assert_eq!(code.code(), 3001);
//! ```

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standardized error codes for API responses.
///
/// Ranges:
/// - 1000-1999: request errors
/// - 2000-2999: catalog errors
/// - 3000-3999: inventory errors
/// - 4000-4999: cart errors
/// - 5000-5999: system errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request validation failed
    ValidationError,
    /// Invalid UUID format in path or query parameter
    InvalidUuid,
    /// JSON extraction from request body failed
    JsonExtraction,
    /// Requested resource was not found
    NotFound,
    /// Request conflicts with current resource state
    Conflict,

    /// Product id has no record
    ProductNotFound,
    /// Product exists but cannot be added to a cart
    ProductInvisible,

    /// Requested reservation exceeds available stock
    #[serde(rename = "INVENTORY_INSUFFICIENT")]
    InsufficientStock,

    /// Cart line does not exist or belongs to another cart
    CartItemNotFound,

    /// An unexpected internal server error occurred
    InternalError,
    /// Persistence layer failure
    DatabaseError,
    /// Unit of work did not commit in time and was rolled back
    TransactionTimeout,
    /// Unit of work kept conflicting with concurrent writers
    TransactionConflict,
    /// Service is temporarily unavailable
    ServiceUnavailable,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidUuid => "INVALID_UUID",
            Self::JsonExtraction => "JSON_EXTRACTION",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::ProductNotFound => "PRODUCT_NOT_FOUND",
            Self::ProductInvisible => "PRODUCT_INVISIBLE",
            Self::InsufficientStock => "INVENTORY_INSUFFICIENT",
            Self::CartItemNotFound => "CART_ITEM_NOT_FOUND",
            Self::InternalError => "INTERNAL_ERROR",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::TransactionTimeout => "TRANSACTION_TIMEOUT",
            Self::TransactionConflict => "TRANSACTION_CONFLICT",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }

    /// Integer code used in structured logs (`error_code` field).
    pub fn code(&self) -> i32 {
        match self {
            Self::ValidationError => 1001,
            Self::InvalidUuid => 1002,
            Self::JsonExtraction => 1003,
            Self::NotFound => 1004,
            Self::Conflict => 1008,

            Self::ProductNotFound => 2001,
            Self::ProductInvisible => 2005,

            Self::InsufficientStock => 3001,

            Self::CartItemNotFound => 4002,

            Self::InternalError => 5000,
            Self::DatabaseError => 5001,
            Self::TransactionTimeout => 5002,
            Self::TransactionConflict => 5003,
            Self::ServiceUnavailable => 5030,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::ValidationError | Self::InvalidUuid | Self::JsonExtraction => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound | Self::ProductNotFound | Self::CartItemNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::Conflict | Self::InsufficientStock => StatusCode::CONFLICT,
            Self::ProductInvisible => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InternalError | Self::DatabaseError | Self::TransactionConflict => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::TransactionTimeout | Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            Self::ValidationError => "Request validation failed",
            Self::InvalidUuid => "Invalid UUID format",
            Self::JsonExtraction => "Failed to parse request body",
            Self::NotFound => "Resource not found",
            Self::Conflict => "Resource state conflict",
            Self::ProductNotFound => "Product not found",
            Self::ProductInvisible => "Product is not available for purchase",
            Self::InsufficientStock => "Insufficient stock",
            Self::CartItemNotFound => "Cart item not found",
            Self::InternalError => "An internal server error occurred",
            Self::DatabaseError => "Database error occurred",
            Self::TransactionTimeout => "The operation timed out, please retry",
            Self::TransactionConflict => "The operation conflicted with concurrent updates, please retry",
            Self::ServiceUnavailable => "Service is temporarily unavailable",
        }
    }

    /// Server-side failures are logged at `error` level and never echo internals.
    pub fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
