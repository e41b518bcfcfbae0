//! Reusable OpenAPI response types for consistent API documentation.

use super::ErrorResponse;
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToResponse;

#[derive(ToResponse)]
#[response(
    description = "Internal Server Error",
    content_type = "application/json",
    example = json!({
        "code": 5000,
        "error": "INTERNAL_ERROR",
        "message": "An internal server error occurred"
    })
)]
pub struct InternalServerErrorResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Bad Request - Validation Error",
    content_type = "application/json",
    example = json!({
        "code": 1001,
        "error": "VALIDATION_ERROR",
        "message": "Request validation failed",
        "details": {
            "quantity": [{
                "code": "range",
                "message": null,
                "params": {"min": 1, "value": 0}
            }]
        }
    })
)]
pub struct BadRequestValidationResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Bad Request - Invalid UUID",
    content_type = "application/json",
    example = json!({
        "code": 1002,
        "error": "INVALID_UUID",
        "message": "Invalid UUID: not-a-uuid"
    })
)]
pub struct BadRequestUuidResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Resource not found",
    content_type = "application/json",
    example = json!({
        "code": 2001,
        "error": "PRODUCT_NOT_FOUND",
        "message": "Product not found: 01970a3c-1a2b-7000-8000-000000000001"
    })
)]
pub struct NotFoundResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Conflict - not enough stock for the requested reservation",
    content_type = "application/json",
    example = json!({
        "code": 3001,
        "error": "INVENTORY_INSUFFICIENT",
        "message": "Insufficient stock for product 01970a3c-1a2b-7000-8000-000000000001: requested 8, available 7"
    })
)]
pub struct ConflictResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Unprocessable - product cannot be purchased",
    content_type = "application/json",
    example = json!({
        "code": 2005,
        "error": "PRODUCT_INVISIBLE",
        "message": "Product is not available for purchase: 01970a3c-1a2b-7004-8000-000000000005"
    })
)]
pub struct UnprocessableEntityResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Service Unavailable",
    content_type = "application/json",
    example = json!({
        "code": 5002,
        "error": "TRANSACTION_TIMEOUT",
        "message": "The operation timed out, please retry"
    })
)]
pub struct ServiceUnavailableResponse(pub ErrorResponse);
