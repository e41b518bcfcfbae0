//! HTTP handlers for Cart API
//!
//! The shopper is identified by the `X-User-ID` header; requests without a
//! valid one get a fresh id, echoed back in the response header.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use axum_helpers::{
    UserId, UuidPath, ValidatedJson, ensure_user_id,
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, ConflictResponse,
        InternalServerErrorResponse, NotFoundResponse, ServiceUnavailableResponse,
        UnprocessableEntityResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::CartResult;
use crate::models::{AddCartItem, Cart, CartCount, CartLine, CartTotal, UpdateCartItem};
use crate::service::CartService;
use crate::store::InventoryStore;

/// OpenAPI documentation for Cart API
#[derive(OpenApi)]
#[openapi(
    paths(get_cart, add_item, update_item, remove_item, clear_cart, item_count, cart_total),
    components(
        schemas(Cart, CartLine, AddCartItem, UpdateCartItem, CartCount, CartTotal),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            ConflictResponse,
            UnprocessableEntityResponse,
            ServiceUnavailableResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Cart", description = "Shopping cart and stock reservation endpoints")
    )
)]
pub struct ApiDoc;

/// Create the cart router with all HTTP endpoints
pub fn router<S: InventoryStore>(service: CartService<S>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(get_cart).delete(clear_cart))
        .route("/items", post(add_item))
        .route("/items/{item_id}", put(update_item).delete(remove_item))
        .route("/count", get(item_count))
        .route("/total", get(cart_total))
        .with_state(shared_service)
        .layer(middleware::from_fn(ensure_user_id))
}

/// Get the shopper's cart, creating it on first access
#[utoipa::path(
    get,
    path = "",
    tag = "Cart",
    params(
        ("X-User-ID" = Option<Uuid>, Header, description = "Shopper id; issued when absent")
    ),
    responses(
        (status = 200, description = "Current cart", body = Cart),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_cart<S: InventoryStore>(
    State(service): State<Arc<CartService<S>>>,
    user: UserId,
) -> CartResult<Json<Cart>> {
    let cart = service.get_or_create_cart(user.id).await?;
    Ok(Json(cart))
}

/// Reserve units of a product in the cart
#[utoipa::path(
    post,
    path = "/items",
    tag = "Cart",
    params(
        ("X-User-ID" = Option<Uuid>, Header, description = "Shopper id; issued when absent")
    ),
    request_body = AddCartItem,
    responses(
        (status = 201, description = "Item added", body = Cart),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 422, response = UnprocessableEntityResponse),
        (status = 503, response = ServiceUnavailableResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn add_item<S: InventoryStore>(
    State(service): State<Arc<CartService<S>>>,
    user: UserId,
    ValidatedJson(input): ValidatedJson<AddCartItem>,
) -> CartResult<impl IntoResponse> {
    let cart = service
        .add_item(user.id, input.product_id, input.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(cart)))
}

/// Change a line's quantity; 0 removes the line
#[utoipa::path(
    put,
    path = "/items/{item_id}",
    tag = "Cart",
    params(
        ("item_id" = Uuid, Path, description = "Cart line ID"),
        ("X-User-ID" = Option<Uuid>, Header, description = "Shopper id; issued when absent")
    ),
    request_body = UpdateCartItem,
    responses(
        (status = 200, description = "Line updated", body = Cart),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 503, response = ServiceUnavailableResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_item<S: InventoryStore>(
    State(service): State<Arc<CartService<S>>>,
    user: UserId,
    UuidPath(item_id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateCartItem>,
) -> CartResult<Json<Cart>> {
    let cart = service
        .update_item_quantity(user.id, item_id, input.quantity)
        .await?;
    Ok(Json(cart))
}

/// Remove a line and release its stock
#[utoipa::path(
    delete,
    path = "/items/{item_id}",
    tag = "Cart",
    params(
        ("item_id" = Uuid, Path, description = "Cart line ID"),
        ("X-User-ID" = Option<Uuid>, Header, description = "Shopper id; issued when absent")
    ),
    responses(
        (status = 200, description = "Line removed", body = Cart),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 503, response = ServiceUnavailableResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn remove_item<S: InventoryStore>(
    State(service): State<Arc<CartService<S>>>,
    user: UserId,
    UuidPath(item_id): UuidPath,
) -> CartResult<Json<Cart>> {
    let cart = service.remove_item(user.id, item_id).await?;
    Ok(Json(cart))
}

/// Empty the cart and release all reserved stock
#[utoipa::path(
    delete,
    path = "",
    tag = "Cart",
    params(
        ("X-User-ID" = Option<Uuid>, Header, description = "Shopper id; issued when absent")
    ),
    responses(
        (status = 200, description = "Cart cleared", body = Cart),
        (status = 503, response = ServiceUnavailableResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn clear_cart<S: InventoryStore>(
    State(service): State<Arc<CartService<S>>>,
    user: UserId,
) -> CartResult<Json<Cart>> {
    let cart = service.clear_cart(user.id).await?;
    Ok(Json(cart))
}

/// Number of lines and units in the cart
#[utoipa::path(
    get,
    path = "/count",
    tag = "Cart",
    params(
        ("X-User-ID" = Option<Uuid>, Header, description = "Shopper id; issued when absent")
    ),
    responses(
        (status = 200, description = "Cart counts", body = CartCount),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn item_count<S: InventoryStore>(
    State(service): State<Arc<CartService<S>>>,
    user: UserId,
) -> CartResult<Json<CartCount>> {
    let count = service.item_count(user.id).await?;
    Ok(Json(count))
}

/// Sum of line totals
#[utoipa::path(
    get,
    path = "/total",
    tag = "Cart",
    params(
        ("X-User-ID" = Option<Uuid>, Header, description = "Shopper id; issued when absent")
    ),
    responses(
        (status = 200, description = "Cart total", body = CartTotal),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn cart_total<S: InventoryStore>(
    State(service): State<Arc<CartService<S>>>,
    user: UserId,
) -> CartResult<Json<CartTotal>> {
    let total = service.total(user.id).await?;
    Ok(Json(total))
}
