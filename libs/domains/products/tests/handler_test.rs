//! Handler tests for Products domain
//!
//! These tests drive the products router against a real Postgres container:
//! - Request deserialization and validation
//! - Response serialization (decimal prices, pages)
//! - HTTP status codes and error codes

use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain_products::*;
use http_body_util::BodyExt;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use test_utils::{TestDataBuilder, TestDatabase};
use tower::ServiceExt; // For oneshot()

async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn app(db: &TestDatabase) -> axum::Router {
    let repo = PgProductRepository::new(db.connection());
    handlers::router(ProductService::new(repo))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_create_product_handler_returns_201() {
    let db = TestDatabase::new().await;
    let builder = TestDataBuilder::from_test_name("handler_create_201");

    let response = app(&db)
        .oneshot(json_request(
            "POST",
            "/",
            json!({
                "name": builder.name("product", "lamp"),
                "price": "49.90",
                "stock": 12
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    let product: Product = json_body(response.into_body()).await;
    assert_eq!(product.name, builder.name("product", "lamp"));
    assert_eq!(product.price, dec!(49.90));
    assert_eq!(product.stock, 12);
    assert!(product.visible);
    assert_eq!(db.stock_of(product.id).await, 12);
}

#[tokio::test]
async fn test_create_product_handler_validates_input() {
    let db = TestDatabase::new().await;

    let response = app(&db)
        .oneshot(json_request(
            "POST",
            "/",
            json!({ "name": "", "price": "0.00", "stock": -1 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_get_missing_product_returns_product_not_found() {
    let db = TestDatabase::new().await;
    let id = uuid::Uuid::now_v7();

    let response = app(&db).oneshot(get(&format!("/{}", id))).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["code"], 2001);
    assert_eq!(body["error"], "PRODUCT_NOT_FOUND");
}

#[tokio::test]
async fn test_get_product_with_malformed_id() {
    let db = TestDatabase::new().await;

    let response = app(&db).oneshot(get("/not-a-uuid")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_products_filters_and_paginates() {
    let db = TestDatabase::new().await;
    db.insert_product("Oak Chair", "80.00", 4, true).await;
    db.insert_product("Oak Table", "320.00", 2, true).await;
    db.insert_product("Pine Shelf", "45.00", 9, true).await;
    db.insert_product("Oak Stool", "30.00", 3, false).await;

    let response = app(&db)
        .oneshot(get("/?name=oak&visible=true&min_price=50&limit=1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let page: ProductPage = json_body(response.into_body()).await;
    assert_eq!(page.total, 2);
    assert_eq!(page.limit, 1);
    assert_eq!(page.items.len(), 1);
    assert!(page.items[0].name.starts_with("Oak"));
}

#[tokio::test]
async fn test_list_products_rejects_oversized_limit() {
    let db = TestDatabase::new().await;

    let response = app(&db).oneshot(get("/?limit=500")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_visible_listing_hides_invisible_products() {
    let db = TestDatabase::new().await;
    db.insert_product("Shown", "5.00", 1, true).await;
    db.insert_product("Hidden", "5.00", 1, false).await;

    let response = app(&db).oneshot(get("/visible")).await.unwrap();
    let page: ProductPage = json_body(response.into_body()).await;

    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].name, "Shown");
}

#[tokio::test]
async fn test_update_product_does_not_change_stock() {
    let db = TestDatabase::new().await;
    let id = db.insert_product("Kettle", "25.00", 6, true).await;

    let response = app(&db)
        .oneshot(json_request(
            "PUT",
            &format!("/{}", id),
            json!({ "name": "Electric Kettle", "price": "27.50" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let product: Product = json_body(response.into_body()).await;
    assert_eq!(product.name, "Electric Kettle");
    assert_eq!(product.price, dec!(27.50));
    assert_eq!(product.stock, 6);
}

#[tokio::test]
async fn test_set_visibility() {
    let db = TestDatabase::new().await;
    let id = db.insert_product("Poster", "12.00", 3, true).await;

    let response = app(&db)
        .oneshot(json_request(
            "PATCH",
            &format!("/{}/visibility", id),
            json!({ "visible": false }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let product: Product = json_body(response.into_body()).await;
    assert!(!product.visible);
}

#[tokio::test]
async fn test_restock_adds_to_stock() {
    let db = TestDatabase::new().await;
    let id = db.insert_product("Candle", "8.00", 2, true).await;

    let response = app(&db)
        .oneshot(json_request(
            "POST",
            &format!("/{}/restock", id),
            json!({ "amount": 5 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(db.stock_of(id).await, 7);

    let rejected = app(&db)
        .oneshot(json_request(
            "POST",
            &format!("/{}/restock", id),
            json!({ "amount": 0 }),
        ))
        .await
        .unwrap();

    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
    assert_eq!(db.stock_of(id).await, 7);
}

#[tokio::test]
async fn test_delete_product() {
    let db = TestDatabase::new().await;
    let id = db.insert_product("Vase", "19.00", 1, true).await;

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/{}", id))
        .body(Body::empty())
        .unwrap();
    let response = app(&db).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let again = Request::builder()
        .method("DELETE")
        .uri(format!("/{}", id))
        .body(Body::empty())
        .unwrap();
    let response = app(&db).oneshot(again).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
