//! API routes module

pub mod cart;
pub mod health;
pub mod products;

use axum::Router;

use crate::state::AppState;

/// Create all API routes, mounted under `/api`
pub fn routes(state: &AppState) -> Router {
    Router::new()
        .nest("/products", products::router(state))
        .nest("/cart", cart::router(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Environment};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use core_config::{app_info, server::ServerConfig};
    use database::postgres::PostgresConfig;
    use domain_cart::ReservationConfig;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use test_utils::TestDatabase;
    use tower::ServiceExt;

    fn state(db: &TestDatabase) -> AppState {
        AppState {
            config: Config {
                app: app_info!(),
                environment: Environment::Development,
                server: ServerConfig::new("127.0.0.1", 0),
                database: PostgresConfig::new(db.connection_string.clone()),
                reservation: ReservationConfig::default(),
            },
            db: db.connection(),
        }
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_cart_reserves_catalog_stock() {
        let db = TestDatabase::new().await;
        let product_id = db.insert_product("Lantern", "22.00", 3, true).await;
        let app = routes(&state(&db));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/cart/items")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({ "product_id": product_id, "quantity": 2 }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.headers().contains_key("x-user-id"));

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/products/{}", product_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let product = json_body(response).await;
        assert_eq!(product["stock"], 1);
    }

    #[tokio::test]
    async fn test_ready_reports_database() {
        let db = TestDatabase::new().await;

        let response = health::router(state(&db))
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["database"], "connected");
        assert_eq!(body["status"], "ready");
    }
}
