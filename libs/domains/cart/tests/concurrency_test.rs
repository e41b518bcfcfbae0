//! Concurrency tests for the reservation engine against PostgreSQL
//!
//! These exercise the real row locks and unique constraints:
//! - Concurrent reservations never oversell a product
//! - Concurrent first adds by one shopper merge into a single line
//! - Concurrent clears and adds keep stock conserved

use std::time::Duration;

use domain_cart::*;
use futures::future::join_all;
use rust_decimal_macros::dec;
use test_utils::assertions::assert_conserved;
use test_utils::{TestDataBuilder, TestDatabase};
use uuid::Uuid;

fn service(db: &TestDatabase) -> CartService<PgInventoryStore> {
    let config = ReservationConfig::new(Duration::from_secs(10), 5, Duration::from_millis(5));
    CartService::new(PgInventoryStore::new(db.connection()), config)
}

#[tokio::test]
async fn test_concurrent_adds_never_oversell() {
    let db = TestDatabase::new().await;
    let product_id = db.insert_product("Limited Print", "40.00", 10, true).await;
    let service = service(&db);

    let tasks = (0..25).map(|_| {
        let service = service.clone();
        tokio::spawn(async move { service.add_item(Uuid::now_v7(), product_id, 1).await })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let succeeded = results.iter().filter(|result| result.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|result| matches!(result, Err(CartError::InsufficientStock { .. })))
        .count();

    assert_eq!(succeeded, 10);
    assert_eq!(rejected, 15);
    assert_eq!(db.stock_of(product_id).await, 0);
    assert_conserved(
        db.stock_of(product_id).await,
        db.reserved_quantity(product_id).await,
        10,
        "after concurrent adds",
    );
}

#[tokio::test]
async fn test_concurrent_first_adds_merge_into_one_line() {
    let db = TestDatabase::new().await;
    let builder = TestDataBuilder::from_test_name("concurrent_first_adds");
    let product_id = db.insert_product("Mug", "9.00", 50, true).await;
    let service = service(&db);
    let user = builder.user_id();

    let tasks = (0..8).map(|_| {
        let service = service.clone();
        tokio::spawn(async move { service.add_item(user, product_id, 2).await })
    });
    for joined in join_all(tasks).await {
        joined.unwrap().unwrap();
    }

    assert_eq!(db.line_count(product_id).await, 1);
    assert_eq!(db.reserved_quantity(product_id).await, 16);
    assert_eq!(db.stock_of(product_id).await, 34);

    let cart = service.get_or_create_cart(user).await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 16);
}

#[tokio::test]
async fn test_concurrent_clears_and_adds_conserve_stock() {
    let db = TestDatabase::new().await;
    let a = db.insert_product("Pen", "1.50", 30, true).await;
    let b = db.insert_product("Ink", "6.00", 30, true).await;
    let service = service(&db);

    let users: Vec<Uuid> = (0..6).map(|_| Uuid::now_v7()).collect();
    for user in &users {
        service.add_item(*user, a, 3).await.unwrap();
        service.add_item(*user, b, 2).await.unwrap();
    }

    let tasks = users.iter().copied().enumerate().map(|(i, user)| {
        let service = service.clone();
        tokio::spawn(async move {
            if i % 2 == 0 {
                service.clear_cart(user).await.map(|_| ())
            } else {
                service.add_item(user, b, 1).await.map(|_| ())
            }
        })
    });
    for joined in join_all(tasks).await {
        joined.unwrap().unwrap();
    }

    for product in [a, b] {
        assert_conserved(
            db.stock_of(product).await,
            db.reserved_quantity(product).await,
            30,
            "after concurrent clears",
        );
    }
    assert_eq!(db.stock_of(a).await, 30 - 3 * 3);
    assert_eq!(db.stock_of(b).await, 30 - 3 * 3);
}

#[tokio::test]
async fn test_scenarios_against_postgres() {
    let db = TestDatabase::new().await;
    let product_id = db.insert_product("Blanket", "35.00", 10, true).await;
    let service = service(&db);
    let user = Uuid::now_v7();

    service.add_item(user, product_id, 4).await.unwrap();
    assert_eq!(db.stock_of(product_id).await, 6);

    let cart = service.add_item(user, product_id, 3).await.unwrap();
    assert_eq!(db.stock_of(product_id).await, 3);
    assert_eq!(cart.items[0].quantity, 7);
    let line = cart.items[0].id;

    let err = service.update_item_quantity(user, line, 11).await.unwrap_err();
    assert!(matches!(err, CartError::InsufficientStock { .. }));
    assert_eq!(db.stock_of(product_id).await, 3);

    service.update_item_quantity(user, line, 10).await.unwrap();
    assert_eq!(db.stock_of(product_id).await, 0);

    let cart = service.update_item_quantity(user, line, 0).await.unwrap();
    assert!(cart.items.is_empty());
    assert_eq!(db.stock_of(product_id).await, 10);
    assert_eq!(db.line_count(product_id).await, 0);
}

#[tokio::test]
async fn test_aggregates_against_postgres() {
    let db = TestDatabase::new().await;
    let a = db.insert_product("Notebook", "4.25", 20, true).await;
    let b = db.insert_product("Pencil", "0.80", 20, true).await;
    let service = service(&db);
    let user = Uuid::now_v7();

    let empty = service.total(user).await.unwrap();
    assert_eq!(empty.total_amount, dec!(0));

    service.add_item(user, a, 2).await.unwrap();
    service.add_item(user, b, 5).await.unwrap();

    let count = service.item_count(user).await.unwrap();
    assert_eq!(count.item_count, 2);
    assert_eq!(count.total_quantity, 7);

    let total = service.total(user).await.unwrap();
    assert_eq!(total.total_amount, dec!(12.50));

    let cart = service.get_or_create_cart(user).await.unwrap();
    assert_eq!(cart.total_amount, total.total_amount);
    assert_eq!(cart.item_count, count.item_count);
}
