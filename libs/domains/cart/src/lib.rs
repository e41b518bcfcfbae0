//! Cart Domain
//!
//! Shopping carts and the inventory reservation engine behind them. Adding a
//! product to a cart moves units out of the product's `stock` into the cart
//! line; removing, shrinking or clearing moves them back. Each operation is
//! one all-or-nothing unit of work, so for every product
//!
//! ```text
//! stock + Σ line.quantity (all carts) == issued stock
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │   Handlers   │  ← HTTP endpoints, X-User-ID identity
//! └──────┬───────┘
//!        │
//! ┌──────▼───────┐
//! │ CartService  │  ← Reservation rules, retries, timeout
//! └──────┬───────┘
//!        │ begin() / commit()
//! ┌──────▼───────┐
//! │InventoryStore│  ← Unit of work over products + carts
//! └──────────────┘     (PostgreSQL, in-memory)
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_cart::{handlers, CartService, PgInventoryStore, ReservationConfig};
//! use sea_orm::Database;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("postgres://localhost/storefront").await?;
//!
//! let service = CartService::new(PgInventoryStore::new(db), ReservationConfig::default());
//!
//! let router = handlers::router(service);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod restore;
pub mod service;
pub mod store;

pub use config::ReservationConfig;
pub use error::{CartError, CartResult};
pub use handlers::ApiDoc;
pub use memory::InMemoryInventoryStore;
pub use models::{AddCartItem, Cart, CartCount, CartLine, CartTotal, UpdateCartItem};
pub use postgres::PgInventoryStore;
pub use service::CartService;
pub use store::{CartStore, InventoryStore, InventoryTx, ProductStore};
