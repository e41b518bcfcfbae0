//! Products Domain
//!
//! The product catalog: CRUD, visibility and restocking. Stock stored here is
//! the quantity *not* reserved by any cart; reservations are moved in and
//! out by the cart domain inside its own transactions.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Validation, catalog rules
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + PostgreSQL implementation)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_products::{handlers, PgProductRepository, ProductService};
//! use sea_orm::Database;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("postgres://localhost/storefront").await?;
//!
//! let repository = PgProductRepository::new(db);
//! let service = ProductService::new(repository);
//!
//! let router = handlers::router(service);
//! # Ok(())
//! # }
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{ProductError, ProductResult};
pub use handlers::ApiDoc;
pub use models::{
    CreateProduct, Product, ProductFilter, ProductPage, Restock, SetVisibility, UpdateProduct,
    VisibleQuery,
};
pub use postgres::PgProductRepository;
pub use repository::ProductRepository;
pub use service::ProductService;
