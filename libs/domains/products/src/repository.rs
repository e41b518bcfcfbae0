use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ProductResult;
use crate::models::{CreateProduct, Product, ProductFilter, UpdateProduct};

/// Repository trait for Product persistence
///
/// Catalog writes only. Stock movements between products and carts go
/// through the cart domain's transactional store instead.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Create a new product
    async fn create(&self, input: CreateProduct) -> ProductResult<Product>;

    /// Get a product by ID
    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>>;

    /// List products matching a filter, newest first
    async fn list(&self, filter: ProductFilter) -> ProductResult<Vec<Product>>;

    /// Count products matching a filter (pagination ignored)
    async fn count(&self, filter: ProductFilter) -> ProductResult<u64>;

    /// Update name/price/visibility
    async fn update(&self, id: Uuid, input: UpdateProduct) -> ProductResult<Product>;

    /// Atomically add issued stock
    async fn restock(&self, id: Uuid, amount: i32) -> ProductResult<Product>;

    /// Delete a product by ID
    async fn delete(&self, id: Uuid) -> ProductResult<bool>;
}
