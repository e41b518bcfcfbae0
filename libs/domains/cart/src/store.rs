//! Persistence contract consumed by the reservation engine.
//!
//! Every engine operation runs against one [`InventoryTx`]: a unit of work
//! that sees and writes both products and carts. Nothing written through a
//! transaction is visible to others until [`InventoryTx::commit`]; dropping
//! it without committing discards every write.
//!
//! Product reads inside a transaction lock the rows they return until the
//! transaction ends, so two reservations against the same product are
//! serialized. [`ProductStore::find_by_ids`] locks in ascending id order.
//!
//! Cart lookups lock the cart row as well. Operations always take the cart
//! lock before any product lock, which keeps a user's own concurrent
//! requests from reading lines another of their requests is about to change.

use async_trait::async_trait;
use domain_products::Product;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::CartResult;
use crate::models::{CartLine, CartRecord};

#[async_trait]
pub trait ProductStore: Send {
    /// Load and lock one product
    async fn find(&mut self, id: Uuid) -> CartResult<Option<Product>>;

    /// Load and lock several products, ordered by id. Unknown ids are skipped.
    async fn find_by_ids(&mut self, ids: &[Uuid]) -> CartResult<Vec<Product>>;

    /// Persist the product's stock
    async fn save(&mut self, product: &Product) -> CartResult<()>;

    /// Persist the stock of several products in one round trip
    async fn batch_save(&mut self, products: &[Product]) -> CartResult<()>;
}

#[async_trait]
pub trait CartStore: Send {
    /// Load and lock the user's cart
    async fn find_by_user(&mut self, user_id: Uuid) -> CartResult<Option<CartRecord>>;

    /// Insert-if-absent on `user_id`; returns whichever cart won, locked
    async fn create_cart(&mut self, user_id: Uuid) -> CartResult<CartRecord>;

    /// Lines in creation order
    async fn list_lines(&mut self, cart_id: Uuid) -> CartResult<Vec<CartLine>>;

    async fn find_line(&mut self, id: Uuid) -> CartResult<Option<CartLine>>;

    async fn find_line_by_cart_and_product(
        &mut self,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> CartResult<Option<CartLine>>;

    /// Fails with a retryable conflict if the cart already has a line for the product
    async fn insert_line(&mut self, line: &CartLine) -> CartResult<()>;

    async fn update_line(&mut self, line: &CartLine) -> CartResult<()>;

    async fn delete_line(&mut self, id: Uuid) -> CartResult<()>;

    /// Returns the number of deleted lines
    async fn delete_lines_by_cart(&mut self, cart_id: Uuid) -> CartResult<u64>;

    async fn count_lines(&mut self, cart_id: Uuid) -> CartResult<u64>;

    async fn sum_line_totals(&mut self, cart_id: Uuid) -> CartResult<Decimal>;

    async fn sum_quantities(&mut self, cart_id: Uuid) -> CartResult<i64>;
}

/// One all-or-nothing unit of work over products and carts
#[async_trait]
pub trait InventoryTx: ProductStore + CartStore + Send {
    async fn commit(self) -> CartResult<()>;
}

/// Source of units of work
#[async_trait]
pub trait InventoryStore: Send + Sync + 'static {
    type Tx: InventoryTx + 'static;

    async fn begin(&self) -> CartResult<Self::Tx>;
}
