//! In-memory [`InventoryStore`] for tests and local experiments.
//!
//! A transaction holds the store-wide lock for its whole lifetime and writes
//! to a private copy of the tables, which replaces the shared state on
//! commit. This serializes all transactions, so it says nothing about
//! per-product concurrency; the Postgres store is the real thing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain_products::Product;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::error::{CartError, CartResult};
use crate::models::{CartLine, CartRecord};
use crate::store::{CartStore, InventoryStore, InventoryTx, ProductStore};

#[derive(Debug, Clone, Default)]
struct Tables {
    products: HashMap<Uuid, Product>,
    carts: HashMap<Uuid, CartRecord>,
    lines: HashMap<Uuid, CartLine>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a product outside any transaction
    pub async fn insert_product(&self, product: Product) {
        self.tables.lock().await.products.insert(product.id, product);
    }

    pub async fn remove_product(&self, id: Uuid) -> Option<Product> {
        self.tables.lock().await.products.remove(&id)
    }

    /// Committed state of a product
    pub async fn product(&self, id: Uuid) -> Option<Product> {
        self.tables.lock().await.products.get(&id).cloned()
    }

    /// Committed lines across all carts
    pub async fn lines(&self) -> Vec<CartLine> {
        self.tables.lock().await.lines.values().cloned().collect()
    }

    /// Committed reserved quantity of a product across all carts
    pub async fn reserved(&self, product_id: Uuid) -> i64 {
        self.tables
            .lock()
            .await
            .lines
            .values()
            .filter(|line| line.product_id == product_id)
            .map(|line| i64::from(line.quantity))
            .sum()
    }
}

pub struct InMemoryTx {
    committed: OwnedMutexGuard<Tables>,
    staged: Tables,
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    type Tx = InMemoryTx;

    async fn begin(&self) -> CartResult<InMemoryTx> {
        let committed = Arc::clone(&self.tables).lock_owned().await;
        let staged = committed.clone();
        Ok(InMemoryTx { committed, staged })
    }
}

#[async_trait]
impl InventoryTx for InMemoryTx {
    async fn commit(mut self) -> CartResult<()> {
        *self.committed = std::mem::take(&mut self.staged);
        Ok(())
    }
}

#[async_trait]
impl ProductStore for InMemoryTx {
    async fn find(&mut self, id: Uuid) -> CartResult<Option<Product>> {
        Ok(self.staged.products.get(&id).cloned())
    }

    async fn find_by_ids(&mut self, ids: &[Uuid]) -> CartResult<Vec<Product>> {
        let mut products: Vec<Product> = ids
            .iter()
            .filter_map(|id| self.staged.products.get(id).cloned())
            .collect();
        products.sort_by_key(|product| product.id);
        products.dedup_by_key(|product| product.id);
        Ok(products)
    }

    async fn save(&mut self, product: &Product) -> CartResult<()> {
        let stored = self
            .staged
            .products
            .get_mut(&product.id)
            .ok_or(CartError::ProductNotFound(product.id))?;
        stored.stock = product.stock;
        stored.updated_at = product.updated_at;
        Ok(())
    }

    async fn batch_save(&mut self, products: &[Product]) -> CartResult<()> {
        for product in products {
            self.save(product).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl CartStore for InMemoryTx {
    async fn find_by_user(&mut self, user_id: Uuid) -> CartResult<Option<CartRecord>> {
        Ok(self
            .staged
            .carts
            .values()
            .find(|cart| cart.user_id == user_id)
            .cloned())
    }

    async fn create_cart(&mut self, user_id: Uuid) -> CartResult<CartRecord> {
        if let Some(existing) = self.find_by_user(user_id).await? {
            return Ok(existing);
        }
        let cart = CartRecord::new(user_id);
        self.staged.carts.insert(cart.id, cart.clone());
        Ok(cart)
    }

    async fn list_lines(&mut self, cart_id: Uuid) -> CartResult<Vec<CartLine>> {
        let mut lines: Vec<CartLine> = self
            .staged
            .lines
            .values()
            .filter(|line| line.cart_id == cart_id)
            .cloned()
            .collect();
        lines.sort_by_key(|line| (line.created_at, line.id));
        Ok(lines)
    }

    async fn find_line(&mut self, id: Uuid) -> CartResult<Option<CartLine>> {
        Ok(self.staged.lines.get(&id).cloned())
    }

    async fn find_line_by_cart_and_product(
        &mut self,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> CartResult<Option<CartLine>> {
        Ok(self
            .staged
            .lines
            .values()
            .find(|line| line.cart_id == cart_id && line.product_id == product_id)
            .cloned())
    }

    async fn insert_line(&mut self, line: &CartLine) -> CartResult<()> {
        let duplicate = self
            .staged
            .lines
            .values()
            .any(|existing| existing.cart_id == line.cart_id && existing.product_id == line.product_id);
        if duplicate || self.staged.lines.contains_key(&line.id) {
            return Err(CartError::Conflict(format!(
                "cart {} already holds product {}",
                line.cart_id, line.product_id
            )));
        }
        self.staged.lines.insert(line.id, line.clone());
        Ok(())
    }

    async fn update_line(&mut self, line: &CartLine) -> CartResult<()> {
        match self.staged.lines.get_mut(&line.id) {
            Some(stored) => {
                *stored = line.clone();
                Ok(())
            }
            None => Err(CartError::CartItemNotFound(line.id)),
        }
    }

    async fn delete_line(&mut self, id: Uuid) -> CartResult<()> {
        self.staged.lines.remove(&id);
        Ok(())
    }

    async fn delete_lines_by_cart(&mut self, cart_id: Uuid) -> CartResult<u64> {
        let before = self.staged.lines.len();
        self.staged.lines.retain(|_, line| line.cart_id != cart_id);
        Ok((before - self.staged.lines.len()) as u64)
    }

    async fn count_lines(&mut self, cart_id: Uuid) -> CartResult<u64> {
        Ok(self
            .staged
            .lines
            .values()
            .filter(|line| line.cart_id == cart_id)
            .count() as u64)
    }

    async fn sum_line_totals(&mut self, cart_id: Uuid) -> CartResult<Decimal> {
        Ok(self
            .staged
            .lines
            .values()
            .filter(|line| line.cart_id == cart_id)
            .map(|line| line.line_total)
            .sum())
    }

    async fn sum_quantities(&mut self, cart_id: Uuid) -> CartResult<i64> {
        Ok(self
            .staged
            .lines
            .values()
            .filter(|line| line.cart_id == cart_id)
            .map(|line| i64::from(line.quantity))
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn product(stock: i32) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::now_v7(),
            name: "Bottle".to_string(),
            price: dec!(12.00),
            stock,
            visible: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let store = InMemoryInventoryStore::new();
        let mut item = product(5);
        store.insert_product(item.clone()).await;

        {
            let mut tx = store.begin().await.unwrap();
            item.stock = 1;
            tx.save(&item).await.unwrap();
            tx.create_cart(Uuid::now_v7()).await.unwrap();
        }

        assert_eq!(store.product(item.id).await.unwrap().stock, 5);
        assert!(store.lines().await.is_empty());
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() {
        let store = InMemoryInventoryStore::new();
        let mut item = product(5);
        store.insert_product(item.clone()).await;

        let mut tx = store.begin().await.unwrap();
        let cart = tx.create_cart(Uuid::now_v7()).await.unwrap();
        item.stock = 3;
        tx.save(&item).await.unwrap();
        tx.insert_line(&CartLine::new(cart.id, &item, 2)).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.product(item.id).await.unwrap().stock, 3);
        assert_eq!(store.reserved(item.id).await, 2);
    }

    #[tokio::test]
    async fn test_duplicate_line_is_a_retryable_conflict() {
        let store = InMemoryInventoryStore::new();
        let item = product(5);
        store.insert_product(item.clone()).await;

        let mut tx = store.begin().await.unwrap();
        let cart = tx.create_cart(Uuid::now_v7()).await.unwrap();
        tx.insert_line(&CartLine::new(cart.id, &item, 1)).await.unwrap();

        let err = tx
            .insert_line(&CartLine::new(cart.id, &item, 1))
            .await
            .unwrap_err();

        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_create_cart_is_idempotent() {
        let store = InMemoryInventoryStore::new();
        let user = Uuid::now_v7();

        let mut tx = store.begin().await.unwrap();
        let first = tx.create_cart(user).await.unwrap();
        let second = tx.create_cart(user).await.unwrap();

        assert_eq!(first.id, second.id);
    }
}
