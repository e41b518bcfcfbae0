//! Cart Service - the inventory reservation engine
//!
//! Moves units between a product's `stock` and the cart lines that reserve
//! them. Every operation runs as one unit of work against an
//! [`InventoryStore`]: reads, arithmetic and writes to both products and
//! lines commit together or not at all, so for every product
//! `stock + reserved == issued` holds whenever no operation is in flight.

use std::sync::Arc;

use chrono::Utc;
use database::common::retry_with_backoff_if;
use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::instrument;
use uuid::Uuid;

use crate::config::ReservationConfig;
use crate::error::{CartError, CartResult};
use crate::models::{Cart, CartCount, CartLine, CartRecord, CartTotal};
use crate::restore::restore_lines;
use crate::store::{CartStore, InventoryStore, InventoryTx};

pub struct CartService<S: InventoryStore> {
    store: Arc<S>,
    config: ReservationConfig,
}

impl<S: InventoryStore> Clone for CartService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: InventoryStore> CartService<S> {
    pub fn new(store: S, config: ReservationConfig) -> Self {
        Self {
            store: Arc::new(store),
            config,
        }
    }

    /// The user's cart, created empty on first access
    #[instrument(skip(self))]
    pub async fn get_or_create_cart(&self, user_id: Uuid) -> CartResult<Cart> {
        self.run("get_or_create_cart", move |tx| {
            async move {
                let record = cart_for(tx, user_id).await?;
                load_cart(tx, record).await
            }
            .boxed()
        })
        .await
    }

    /// Reserve `quantity` more units of a product in the user's cart
    #[instrument(skip(self))]
    pub async fn add_item(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> CartResult<Cart> {
        if quantity < 1 {
            return Err(CartError::Validation(format!(
                "Quantity must be at least 1, got {}",
                quantity
            )));
        }

        self.run("add_item", move |tx| {
            add_item_tx(tx, user_id, product_id, quantity).boxed()
        })
        .await
    }

    /// Resize a line's reservation; zero or less removes the line
    #[instrument(skip(self))]
    pub async fn update_item_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> CartResult<Cart> {
        self.run("update_item_quantity", move |tx| {
            update_item_tx(tx, user_id, item_id, quantity).boxed()
        })
        .await
    }

    /// Delete a line and return its units to stock
    #[instrument(skip(self))]
    pub async fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> CartResult<Cart> {
        self.run("remove_item", move |tx| {
            remove_item_tx(tx, user_id, item_id).boxed()
        })
        .await
    }

    /// Delete every line and return all reserved units to stock
    #[instrument(skip(self))]
    pub async fn clear_cart(&self, user_id: Uuid) -> CartResult<Cart> {
        self.run("clear_cart", move |tx| clear_cart_tx(tx, user_id).boxed())
            .await
    }

    #[instrument(skip(self))]
    pub async fn item_count(&self, user_id: Uuid) -> CartResult<CartCount> {
        self.run("item_count", move |tx| {
            async move {
                let record = cart_for(tx, user_id).await?;
                Ok(CartCount {
                    item_count: tx.count_lines(record.id).await?,
                    total_quantity: tx.sum_quantities(record.id).await?,
                })
            }
            .boxed()
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn total(&self, user_id: Uuid) -> CartResult<CartTotal> {
        self.run("total", move |tx| {
            async move {
                let record = cart_for(tx, user_id).await?;
                Ok(CartTotal {
                    total_amount: tx.sum_line_totals(record.id).await?,
                })
            }
            .boxed()
        })
        .await
    }

    /// Run `work` in a fresh unit of work, retrying lost races, within the
    /// configured timeout. A unit of work that does not commit is dropped,
    /// which rolls back everything it wrote.
    async fn run<T, F>(&self, operation: &'static str, work: F) -> CartResult<T>
    where
        T: Send,
        F: for<'t> Fn(&'t mut S::Tx) -> BoxFuture<'t, CartResult<T>> + Send + Sync,
    {
        let attempts = retry_with_backoff_if(
            || self.run_once(&work),
            self.config.retry_policy(),
            CartError::is_retryable,
        );

        let result = match tokio::time::timeout(self.config.timeout, attempts).await {
            Ok(result) => result,
            Err(_) => Err(CartError::Timeout(self.config.timeout)),
        };

        if let Err(ref error) = result {
            if error.is_business() {
                tracing::info!(operation, error = %error, "Cart operation rejected");
            } else {
                tracing::error!(operation, error = %error, "Cart operation failed");
            }
        }
        result
    }

    async fn run_once<T, F>(&self, work: &F) -> CartResult<T>
    where
        F: for<'t> Fn(&'t mut S::Tx) -> BoxFuture<'t, CartResult<T>>,
    {
        let mut tx = self.store.begin().await?;
        let value = work(&mut tx).await?;
        tx.commit().await?;
        Ok(value)
    }
}

/// Existing cart for the user, or a new empty one
async fn cart_for<T: InventoryTx>(tx: &mut T, user_id: Uuid) -> CartResult<CartRecord> {
    match tx.find_by_user(user_id).await? {
        Some(record) => Ok(record),
        None => tx.create_cart(user_id).await,
    }
}

/// Existing cart for the user; a user without a cart owns no lines
async fn existing_cart<T: InventoryTx>(
    tx: &mut T,
    user_id: Uuid,
    item_id: Uuid,
) -> CartResult<CartRecord> {
    tx.find_by_user(user_id)
        .await?
        .ok_or(CartError::CartItemNotFound(item_id))
}

async fn owned_line<T: InventoryTx>(
    tx: &mut T,
    cart: &CartRecord,
    item_id: Uuid,
) -> CartResult<CartLine> {
    tx.find_line(item_id)
        .await?
        .filter(|line| line.cart_id == cart.id)
        .ok_or(CartError::CartItemNotFound(item_id))
}

async fn load_cart<T: InventoryTx>(tx: &mut T, record: CartRecord) -> CartResult<Cart> {
    let items = tx.list_lines(record.id).await?;
    let item_count = tx.count_lines(record.id).await?;
    let total_amount = tx.sum_line_totals(record.id).await?;
    Ok(Cart::new(record, items, item_count, total_amount))
}

fn insufficient(product_id: Uuid, requested: i64, available: i64) -> CartError {
    CartError::InsufficientStock {
        product_id,
        requested,
        available,
    }
}

async fn add_item_tx<T: InventoryTx>(
    tx: &mut T,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> CartResult<Cart> {
    let cart = cart_for(tx, user_id).await?;

    let mut product = tx
        .find(product_id)
        .await?
        .ok_or(CartError::ProductNotFound(product_id))?;
    if !product.visible {
        return Err(CartError::ProductInvisible(product_id));
    }

    let stock = i64::from(product.stock);
    let requested = i64::from(quantity);

    match tx.find_line_by_cart_and_product(cart.id, product_id).await? {
        None => {
            if stock < requested {
                return Err(insufficient(product_id, requested, stock));
            }

            product.stock -= quantity;
            product.updated_at = Utc::now();
            tx.save(&product).await?;

            let line = CartLine::new(cart.id, &product, quantity);
            tx.insert_line(&line).await?;

            tracing::info!(
                cart_id = %cart.id,
                product_id = %product_id,
                quantity,
                stock = product.stock,
                "Reserved stock in new cart line"
            );
        }
        Some(mut line) => {
            // The line's own reservation counts towards what it may grow to
            let available = stock + i64::from(line.quantity);
            let new_total = i64::from(line.quantity) + requested;
            if new_total > available {
                return Err(insufficient(product_id, new_total, available));
            }
            let new_quantity = i32::try_from(new_total)
                .map_err(|_| insufficient(product_id, new_total, available))?;

            product.stock -= quantity;
            product.updated_at = Utc::now();
            tx.save(&product).await?;

            line.refresh_snapshot(&product);
            line.set_quantity(new_quantity);
            tx.update_line(&line).await?;

            tracing::info!(
                cart_id = %cart.id,
                product_id = %product_id,
                quantity = new_quantity,
                stock = product.stock,
                "Grew cart line reservation"
            );
        }
    }

    load_cart(tx, cart).await
}

async fn update_item_tx<T: InventoryTx>(
    tx: &mut T,
    user_id: Uuid,
    item_id: Uuid,
    quantity: i32,
) -> CartResult<Cart> {
    let cart = existing_cart(tx, user_id, item_id).await?;
    let mut line = owned_line(tx, &cart, item_id).await?;
    let mut product = tx
        .find(line.product_id)
        .await?
        .ok_or(CartError::ProductNotFound(line.product_id))?;

    let available = i64::from(product.stock) + i64::from(line.quantity);

    if quantity <= 0 {
        product.stock = i32::try_from(available).map_err(|_| {
            CartError::Internal(format!(
                "Restoring {} units overflows stock of product {}",
                line.quantity, product.id
            ))
        })?;
        product.updated_at = Utc::now();
        tx.save(&product).await?;
        tx.delete_line(line.id).await?;

        tracing::info!(
            cart_id = %cart.id,
            item_id = %item_id,
            restored = line.quantity,
            stock = product.stock,
            "Removed cart line by zero quantity"
        );
        return load_cart(tx, cart).await;
    }

    let requested = i64::from(quantity);
    if requested > available {
        return Err(insufficient(product.id, requested, available));
    }

    // available - requested == stock - (requested - current), for growth and shrinkage alike
    product.stock = i32::try_from(available - requested).map_err(|_| {
        CartError::Internal(format!("Stock of product {} out of range", product.id))
    })?;
    product.updated_at = Utc::now();
    tx.save(&product).await?;

    line.set_quantity(quantity);
    tx.update_line(&line).await?;

    tracing::info!(
        cart_id = %cart.id,
        item_id = %item_id,
        quantity,
        stock = product.stock,
        "Resized cart line reservation"
    );
    load_cart(tx, cart).await
}

async fn remove_item_tx<T: InventoryTx>(
    tx: &mut T,
    user_id: Uuid,
    item_id: Uuid,
) -> CartResult<Cart> {
    let cart = existing_cart(tx, user_id, item_id).await?;
    let line = owned_line(tx, &cart, item_id).await?;

    match tx.find(line.product_id).await? {
        Some(mut product) => {
            product.stock = product.stock.checked_add(line.quantity).ok_or_else(|| {
                CartError::Internal(format!(
                    "Restoring {} units overflows stock of product {}",
                    line.quantity, product.id
                ))
            })?;
            product.updated_at = Utc::now();
            tx.save(&product).await?;
        }
        None => {
            tracing::warn!(
                product_id = %line.product_id,
                quantity = line.quantity,
                "Cannot restore stock, product not found"
            );
        }
    }

    tx.delete_line(line.id).await?;

    tracing::info!(
        cart_id = %cart.id,
        item_id = %item_id,
        restored = line.quantity,
        "Removed cart line"
    );
    load_cart(tx, cart).await
}

async fn clear_cart_tx<T: InventoryTx>(tx: &mut T, user_id: Uuid) -> CartResult<Cart> {
    let cart = cart_for(tx, user_id).await?;
    let lines = tx.list_lines(cart.id).await?;

    let summary = restore_lines(tx, &lines).await?;
    let removed = tx.delete_lines_by_cart(cart.id).await?;

    tracing::info!(
        cart_id = %cart.id,
        lines = removed,
        products = summary.restored_products,
        units = summary.restored_units,
        "Cleared cart"
    );
    load_cart(tx, cart).await
}
