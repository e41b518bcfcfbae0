use async_trait::async_trait;
use domain_products::{Product, entity as product};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::{Expr, ExprTrait, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbBackend, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Statement,
    TransactionTrait, Value,
};
use uuid::Uuid;

use crate::entity::{cart, cart_item};
use crate::error::{CartError, CartResult};
use crate::models::{CartLine, CartRecord};
use crate::store::{CartStore, InventoryStore, InventoryTx, ProductStore};

/// PostgreSQL-backed [`InventoryStore`]
///
/// Each unit of work is one database transaction at the default isolation
/// level; product rows are locked with `SELECT ... FOR UPDATE`.
#[derive(Clone)]
pub struct PgInventoryStore {
    db: DatabaseConnection,
}

impl PgInventoryStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Rolls back on drop unless committed
pub struct PgInventoryTx {
    txn: DatabaseTransaction,
}

#[async_trait]
impl InventoryStore for PgInventoryStore {
    type Tx = PgInventoryTx;

    async fn begin(&self) -> CartResult<PgInventoryTx> {
        let txn = self.db.begin().await?;
        Ok(PgInventoryTx { txn })
    }
}

#[async_trait]
impl InventoryTx for PgInventoryTx {
    async fn commit(self) -> CartResult<()> {
        self.txn.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl ProductStore for PgInventoryTx {
    async fn find(&mut self, id: Uuid) -> CartResult<Option<Product>> {
        let model = product::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&self.txn)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn find_by_ids(&mut self, ids: &[Uuid]) -> CartResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // Rows are locked in scan order; ordering by id keeps concurrent
        // batch locks from deadlocking each other
        let models = product::Entity::find()
            .filter(product::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(product::Column::Id)
            .lock_exclusive()
            .all(&self.txn)
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn save(&mut self, item: &Product) -> CartResult<()> {
        let active_model = product::ActiveModel {
            id: Set(item.id),
            stock: Set(item.stock),
            updated_at: Set(item.updated_at.into()),
            ..Default::default()
        };

        active_model.update(&self.txn).await?;
        Ok(())
    }

    async fn batch_save(&mut self, items: &[Product]) -> CartResult<()> {
        if items.is_empty() {
            return Ok(());
        }

        let mut rows = Vec::with_capacity(items.len());
        let mut values: Vec<Value> = Vec::with_capacity(items.len() * 3);
        for (i, item) in items.iter().enumerate() {
            let base = i * 3;
            rows.push(format!(
                "(${}::uuid, ${}::int, ${}::timestamptz)",
                base + 1,
                base + 2,
                base + 3
            ));
            values.push(item.id.into());
            values.push(item.stock.into());
            values.push(item.updated_at.into());
        }

        let sql = format!(
            "UPDATE products AS p SET stock = v.stock, updated_at = v.updated_at \
             FROM (VALUES {}) AS v(id, stock, updated_at) WHERE p.id = v.id",
            rows.join(", ")
        );

        let result = self
            .txn
            .execute_raw(Statement::from_sql_and_values(DbBackend::Postgres, sql, values))
            .await?;

        if result.rows_affected() != items.len() as u64 {
            return Err(CartError::Internal(format!(
                "Batch stock update touched {} of {} products",
                result.rows_affected(),
                items.len()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CartStore for PgInventoryTx {
    async fn find_by_user(&mut self, user_id: Uuid) -> CartResult<Option<CartRecord>> {
        let model = cart::Entity::find()
            .filter(cart::Column::UserId.eq(user_id))
            .lock_exclusive()
            .one(&self.txn)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn create_cart(&mut self, user_id: Uuid) -> CartResult<CartRecord> {
        let active_model: cart::ActiveModel = CartRecord::new(user_id).into();

        // A concurrent first access may win the insert; both end up reading its row
        cart::Entity::insert(active_model)
            .on_conflict(
                OnConflict::column(cart::Column::UserId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.txn)
            .await?;

        self.find_by_user(user_id).await?.ok_or_else(|| {
            CartError::Internal(format!("Cart for user {} vanished after insert", user_id))
        })
    }

    async fn list_lines(&mut self, cart_id: Uuid) -> CartResult<Vec<CartLine>> {
        let models = cart_item::Entity::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .order_by_asc(cart_item::Column::CreatedAt)
            .order_by_asc(cart_item::Column::Id)
            .all(&self.txn)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_line(&mut self, id: Uuid) -> CartResult<Option<CartLine>> {
        let model = cart_item::Entity::find_by_id(id).one(&self.txn).await?;
        Ok(model.map(Into::into))
    }

    async fn find_line_by_cart_and_product(
        &mut self,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> CartResult<Option<CartLine>> {
        let model = cart_item::Entity::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(&self.txn)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn insert_line(&mut self, line: &CartLine) -> CartResult<()> {
        // A unique violation on (cart_id, product_id) converts to a retryable conflict
        cart_item::Entity::insert(cart_item::ActiveModel::from(line))
            .exec_without_returning(&self.txn)
            .await?;
        Ok(())
    }

    async fn update_line(&mut self, line: &CartLine) -> CartResult<()> {
        let active_model = cart_item::ActiveModel {
            id: Set(line.id),
            product_name: Set(line.product_name.clone()),
            price: Set(line.price),
            quantity: Set(line.quantity),
            line_total: Set(line.line_total),
            updated_at: Set(line.updated_at.into()),
            ..Default::default()
        };

        active_model.update(&self.txn).await?;
        Ok(())
    }

    async fn delete_line(&mut self, id: Uuid) -> CartResult<()> {
        cart_item::Entity::delete_by_id(id).exec(&self.txn).await?;
        Ok(())
    }

    async fn delete_lines_by_cart(&mut self, cart_id: Uuid) -> CartResult<u64> {
        let result = cart_item::Entity::delete_many()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .exec(&self.txn)
            .await?;
        Ok(result.rows_affected)
    }

    async fn count_lines(&mut self, cart_id: Uuid) -> CartResult<u64> {
        let count = cart_item::Entity::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .count(&self.txn)
            .await?;
        Ok(count)
    }

    async fn sum_line_totals(&mut self, cart_id: Uuid) -> CartResult<Decimal> {
        let total = cart_item::Entity::find()
            .select_only()
            .column_as(Expr::col(cart_item::Column::LineTotal).sum(), "total")
            .filter(cart_item::Column::CartId.eq(cart_id))
            .into_tuple::<Option<Decimal>>()
            .one(&self.txn)
            .await?;
        Ok(total.flatten().unwrap_or_default())
    }

    async fn sum_quantities(&mut self, cart_id: Uuid) -> CartResult<i64> {
        let total = cart_item::Entity::find()
            .select_only()
            .column_as(Expr::col(cart_item::Column::Quantity).sum(), "total")
            .filter(cart_item::Column::CartId.eq(cart_id))
            .into_tuple::<Option<i64>>()
            .one(&self.txn)
            .await?;
        Ok(total.flatten().unwrap_or_default())
    }
}
