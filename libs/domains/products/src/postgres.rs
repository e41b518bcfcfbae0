use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::{Expr, extension::postgres::PgExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    entity,
    error::{ProductError, ProductResult},
    models::{CreateProduct, Product, ProductFilter, UpdateProduct},
    repository::ProductRepository,
};

pub struct PgProductRepository {
    db: DatabaseConnection,
}

impl PgProductRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn filtered(filter: &ProductFilter) -> Select<entity::Entity> {
        let mut query = entity::Entity::find();

        if let Some(ref name) = filter.name {
            let pattern = format!("%{}%", escape_like(name));
            query = query.filter(Expr::col(entity::Column::Name).ilike(pattern));
        }

        if let Some(min_price) = filter.min_price {
            query = query.filter(entity::Column::Price.gte(min_price));
        }

        if let Some(max_price) = filter.max_price {
            query = query.filter(entity::Column::Price.lte(max_price));
        }

        if let Some(visible) = filter.visible {
            query = query.filter(entity::Column::Visible.eq(visible));
        }

        query
    }
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn create(&self, input: CreateProduct) -> ProductResult<Product> {
        let active_model: entity::ActiveModel = Product::new(input).into();

        let model = active_model.insert(&self.db).await?;

        tracing::info!(product_id = %model.id, stock = model.stock, "Created product");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let model = entity::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn list(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        let models = Self::filtered(&filter)
            .order_by_desc(entity::Column::CreatedAt)
            .order_by_desc(entity::Column::Id)
            .limit(filter.limit)
            .offset(filter.offset)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn count(&self, filter: ProductFilter) -> ProductResult<u64> {
        let count = Self::filtered(&filter).count(&self.db).await?;
        Ok(count)
    }

    async fn update(&self, id: Uuid, input: UpdateProduct) -> ProductResult<Product> {
        let model = entity::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(ProductError::NotFound(id))?;

        let mut product: Product = model.into();
        product.apply_update(input);

        // Stock stays NotSet so concurrent reservations are never overwritten
        let active_model = entity::ActiveModel {
            id: Set(product.id),
            name: Set(product.name),
            price: Set(product.price),
            visible: Set(product.visible),
            updated_at: Set(product.updated_at.into()),
            ..Default::default()
        };

        let model = active_model.update(&self.db).await?;

        tracing::info!(product_id = %id, "Updated product");
        Ok(model.into())
    }

    async fn restock(&self, id: Uuid, amount: i32) -> ProductResult<Product> {
        let txn = self.db.begin().await?;

        let model = entity::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ProductError::NotFound(id))?;

        let stock = model.stock.checked_add(amount).ok_or_else(|| {
            ProductError::Validation(format!("Restocking {} units overflows stock", amount))
        })?;

        let mut active_model = model.into_active_model();
        active_model.stock = Set(stock);
        active_model.updated_at = Set(Utc::now().into());
        let model = active_model.update(&txn).await?;

        txn.commit().await?;

        tracing::info!(product_id = %id, amount, stock, "Restocked product");
        Ok(model.into())
    }

    async fn delete(&self, id: Uuid) -> ProductResult<bool> {
        let result = entity::Entity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected > 0 {
            tracing::info!(product_id = %id, "Deleted product");
        }
        Ok(result.rows_affected > 0)
    }
}
