//! Product Service - catalog business logic

use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ProductError, ProductResult};
use crate::models::{CreateProduct, Product, ProductFilter, ProductPage, Restock, UpdateProduct};
use crate::repository::ProductRepository;

/// Product service providing catalog operations
///
/// Validates input and delegates to the repository. Stock is only ever
/// increased here (creation, restock); reservations live in the cart domain.
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> ProductService<R> {
    /// Create a new ProductService with the given repository
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Create a new product
    #[instrument(skip(self, input), fields(product_name = %input.name))]
    pub async fn create_product(&self, input: CreateProduct) -> ProductResult<Product> {
        input
            .validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;

        self.repository.create(input).await
    }

    /// Get a product by ID
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> ProductResult<Product> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    /// List products with optional filters
    #[instrument(skip(self))]
    pub async fn list_products(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        filter
            .validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;

        self.repository.list(filter).await
    }

    /// Count products matching a filter
    #[instrument(skip(self))]
    pub async fn count_products(&self, filter: ProductFilter) -> ProductResult<u64> {
        self.repository.count(filter).await
    }

    /// One page of products together with the total count
    #[instrument(skip(self))]
    pub async fn page_products(&self, filter: ProductFilter) -> ProductResult<ProductPage> {
        let (limit, offset) = (filter.limit, filter.offset);
        let (items, total) = tokio::try_join!(
            self.list_products(filter.clone()),
            self.count_products(filter)
        )?;

        Ok(ProductPage {
            items,
            total,
            limit,
            offset,
        })
    }

    /// Products that can currently be added to a cart
    #[instrument(skip(self))]
    pub async fn list_visible_products(
        &self,
        name: Option<String>,
        limit: u64,
        offset: u64,
    ) -> ProductResult<ProductPage> {
        self.page_products(ProductFilter::visible_only(name, limit, offset))
            .await
    }

    /// Update catalog fields of an existing product
    #[instrument(skip(self, input))]
    pub async fn update_product(&self, id: Uuid, input: UpdateProduct) -> ProductResult<Product> {
        input
            .validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;

        self.repository.update(id, input).await
    }

    /// Show or hide a product
    #[instrument(skip(self))]
    pub async fn set_visibility(&self, id: Uuid, visible: bool) -> ProductResult<Product> {
        let update = UpdateProduct {
            visible: Some(visible),
            ..Default::default()
        };
        self.repository.update(id, update).await
    }

    /// Add issued stock to a product
    #[instrument(skip(self))]
    pub async fn restock(&self, id: Uuid, restock: Restock) -> ProductResult<Product> {
        restock
            .validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;

        self.repository.restock(id, restock.amount).await
    }

    /// Delete a product
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> ProductResult<()> {
        if !self.repository.delete(id).await? {
            return Err(ProductError::NotFound(id));
        }
        Ok(())
    }
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockProductRepository;
    use chrono::Utc;
    use mockall::predicate::eq;
    use rust_decimal_macros::dec;

    fn product(stock: i32) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::now_v7(),
            name: "Walnut Desk".to_string(),
            price: dec!(249.00),
            stock,
            visible: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_product_rejects_invalid_input() {
        // No repository call expected
        let mock_repo = MockProductRepository::new();
        let service = ProductService::new(mock_repo);

        let result = service
            .create_product(CreateProduct {
                name: "Desk".to_string(),
                price: dec!(0),
                stock: 1,
                visible: true,
            })
            .await;

        assert!(matches!(result, Err(ProductError::Validation(_))));
    }

    #[tokio::test]
    async fn test_get_product_not_found() {
        let mut mock_repo = MockProductRepository::new();
        let id = Uuid::now_v7();

        mock_repo
            .expect_get_by_id()
            .with(eq(id))
            .returning(|_| Ok(None));

        let service = ProductService::new(mock_repo);
        let result = service.get_product(id).await;

        assert!(matches!(result, Err(ProductError::NotFound(missing)) if missing == id));
    }

    #[tokio::test]
    async fn test_restock_rejects_non_positive_amount() {
        let mock_repo = MockProductRepository::new();
        let service = ProductService::new(mock_repo);

        let result = service.restock(Uuid::now_v7(), Restock { amount: 0 }).await;

        assert!(matches!(result, Err(ProductError::Validation(_))));
    }

    #[tokio::test]
    async fn test_restock_delegates_amount() {
        let mut mock_repo = MockProductRepository::new();
        let existing = product(3);
        let id = existing.id;

        mock_repo
            .expect_restock()
            .with(eq(id), eq(7))
            .times(1)
            .returning(move |_, amount| {
                let mut restocked = existing.clone();
                restocked.stock += amount;
                Ok(restocked)
            });

        let service = ProductService::new(mock_repo);
        let restocked = service.restock(id, Restock { amount: 7 }).await.unwrap();

        assert_eq!(restocked.stock, 10);
    }

    #[tokio::test]
    async fn test_set_visibility_only_touches_visible() {
        let mut mock_repo = MockProductRepository::new();
        let existing = product(2);
        let id = existing.id;

        mock_repo
            .expect_update()
            .withf(move |update_id, update| {
                *update_id == id
                    && update.visible == Some(false)
                    && update.name.is_none()
                    && update.price.is_none()
            })
            .returning(move |_, _| {
                let mut hidden = existing.clone();
                hidden.visible = false;
                Ok(hidden)
            });

        let service = ProductService::new(mock_repo);
        let updated = service.set_visibility(id, false).await.unwrap();

        assert!(!updated.visible);
        assert_eq!(updated.stock, 2);
    }

    #[tokio::test]
    async fn test_page_products_combines_list_and_count() {
        let mut mock_repo = MockProductRepository::new();

        mock_repo
            .expect_list()
            .withf(|filter| filter.visible == Some(true) && filter.limit == 2)
            .returning(|_| Ok(vec![product(1), product(2)]));
        mock_repo
            .expect_count()
            .withf(|filter| filter.visible == Some(true))
            .returning(|_| Ok(5));

        let service = ProductService::new(mock_repo);
        let page = service.list_visible_products(None, 2, 0).await.unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 5);
        assert_eq!(page.limit, 2);
    }

    #[tokio::test]
    async fn test_delete_missing_product() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_delete().returning(|_| Ok(false));

        let service = ProductService::new(mock_repo);
        let result = service.delete_product(Uuid::now_v7()).await;

        assert!(matches!(result, Err(ProductError::NotFound(_))));
    }
}
