use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Product entity - a catalog entry with its unreserved stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    /// Unique identifier
    pub id: Uuid,
    /// Product name
    pub name: String,
    /// Unit price
    #[schema(value_type = String, example = "19.99")]
    pub price: Decimal,
    /// Units not currently reserved by any cart
    pub stock: i32,
    /// Whether the product can be added to a cart
    pub visible: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a new product
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProduct {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub name: String,
    #[validate(custom(function = "validate_price"))]
    #[schema(value_type = String, example = "19.99")]
    pub price: Decimal,
    /// Initial issued stock
    #[validate(range(min = 0))]
    #[serde(default)]
    pub stock: i32,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

/// DTO for updating catalog fields of an existing product.
///
/// Stock is not updatable here; use restock.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProduct {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    #[validate(custom(function = "validate_price"))]
    #[schema(value_type = Option<String>, example = "24.50")]
    pub price: Option<Decimal>,
    pub visible: Option<bool>,
}

/// Request body for toggling visibility
#[derive(Debug, Clone, Copy, Deserialize, Validate, ToSchema)]
pub struct SetVisibility {
    pub visible: bool,
}

/// Request body for adding issued stock
#[derive(Debug, Clone, Copy, Deserialize, Validate, ToSchema)]
pub struct Restock {
    /// Units to add to the product's stock
    #[validate(range(min = 1))]
    pub amount: i32,
}

/// Query filters for listing products
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
pub struct ProductFilter {
    /// Case-insensitive substring match on name
    pub name: Option<String>,
    /// Minimum price (inclusive)
    pub min_price: Option<Decimal>,
    /// Maximum price (inclusive)
    pub max_price: Option<Decimal>,
    /// Filter by visibility
    pub visible: Option<bool>,
    /// Maximum number of results
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: u64,
    /// Number of results to skip
    #[serde(default)]
    pub offset: u64,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            name: None,
            min_price: None,
            max_price: None,
            visible: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

impl ProductFilter {
    /// Filter restricted to products that can be added to a cart
    pub fn visible_only(name: Option<String>, limit: u64, offset: u64) -> Self {
        Self {
            name,
            visible: Some(true),
            limit,
            offset,
            ..Default::default()
        }
    }
}

/// Visible-only listing query
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
pub struct VisibleQuery {
    /// Case-insensitive substring match on name
    pub name: Option<String>,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

/// One page of products with the total matching count
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductPage {
    pub items: Vec<Product>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

fn default_limit() -> u64 {
    20
}

fn default_visible() -> bool {
    true
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price < Decimal::new(1, 2) {
        return Err(ValidationError::new("price_too_low"));
    }
    if price.normalize().scale() > 2 {
        return Err(ValidationError::new("price_scale"));
    }
    Ok(())
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

impl Product {
    /// Create a new product from CreateProduct DTO
    pub fn new(input: CreateProduct) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: input.name.trim().to_string(),
            price: input.price,
            stock: input.stock,
            visible: input.visible,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply catalog updates. Stock is never touched.
    pub fn apply_update(&mut self, update: UpdateProduct) {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(visible) = update.visible {
            self.visible = visible;
        }
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn create(name: &str, price: Decimal) -> CreateProduct {
        CreateProduct {
            name: name.to_string(),
            price,
            stock: 5,
            visible: true,
        }
    }

    #[test]
    fn test_create_product_validation() {
        assert!(create("Widget", dec!(9.99)).validate().is_ok());
        assert!(create("", dec!(9.99)).validate().is_err());
        assert!(create("   ", dec!(9.99)).validate().is_err());
        assert!(create("Widget", dec!(0)).validate().is_err());
        assert!(create("Widget", dec!(1.234)).validate().is_err());

        let mut negative_stock = create("Widget", dec!(1));
        negative_stock.stock = -1;
        assert!(negative_stock.validate().is_err());
    }

    #[test]
    fn test_apply_update_keeps_stock() {
        let mut product = Product::new(create("Widget", dec!(9.99)));
        product.apply_update(UpdateProduct {
            name: Some(" Gadget ".to_string()),
            price: Some(dec!(12.50)),
            visible: Some(false),
        });

        assert_eq!(product.name, "Gadget");
        assert_eq!(product.price, dec!(12.50));
        assert!(!product.visible);
        assert_eq!(product.stock, 5);
    }

    #[test]
    fn test_filter_defaults() {
        let filter: ProductFilter = serde_json::from_str("{}").unwrap();
        assert_eq!(filter.limit, 20);
        assert_eq!(filter.offset, 0);
        assert!(filter.validate().is_ok());

        let too_many = ProductFilter {
            limit: 101,
            ..Default::default()
        };
        assert!(too_many.validate().is_err());
    }
}
