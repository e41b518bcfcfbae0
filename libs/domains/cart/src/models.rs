use chrono::{DateTime, Utc};
use domain_products::Product;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Cart header row: one per user, created on first access
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartRecord {
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A product reservation inside a cart
///
/// `product_name` and `price` are a snapshot taken when the product was
/// added; `line_total` is always `price * quantity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    #[schema(value_type = String, example = "19.99")]
    pub price: Decimal,
    /// Units reserved; always at least 1
    pub quantity: i32,
    #[schema(value_type = String, example = "39.98")]
    pub line_total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartLine {
    pub fn new(cart_id: Uuid, product: &Product, quantity: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            cart_id,
            product_id: product.id,
            product_name: product.name.clone(),
            price: product.price,
            quantity,
            line_total: product.price * Decimal::from(quantity),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the reserved quantity and recompute the line total at the snapshot price
    pub fn set_quantity(&mut self, quantity: i32) {
        self.quantity = quantity;
        self.line_total = self.price * Decimal::from(quantity);
        self.updated_at = Utc::now();
    }

    /// Take a fresh name/price snapshot from the product
    pub fn refresh_snapshot(&mut self, product: &Product) {
        self.product_name = product.name.clone();
        self.price = product.price;
        self.line_total = self.price * Decimal::from(self.quantity);
        self.updated_at = Utc::now();
    }
}

/// Cart view returned to callers, with aggregates derived from its lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<CartLine>,
    /// Sum of line totals
    #[schema(value_type = String, example = "59.97")]
    pub total_amount: Decimal,
    /// Number of distinct lines
    pub item_count: u64,
    /// Sum of line quantities
    pub total_quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(record: CartRecord, items: Vec<CartLine>, item_count: u64, total_amount: Decimal) -> Self {
        let total_quantity = items.iter().map(|line| i64::from(line.quantity)).sum();
        Self {
            id: record.id,
            user_id: record.user_id,
            items,
            total_amount,
            item_count,
            total_quantity,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Request body for adding a product to the cart
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddCartItem {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

/// Request body for changing a line's quantity; 0 removes the line
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateCartItem {
    #[validate(range(min = 0))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartCount {
    /// Number of distinct lines
    pub item_count: u64,
    /// Sum of line quantities
    pub total_quantity: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartTotal {
    #[schema(value_type = String, example = "59.97")]
    pub total_amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product() -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::now_v7(),
            name: "Tea Tin".to_string(),
            price: dec!(4.25),
            stock: 10,
            visible: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_line_total_follows_quantity() {
        let mut line = CartLine::new(Uuid::now_v7(), &product(), 3);
        assert_eq!(line.line_total, dec!(12.75));

        line.set_quantity(4);
        assert_eq!(line.line_total, dec!(17.00));
    }

    #[test]
    fn test_refresh_snapshot_reprices_line() {
        let mut item = product();
        let mut line = CartLine::new(Uuid::now_v7(), &item, 2);

        item.price = dec!(5.00);
        item.name = "Tea Tin (large)".to_string();
        line.refresh_snapshot(&item);

        assert_eq!(line.product_name, "Tea Tin (large)");
        assert_eq!(line.line_total, dec!(10.00));
    }

    #[test]
    fn test_cart_aggregates() {
        let item = product();
        let record = CartRecord::new(Uuid::now_v7());
        let lines = vec![
            CartLine::new(record.id, &item, 2),
            CartLine::new(record.id, &item, 5),
        ];

        let cart = Cart::new(record, lines, 2, dec!(29.75));

        assert_eq!(cart.item_count, 2);
        assert_eq!(cart.total_quantity, 7);
    }

    #[test]
    fn test_update_body_allows_zero() {
        assert!(UpdateCartItem { quantity: 0 }.validate().is_ok());
        assert!(UpdateCartItem { quantity: -1 }.validate().is_err());
        assert!(
            AddCartItem {
                product_id: Uuid::now_v7(),
                quantity: 0
            }
            .validate()
            .is_err()
        );
    }
}
