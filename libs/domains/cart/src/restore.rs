//! Returning reserved units to product stock in bulk.
//!
//! Lines are grouped by product first so a clear costs one locked read and
//! one write per distinct product, whatever the number of lines.

use std::collections::BTreeMap;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{CartError, CartResult};
use crate::models::CartLine;
use crate::store::ProductStore;

/// Outcome of a bulk restore
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    /// Products whose stock was increased
    pub restored_products: usize,
    /// Units returned to stock
    pub restored_units: i64,
    /// Products that no longer exist; their units are dropped with the lines
    pub missing_products: Vec<Uuid>,
}

/// Sum reserved quantities per product, keyed in ascending id order
pub fn aggregate_by_product(lines: &[CartLine]) -> BTreeMap<Uuid, i64> {
    let mut totals = BTreeMap::new();
    for line in lines {
        *totals.entry(line.product_id).or_insert(0) += i64::from(line.quantity);
    }
    totals
}

/// Add every line's quantity back to its product's stock.
///
/// Does not delete the lines; the caller does that in the same unit of work.
pub async fn restore_lines<S>(store: &mut S, lines: &[CartLine]) -> CartResult<RestoreSummary>
where
    S: ProductStore + ?Sized,
{
    let totals = aggregate_by_product(lines);
    if totals.is_empty() {
        return Ok(RestoreSummary::default());
    }

    let ids: Vec<Uuid> = totals.keys().copied().collect();
    let products = store.find_by_ids(&ids).await?;

    let mut summary = RestoreSummary::default();
    let mut updated = Vec::with_capacity(products.len());
    let now = Utc::now();

    for mut product in products {
        let Some(&quantity) = totals.get(&product.id) else {
            continue;
        };

        product.stock = i64::from(product.stock)
            .checked_add(quantity)
            .and_then(|stock| i32::try_from(stock).ok())
            .ok_or_else(|| {
                CartError::Internal(format!(
                    "Restoring {} units overflows stock of product {}",
                    quantity, product.id
                ))
            })?;
        product.updated_at = now;

        summary.restored_units += quantity;
        updated.push(product);
    }

    summary.missing_products = ids
        .into_iter()
        .filter(|id| !updated.iter().any(|product| product.id == *id))
        .collect();

    for product_id in &summary.missing_products {
        tracing::warn!(
            product_id = %product_id,
            quantity = totals.get(product_id).copied().unwrap_or_default(),
            "Cannot restore stock, product not found"
        );
    }

    if !updated.is_empty() {
        store.batch_save(&updated).await?;
    }
    summary.restored_products = updated.len();

    Ok(summary)
}
