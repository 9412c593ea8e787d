//! Stock receipt for delivered purchases.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use shopledger_core::{DomainError, DomainResult};
use shopledger_products::{CatalogError, StockWriter};

use crate::purchase::Purchase;

fn stock_err(err: CatalogError) -> DomainError {
    match err {
        CatalogError::NotFound(_) => DomainError::NotFound,
        other => DomainError::invariant(other.to_string()),
    }
}

/// Receive a pending purchase: credit the catalog's quantity on hand and
/// transition the purchase to delivered.
///
/// The stock adjustment happens before the status flip, so a missing catalog
/// product leaves the purchase untouched.
pub fn receive_purchase(
    purchase: &mut Purchase,
    stock: &dyn StockWriter,
    delivered_at: DateTime<Utc>,
) -> DomainResult<()> {
    if purchase.is_delivered() {
        return Err(DomainError::conflict("purchase is already delivered"));
    }

    stock
        .adjust_quantity(purchase.product_id(), Decimal::from(purchase.quantity()))
        .map_err(stock_err)?;
    purchase.mark_delivered(delivered_at)
}
