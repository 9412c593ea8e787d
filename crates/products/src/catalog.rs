//! Catalog storage and the narrow interfaces other modules consume.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use rust_decimal::Decimal;

use crate::product::{Product, ProductId};

/// Catalog access error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    #[error("product not found: {0}")]
    NotFound(ProductId),
    #[error("product already exists: {0}")]
    AlreadyExists(ProductId),
    #[error("stock adjustment would make quantity on hand negative: {0}")]
    InsufficientStock(ProductId),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Read-side catalog lookup consumed by documents and sales.
pub trait Catalog: Send + Sync {
    /// Fetch a product by id. `Ok(None)` means the product does not exist.
    fn product(&self, id: ProductId) -> Result<Option<Product>, CatalogError>;
}

/// Write-side stock adjustment consumed by purchasing.
pub trait StockWriter: Send + Sync {
    /// Adjust quantity on hand (positive = receipt, negative = issue).
    fn adjust_quantity(&self, id: ProductId, delta: Decimal) -> Result<(), CatalogError>;
}

/// In-memory catalog for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a new product.
    pub fn insert(&self, product: Product) -> Result<(), CatalogError> {
        let mut products = self
            .products
            .write()
            .map_err(|_| CatalogError::Storage("lock poisoned".to_string()))?;
        let id = product.id_typed();
        if products.contains_key(&id) {
            return Err(CatalogError::AlreadyExists(id));
        }
        products.insert(id, product);
        Ok(())
    }
}

impl Catalog for InMemoryCatalog {
    fn product(&self, id: ProductId) -> Result<Option<Product>, CatalogError> {
        let products = self
            .products
            .read()
            .map_err(|_| CatalogError::Storage("lock poisoned".to_string()))?;
        Ok(products.get(&id).cloned())
    }
}

impl StockWriter for InMemoryCatalog {
    fn adjust_quantity(&self, id: ProductId, delta: Decimal) -> Result<(), CatalogError> {
        let mut products = self
            .products
            .write()
            .map_err(|_| CatalogError::Storage("lock poisoned".to_string()))?;
        let product = products.get_mut(&id).ok_or(CatalogError::NotFound(id))?;
        product
            .adjust_quantity(delta)
            .map_err(|_| CatalogError::InsufficientStock(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use shopledger_core::EntityId;

    fn test_product(id: ProductId) -> Product {
        Product::new(id, "Widget", dec!(10.00), dec!(5)).unwrap()
    }

    #[test]
    fn insert_and_lookup() {
        let catalog = InMemoryCatalog::new();
        let id = ProductId::new(EntityId::new());
        catalog.insert(test_product(id)).unwrap();

        let found = catalog.product(id).unwrap().unwrap();
        assert_eq!(found.name(), "Widget");
        assert_eq!(found.unit_price(), dec!(10.00));
    }

    #[test]
    fn missing_product_is_none() {
        let catalog = InMemoryCatalog::new();
        assert!(catalog.product(ProductId::new(EntityId::new())).unwrap().is_none());
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let catalog = InMemoryCatalog::new();
        let id = ProductId::new(EntityId::new());
        catalog.insert(test_product(id)).unwrap();
        assert!(matches!(
            catalog.insert(test_product(id)),
            Err(CatalogError::AlreadyExists(_))
        ));
    }

    #[test]
    fn stock_adjustment_round_trips() {
        let catalog = InMemoryCatalog::new();
        let id = ProductId::new(EntityId::new());
        catalog.insert(test_product(id)).unwrap();

        catalog.adjust_quantity(id, dec!(7)).unwrap();
        assert_eq!(catalog.product(id).unwrap().unwrap().quantity_on_hand(), dec!(12));

        assert!(matches!(
            catalog.adjust_quantity(id, dec!(-20)),
            Err(CatalogError::InsufficientStock(_))
        ));
    }
}
