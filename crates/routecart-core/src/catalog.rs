//! # Catalog Snapshot
//!
//! Read-only product list supplied by the backend when a sale session starts.
//!
//! ```text
//! backend ──► Vec<Product> ──► CatalogSnapshot::new() ──► validated + indexed
//!                                     │
//!                                     ├── duplicate productId  → Duplicate
//!                                     ├── bad SKU / price      → InvalidFormat / OutOfRange
//!                                     └── box with factor 0    → OutOfRange
//! ```
//!
//! Stock numbers are a snapshot. The engine never reserves or decrements
//! them; the backend does that when it accepts an order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::Product;
use crate::validation::{
    validate_conversion_factor, validate_id, validate_price, validate_sku, validate_stock,
};

/// Validated, id-indexed product list. Keeps the backend's ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Product>", into = "Vec<Product>")]
pub struct CatalogSnapshot {
    products: Vec<Product>,
    index: HashMap<String, usize>,
}

impl CatalogSnapshot {
    /// Validates and indexes a product list.
    pub fn new(products: Vec<Product>) -> CoreResult<Self> {
        let mut index = HashMap::with_capacity(products.len());

        for (position, product) in products.iter().enumerate() {
            validate_product(product)?;
            if index.insert(product.id.clone(), position).is_some() {
                return Err(ValidationError::Duplicate {
                    field: "productId".to_string(),
                    value: product.id.clone(),
                }
                .into());
            }
        }

        Ok(CatalogSnapshot { products, index })
    }

    /// Looks up a product by id.
    pub fn get(&self, product_id: &str) -> Option<&Product> {
        self.index
            .get(product_id)
            .and_then(|&position| self.products.get(position))
    }

    /// Looks up a product by id, failing with `ProductNotFound`.
    pub fn require(&self, product_id: &str) -> CoreResult<&Product> {
        self.get(product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))
    }

    /// All products in snapshot order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Products of one storefront merchant.
    pub fn by_merchant<'a>(&'a self, merchant_id: &'a str) -> impl Iterator<Item = &'a Product> {
        self.products
            .iter()
            .filter(move |p| p.merchant_id.as_deref() == Some(merchant_id))
    }

    /// Case-insensitive match on name or SKU, in snapshot order.
    ///
    /// An empty query returns every product.
    pub fn search(&self, query: &str) -> Vec<&Product> {
        let needle = query.trim().to_lowercase();
        self.products
            .iter()
            .filter(|p| {
                needle.is_empty()
                    || p.name.to_lowercase().contains(&needle)
                    || p.sku.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl TryFrom<Vec<Product>> for CatalogSnapshot {
    type Error = CoreError;

    fn try_from(products: Vec<Product>) -> Result<Self, Self::Error> {
        CatalogSnapshot::new(products)
    }
}

impl From<CatalogSnapshot> for Vec<Product> {
    fn from(snapshot: CatalogSnapshot) -> Self {
        snapshot.products
    }
}

fn validate_product(product: &Product) -> Result<(), ValidationError> {
    validate_id("productId", &product.id)?;
    validate_sku(&product.sku)?;
    validate_price("baseUnitPrice", product.base_unit_price)?;
    validate_price("secondUnitPrice", product.second_unit_price)?;
    validate_stock(product.stock_in_base_units)?;
    if product.second_unit.is_some() {
        validate_conversion_factor(product.units_per_second_unit)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
