//! # Price Resolver
//!
//! Computes the effective unit price of a product for a given unit type.
//!
//! ## Resolution Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  resolve_price(product, unit_type, overrides?)                          │
//! │                                                                         │
//! │  unit_type supported by product? ── no ──► UnsupportedUnitType          │
//! │           │ yes                                                         │
//! │           ▼                                                             │
//! │  active override with a price for this unit? ── yes ──► override price  │
//! │           │ no                                  (is_overridden = true)  │
//! │           ▼                                                             │
//! │  catalog price for this unit                                            │
//! │  (is_overridden = false)                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::money::Money;
use crate::types::{Product, UnitType};
use crate::validation::{validate_id, validate_price};

// =============================================================================
// Overrides
// =============================================================================

/// Customer-specific price for one product, as fetched from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPriceOverride {
    pub product_id: String,
    #[serde(default)]
    pub base_unit_override: Option<Money>,
    #[serde(default)]
    pub second_unit_override: Option<Money>,
    /// Inactive overrides are kept by the backend but never applied.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl CustomerPriceOverride {
    /// Override price for `unit_type`, if this entry is active and sets one.
    pub fn price_for(&self, unit_type: UnitType) -> Option<Money> {
        if !self.active {
            return None;
        }
        match unit_type {
            UnitType::Base => self.base_unit_override,
            UnitType::Second => self.second_unit_override,
        }
    }
}

/// All overrides of one customer, keyed by product id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceOverrides {
    customer_id: String,
    by_product: HashMap<String, CustomerPriceOverride>,
}

impl PriceOverrides {
    /// Builds the lookup for `customer_id`.
    ///
    /// A later entry for the same product replaces an earlier one.
    /// Negative or out-of-range override prices are rejected.
    pub fn for_customer(
        customer_id: impl Into<String>,
        overrides: Vec<CustomerPriceOverride>,
    ) -> CoreResult<Self> {
        let customer_id = customer_id.into();
        validate_id("customerId", &customer_id)?;

        let mut by_product = HashMap::with_capacity(overrides.len());
        for entry in overrides {
            validate_id("productId", &entry.product_id)?;
            if let Some(price) = entry.base_unit_override {
                validate_price("baseUnitOverride", price)?;
            }
            if let Some(price) = entry.second_unit_override {
                validate_price("secondUnitOverride", price)?;
            }
            by_product.insert(entry.product_id.clone(), entry);
        }

        Ok(PriceOverrides {
            customer_id,
            by_product,
        })
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    /// Active override price for (product, unit), if any.
    pub fn lookup(&self, product_id: &str, unit_type: UnitType) -> Option<Money> {
        self.by_product
            .get(product_id)
            .and_then(|entry| entry.price_for(unit_type))
    }

    pub fn len(&self) -> usize {
        self.by_product.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_product.is_empty()
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// The price a cart line captures when it is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceResolution {
    pub price: Money,
    pub is_overridden: bool,
}

/// Resolves the effective unit price for `product` sold by `unit_type`.
///
/// ## Example
/// ```rust
/// use routecart_core::pricing::{resolve_price, CustomerPriceOverride, PriceOverrides};
/// use routecart_core::{Money, Product, UnitType};
///
/// let product = Product {
///     id: "p-1".into(), sku: "WATER-500".into(), name: "Water".into(),
///     base_unit: "piece".into(), second_unit: None, units_per_second_unit: 1,
///     stock_in_base_units: 10, base_unit_price: Money::from_cents(200),
///     second_unit_price: Money::zero(), image_url: None, merchant_id: None,
/// };
/// let overrides = PriceOverrides::for_customer("c-1", vec![CustomerPriceOverride {
///     product_id: "p-1".into(),
///     base_unit_override: Some(Money::from_cents(150)),
///     second_unit_override: None,
///     active: true,
/// }]).unwrap();
///
/// let resolved = resolve_price(&product, UnitType::Base, Some(&overrides)).unwrap();
/// assert_eq!(resolved.price.cents(), 150);
/// assert!(resolved.is_overridden);
/// ```
pub fn resolve_price(
    product: &Product,
    unit_type: UnitType,
    overrides: Option<&PriceOverrides>,
) -> CoreResult<PriceResolution> {
    product.ensure_supports(unit_type)?;

    let overridden = overrides.and_then(|o| o.lookup(&product.id, unit_type));

    Ok(match overridden {
        Some(price) => PriceResolution {
            price,
            is_overridden: true,
        },
        None => PriceResolution {
            price: product.catalog_price(unit_type),
            is_overridden: false,
        },
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
