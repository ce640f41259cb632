//! # Domain Types
//!
//! Core domain types shared by the driver apps and the storefront.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐   ┌─────────────────┐   ┌─────────────────┐   │
//! │  │      Product        │   │    Customer     │   │   PaymentType   │   │
//! │  │  ─────────────────  │   │  ─────────────  │   │  ─────────────  │   │
//! │  │  id / sku           │   │  id             │   │  Cash           │   │
//! │  │  base_unit          │   │  current_balance│   │  Credit         │   │
//! │  │  second_unit?       │   │  credit_limit   │   │  Split          │   │
//! │  │  units_per_second   │   └─────────────────┘   └─────────────────┘   │
//! │  │  stock_in_base_units│                                               │
//! │  └─────────────────────┘   ┌─────────────────┐                         │
//! │                            │    UnitType     │                         │
//! │                            │  Base  (piece)  │                         │
//! │                            │  Second (box)   │                         │
//! │                            └─────────────────┘                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Unit Stock
//! Stock is always counted in base units. A box of 5 pieces does not have
//! its own stock figure: box availability is `floor(stock / 5)`.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// Unit Type
// =============================================================================

/// The packaging a quantity is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    /// The smallest stock-tracked unit (a piece).
    #[serde(alias = "piece")]
    Base,
    /// The larger packaging unit (a box), convertible via a fixed factor.
    #[serde(alias = "box")]
    Second,
}

impl UnitType {
    /// The other unit of the same product.
    #[inline]
    pub const fn sibling(self) -> UnitType {
        match self {
            UnitType::Base => UnitType::Second,
            UnitType::Second => UnitType::Base,
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitType::Base => write!(f, "base"),
            UnitType::Second => write!(f, "second"),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product as supplied by the backend snapshot.
///
/// ## Wire Shape
/// ```json
/// {
///   "productId": "p-1", "sku": "WATER-500", "name": "Water 500ml",
///   "baseUnit": "piece", "secondUnit": "box", "unitsPerSecondUnit": 5,
///   "stockInBaseUnits": 10, "baseUnitPrice": 200, "secondUnitPrice": 900
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "productId")]
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name shown in the cart and on receipts.
    #[serde(default)]
    pub name: String,

    /// Name of the base unit ("piece", "bottle", ...).
    pub base_unit: String,

    /// Name of the second unit ("box", "crate", ...), when sold that way.
    #[serde(default)]
    pub second_unit: Option<String>,

    /// How many base units one second unit contains.
    #[serde(default = "default_units_per_second_unit")]
    pub units_per_second_unit: i64,

    /// Read-only stock snapshot, in base units.
    pub stock_in_base_units: i64,

    pub base_unit_price: Money,

    #[serde(default)]
    pub second_unit_price: Money,

    #[serde(default)]
    pub image_url: Option<String>,

    /// Owning merchant for multi-vendor storefront carts.
    #[serde(default)]
    pub merchant_id: Option<String>,
}

fn default_units_per_second_unit() -> i64 {
    1
}

impl Product {
    /// Checks whether the product can be sold by `unit_type`.
    pub fn supports(&self, unit_type: UnitType) -> bool {
        match unit_type {
            UnitType::Base => true,
            UnitType::Second => self.second_unit.is_some() && self.units_per_second_unit >= 1,
        }
    }

    /// Fails with `UnsupportedUnitType` when the unit is not defined.
    pub fn ensure_supports(&self, unit_type: UnitType) -> CoreResult<()> {
        if self.supports(unit_type) {
            Ok(())
        } else {
            Err(CoreError::UnsupportedUnitType {
                sku: self.sku.clone(),
                unit_type,
            })
        }
    }

    /// Base units contained in one `unit_type`.
    #[inline]
    pub fn units_per(&self, unit_type: UnitType) -> i64 {
        match unit_type {
            UnitType::Base => 1,
            UnitType::Second => self.units_per_second_unit.max(1),
        }
    }

    /// Catalog (non-overridden) price for one `unit_type`.
    #[inline]
    pub fn catalog_price(&self, unit_type: UnitType) -> Money {
        match unit_type {
            UnitType::Base => self.base_unit_price,
            UnitType::Second => self.second_unit_price,
        }
    }

    /// Unit name for display, e.g. "box".
    pub fn unit_label(&self, unit_type: UnitType) -> &str {
        match unit_type {
            UnitType::Base => &self.base_unit,
            UnitType::Second => self.second_unit.as_deref().unwrap_or(&self.base_unit),
        }
    }

    /// Whole `unit_type` quantities the stock snapshot covers, ignoring any cart.
    ///
    /// ```rust
    /// # use routecart_core::{Money, Product, UnitType};
    /// let product = Product {
    ///     id: "p-1".into(), sku: "WATER-500".into(), name: "Water".into(),
    ///     base_unit: "piece".into(), second_unit: Some("box".into()),
    ///     units_per_second_unit: 5, stock_in_base_units: 12,
    ///     base_unit_price: Money::from_cents(200), second_unit_price: Money::from_cents(900),
    ///     image_url: None, merchant_id: None,
    /// };
    /// assert_eq!(product.availability(UnitType::Base), 12);
    /// assert_eq!(product.availability(UnitType::Second), 2);
    /// ```
    pub fn availability(&self, unit_type: UnitType) -> i64 {
        if !self.supports(unit_type) {
            return 0;
        }
        self.stock_in_base_units.max(0) / self.units_per(unit_type)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A billed customer (shop, outlet or storefront account).
///
/// Read-only for the engine: balances change server-side when an order or
/// collection is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Outstanding debt.
    pub current_balance: Money,
    pub credit_limit: Money,
}

impl Customer {
    /// Credit still available before reaching the limit (never negative).
    pub fn available_credit(&self) -> Money {
        let available = self.credit_limit - self.current_balance;
        if available.is_negative() {
            Money::zero()
        } else {
            available
        }
    }
}

// =============================================================================
// Payment Type
// =============================================================================

/// How an order is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// Paid in full on the spot.
    #[default]
    Cash,
    /// Added in full to the customer's debt.
    Credit,
    /// Part cash, remainder on credit.
    Split,
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentType::Cash => write!(f, "cash"),
            PaymentType::Credit => write!(f, "credit"),
            PaymentType::Split => write!(f, "split"),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
