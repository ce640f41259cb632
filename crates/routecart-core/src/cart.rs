//! # Cart
//!
//! The mutable order draft a driver or shopper builds during a sale.
//!
//! ## Cart Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Tap product ───────► add_line()        ───► new line qty 1, or qty+1   │
//! │                                              (clamped to stock)         │
//! │  +/- buttons ───────► update_quantity() ───► qty+delta, ≤0 removes,     │
//! │                                              over stock is rejected     │
//! │  Typed quantity ────► set_quantity()    ───► same rules as above        │
//! │  Discount field ────► apply_discount()  ───► clamped to [0, unit price] │
//! │  Trash icon ────────► remove_line()     ───► idempotent                 │
//! │  Cancel / submit ok ► clear()                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Shared Stock Between Units
//! A product sold by the piece and by the box draws on ONE stock figure:
//! ```text
//! stock = 10 pieces, box = 5 pieces
//!
//!   piece line: 3  ──► reserves 3 pieces
//!   box line:   ?  ──► floor((10 - 3) / 5) = 1 box available
//!
//!   invariant: piece_qty + box_qty × 5 ≤ 10
//! ```
//! The stock figure and conversion factor are captured when a product first
//! enters the cart, the same way its price is.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::PriceResolution;
use crate::types::{Product, UnitType};
use crate::validation::validate_cart_size;
use crate::{MAX_CART_LINES, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// One (product, unit type) entry of the cart.
///
/// ## Price Freezing
/// `unit_price` is captured when the line is created. Catalog changes do
/// not touch existing lines; only [`Cart::reprice_line`] does, when the
/// customer (and so the override set) changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    /// Unit name at time of adding, e.g. "box".
    pub unit_label: String,
    pub merchant_id: Option<String>,
    pub unit_type: UnitType,
    pub quantity: i64,
    pub unit_price: Money,
    pub is_price_overridden: bool,
    /// Always within `[0, unit_price]`.
    pub per_unit_discount: Money,
}

impl CartLine {
    fn new(product: &Product, unit_type: UnitType, resolution: PriceResolution) -> Self {
        CartLine {
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            unit_label: product.unit_label(unit_type).to_string(),
            merchant_id: product.merchant_id.clone(),
            unit_type,
            quantity: 1,
            unit_price: resolution.price,
            is_price_overridden: resolution.is_overridden,
            per_unit_discount: Money::zero(),
        }
    }

    #[inline]
    fn is(&self, product_id: &str, unit_type: UnitType) -> bool {
        self.unit_type == unit_type && self.product_id == product_id
    }

    /// unit price × quantity
    pub fn line_subtotal(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// per-unit discount × quantity
    pub fn line_discount(&self) -> Money {
        self.per_unit_discount.multiply_quantity(self.quantity)
    }

    pub fn line_total(&self) -> Money {
        self.line_subtotal() - self.line_discount()
    }
}

// =============================================================================
// Line Change
// =============================================================================

/// What a quantity mutation did to its line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineChange {
    /// A new line with quantity 1 was created.
    Inserted,
    /// The line now holds `quantity`.
    Updated { quantity: i64 },
    /// The line was already at its stock ceiling and kept `quantity`.
    AtStockLimit { quantity: i64 },
    /// The quantity dropped to zero or below and the line is gone.
    Removed,
}

// =============================================================================
// Stock Snapshot
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StockSnapshot {
    stock_in_base_units: i64,
    units_per_second_unit: i64,
}

impl StockSnapshot {
    fn of(product: &Product) -> Self {
        StockSnapshot {
            stock_in_base_units: product.stock_in_base_units.max(0),
            units_per_second_unit: product.units_per(UnitType::Second),
        }
    }

    fn units_per(&self, unit_type: UnitType) -> i64 {
        match unit_type {
            UnitType::Base => 1,
            UnitType::Second => self.units_per_second_unit,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart of one sale session.
///
/// ## Invariants
/// - Lines are unique by (product_id, unit_type)
/// - Quantity is always > 0 (dropping to 0 removes the line)
/// - Per product: base_qty + second_qty × factor ≤ stock snapshot
/// - Discount per unit is within [0, unit price]
/// - At most `MAX_CART_LINES` lines, `MAX_ITEM_QUANTITY` per line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    lines: Vec<CartLine>,
    #[serde(skip)]
    stock: HashMap<String, StockSnapshot>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds one unit of `product`, merging with an existing line.
    ///
    /// ## Behavior
    /// - Line exists: quantity + 1, or unchanged when already at the stock
    ///   ceiling (`LineChange::AtStockLimit`, not an error)
    /// - No line yet: new line with quantity 1, discount 0 and the resolved
    ///   price frozen
    ///
    /// ## Errors
    /// - `UnsupportedUnitType` if the product has no such unit
    /// - `StockExceeded` if not even one unit is available for a new line
    /// - `CartTooLarge` if a new line would exceed `MAX_CART_LINES`
    pub fn add_line(
        &mut self,
        product: &Product,
        unit_type: UnitType,
        resolution: PriceResolution,
    ) -> CoreResult<LineChange> {
        product.ensure_supports(unit_type)?;

        let available = self.available_with(&product.id, unit_type, StockSnapshot::of(product));

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.is(&product.id, unit_type))
        {
            if line.quantity >= available {
                return Ok(LineChange::AtStockLimit {
                    quantity: line.quantity,
                });
            }
            line.quantity += 1;
            return Ok(LineChange::Updated {
                quantity: line.quantity,
            });
        }

        if available < 1 {
            return Err(CoreError::StockExceeded {
                sku: product.sku.clone(),
                unit_type,
                available: 0,
                requested: 1,
            });
        }

        if validate_cart_size(self.lines.len()).is_err() {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        self.stock
            .entry(product.id.clone())
            .or_insert_with(|| StockSnapshot::of(product));
        self.lines
            .push(CartLine::new(product, unit_type, resolution));
        Ok(LineChange::Inserted)
    }

    /// Changes a line's quantity by `delta`.
    ///
    /// ## Behavior
    /// - New quantity ≤ 0: the line is removed
    /// - New quantity above available stock: rejected with `StockExceeded`,
    ///   the line keeps its current quantity
    pub fn update_quantity(
        &mut self,
        product_id: &str,
        unit_type: UnitType,
        delta: i64,
    ) -> CoreResult<LineChange> {
        let current = self.require_line(product_id, unit_type)?.quantity;
        let requested = current.saturating_add(delta);

        if requested <= 0 {
            self.remove_line(product_id, unit_type);
            return Ok(LineChange::Removed);
        }

        let available = self.available_quantity(product_id, unit_type);
        let line = self.require_line_mut(product_id, unit_type)?;
        if requested > available {
            return Err(CoreError::StockExceeded {
                sku: line.sku.clone(),
                unit_type,
                available,
                requested,
            });
        }

        line.quantity = requested;
        Ok(LineChange::Updated {
            quantity: requested,
        })
    }

    /// Sets a line's quantity directly (typed entry).
    ///
    /// Same rules as [`Cart::update_quantity`] with the matching delta.
    pub fn set_quantity(
        &mut self,
        product_id: &str,
        unit_type: UnitType,
        quantity: i64,
    ) -> CoreResult<LineChange> {
        let current = self.require_line(product_id, unit_type)?.quantity;
        self.update_quantity(product_id, unit_type, quantity.saturating_sub(current))
    }

    /// Removes a line. Returns whether anything was removed.
    pub fn remove_line(&mut self, product_id: &str, unit_type: UnitType) -> bool {
        let initial_len = self.lines.len();
        self.lines.retain(|l| !l.is(product_id, unit_type));
        let removed = self.lines.len() != initial_len;

        if removed && !self.contains_product(product_id) {
            self.stock.remove(product_id);
        }
        removed
    }

    /// Sets the per-unit discount of a line, clamped to `[0, unit price]`.
    ///
    /// Returns the discount actually applied.
    pub fn apply_discount(
        &mut self,
        product_id: &str,
        unit_type: UnitType,
        per_unit_amount: Money,
    ) -> CoreResult<Money> {
        let line = self.require_line_mut(product_id, unit_type)?;
        let applied = per_unit_amount.clamp_to(Money::zero(), line.unit_price);
        line.per_unit_discount = applied;
        Ok(applied)
    }

    /// Replaces a line's price with a fresh resolution.
    ///
    /// The discount is clamped to the new price. Returns `true` when the
    /// price or override flag changed.
    pub fn reprice_line(
        &mut self,
        product_id: &str,
        unit_type: UnitType,
        resolution: PriceResolution,
    ) -> CoreResult<bool> {
        let line = self.require_line_mut(product_id, unit_type)?;
        let changed =
            line.unit_price != resolution.price || line.is_price_overridden != resolution.is_overridden;

        line.unit_price = resolution.price;
        line.is_price_overridden = resolution.is_overridden;
        line.per_unit_discount = line.per_unit_discount.clamp_to(Money::zero(), line.unit_price);
        Ok(changed)
    }

    /// Clears all lines.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.stock.clear();
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, product_id: &str, unit_type: UnitType) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.is(product_id, unit_type))
    }

    pub fn contains_product(&self, product_id: &str) -> bool {
        self.lines.iter().any(|l| l.product_id == product_id)
    }

    /// Maximum quantity the (product, unit) line may hold right now.
    ///
    /// Accounts for base units already taken by the sibling line of the
    /// same product. Zero for products not in the cart.
    pub fn available_quantity(&self, product_id: &str, unit_type: UnitType) -> i64 {
        match self.stock.get(product_id) {
            Some(&snapshot) => self.available_with(product_id, unit_type, snapshot),
            None => 0,
        }
    }

    /// Maximum quantity a (product, unit) line may hold, using the cart's
    /// snapshot when the product is already in it and `product` otherwise.
    ///
    /// Lets a screen grey out the "add box" control before the first tap.
    pub fn available_for(&self, product: &Product, unit_type: UnitType) -> i64 {
        if !product.supports(unit_type) {
            return 0;
        }
        self.available_with(&product.id, unit_type, StockSnapshot::of(product))
    }

    /// Base units of `product_id` held across both of its lines.
    pub fn base_units_reserved(&self, product_id: &str) -> i64 {
        let Some(snapshot) = self.stock.get(product_id) else {
            return 0;
        };
        self.lines
            .iter()
            .filter(|l| l.product_id == product_id)
            .map(|l| l.quantity * snapshot.units_per(l.unit_type))
            .sum()
    }

    /// Returns the number of lines in the cart.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns the total quantity of all lines (mixed units).
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Σ unit price × quantity
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_subtotal).sum()
    }

    /// Σ per-unit discount × quantity
    pub fn total_discount(&self) -> Money {
        self.lines.iter().map(CartLine::line_discount).sum()
    }

    /// subtotal − total discount
    pub fn total(&self) -> Money {
        self.subtotal() - self.total_discount()
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals::from(self)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    // =========================================================================
    // Multi-vendor Partitions
    // =========================================================================

    /// Merchants present in the cart, in order of first appearance.
    ///
    /// `None` stands for lines without an owning merchant.
    pub fn merchant_ids(&self) -> Vec<Option<&str>> {
        let mut seen: Vec<Option<&str>> = Vec::new();
        for line in &self.lines {
            let merchant = line.merchant_id.as_deref();
            if !seen.contains(&merchant) {
                seen.push(merchant);
            }
        }
        seen
    }

    /// An independent cart holding only one merchant's lines.
    pub fn partition(&self, merchant_id: Option<&str>) -> Cart {
        let lines: Vec<CartLine> = self
            .lines
            .iter()
            .filter(|l| l.merchant_id.as_deref() == merchant_id)
            .cloned()
            .collect();
        let stock = self
            .stock
            .iter()
            .filter(|(product_id, _)| lines.iter().any(|l| &l.product_id == *product_id))
            .map(|(product_id, snapshot)| (product_id.clone(), *snapshot))
            .collect();
        Cart { lines, stock }
    }

    /// One independent cart per merchant, in order of first appearance.
    pub fn partitions(&self) -> Vec<CartPartition> {
        self.merchant_ids()
            .into_iter()
            .map(|merchant| CartPartition {
                merchant_id: merchant.map(str::to_string),
                cart: self.partition(merchant),
            })
            .collect()
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn available_with(&self, product_id: &str, unit_type: UnitType, fallback: StockSnapshot) -> i64 {
        let snapshot = self.stock.get(product_id).copied().unwrap_or(fallback);
        let sibling = unit_type.sibling();
        let reserved_by_sibling = self
            .line(product_id, sibling)
            .map(|l| l.quantity * snapshot.units_per(sibling))
            .unwrap_or(0);
        let free = (snapshot.stock_in_base_units - reserved_by_sibling).max(0);
        (free / snapshot.units_per(unit_type)).min(MAX_ITEM_QUANTITY)
    }

    fn require_line(&self, product_id: &str, unit_type: UnitType) -> CoreResult<&CartLine> {
        self.line(product_id, unit_type)
            .ok_or_else(|| CoreError::LineNotFound {
                product_id: product_id.to_string(),
                unit_type,
            })
    }

    fn require_line_mut(&mut self, product_id: &str, unit_type: UnitType) -> CoreResult<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|l| l.is(product_id, unit_type))
            .ok_or_else(|| CoreError::LineNotFound {
                product_id: product_id.to_string(),
                unit_type,
            })
    }
}

/// One merchant's share of a multi-vendor cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPartition {
    pub merchant_id: Option<String>,
    pub cart: Cart,
}

/// Cart totals summary for client responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub line_count: usize,
    pub total_quantity: i64,
    pub subtotal: Money,
    pub total_discount: Money,
    pub total: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            line_count: cart.line_count(),
            total_quantity: cart.total_quantity(),
            subtotal: cart.subtotal(),
            total_discount: cart.total_discount(),
            total: cart.total(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
