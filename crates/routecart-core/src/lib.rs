//! # routecart-core: Pure Sales Logic for RouteCart
//!
//! Cart, pricing, stock and payment rules shared by the route-sales driver
//! app and the multi-vendor storefront. Everything here is synchronous and
//! free of I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        RouteCart Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Clients (driver app, storefront)                   │   │
//! │  │    Catalog ──► Cart ──► Payment ──► Receipt / Collect Cash      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    routecart-session                            │   │
//! │  │    SaleSession, Backend trait, config, tracing                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ routecart-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │ catalog  │ │ pricing  │ │   cart   │ │ payment  │          │   │
//! │  │   │ Snapshot │ │ Resolver │ │  Lines   │ │Allocator │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │  order   │ │collection│ │  money   │ │validation│          │   │
//! │  │   │  Draft   │ │  Cash in │ │  Cents   │ │  rules   │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Product, Customer, UnitType, PaymentType
//! - [`money`] - Integer-cent money and amount parsing
//! - [`catalog`] - Read-only product snapshot
//! - [`pricing`] - Customer price overrides and price resolution
//! - [`cart`] - Cart lines, shared dual-unit stock, totals
//! - [`payment`] - Cash / credit / split allocation
//! - [`order`] - Order draft, submission body and receipt data
//! - [`collection`] - Cash collection against a customer balance
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level rules
//!
//! ## Example Usage
//!
//! ```rust
//! use routecart_core::cart::Cart;
//! use routecart_core::pricing::resolve_price;
//! use routecart_core::{Money, Product, UnitType};
//!
//! let water = Product {
//!     id: "p-1".into(), sku: "WATER-500".into(), name: "Water 500ml".into(),
//!     base_unit: "piece".into(), second_unit: Some("box".into()),
//!     units_per_second_unit: 5, stock_in_base_units: 10,
//!     base_unit_price: Money::from_cents(200), second_unit_price: Money::from_cents(900),
//!     image_url: None, merchant_id: None,
//! };
//!
//! let mut cart = Cart::new();
//! for _ in 0..3 {
//!     let price = resolve_price(&water, UnitType::Base, None).unwrap();
//!     cart.add_line(&water, UnitType::Base, price).unwrap();
//! }
//! let price = resolve_price(&water, UnitType::Second, None).unwrap();
//! cart.add_line(&water, UnitType::Second, price).unwrap();
//!
//! // 3 pieces + 1 box, and no second box fits in the remaining stock
//! assert_eq!(cart.total(), Money::from_cents(1500));
//! assert_eq!(cart.available_quantity("p-1", UnitType::Second), 1);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod collection;
pub mod error;
pub mod money;
pub mod order;
pub mod payment;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line, whatever the stock says.
///
/// Guards against typing 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest unit price accepted from the catalog or overrides, in cents
/// ($10,000,000.00).
///
/// Keeps `price × MAX_ITEM_QUANTITY × MAX_CART_LINES` well inside `i64`.
pub const MAX_UNIT_PRICE_CENTS: i64 = 1_000_000_000;

/// Maximum length of order and collection notes, in characters.
pub const MAX_NOTES_LEN: usize = 500;
