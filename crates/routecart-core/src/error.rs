//! # Error Types
//!
//! Domain-specific error types for routecart-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  routecart-core errors (this file)                                      │
//! │  ├── CoreError        - Cart, pricing, payment and draft faults         │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  routecart-session errors (separate crate)                              │
//! │  ├── SessionError     - Core faults + backend/config failures           │
//! │  └── ApiError         - What the client apps see (serialized)           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SessionError → ApiError → Screen   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant is a rejected operation. None of them is fatal and none
//! leaves the cart or allocator half-updated.

use thiserror::Error;

use crate::money::Money;
use crate::types::UnitType;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Raised synchronously by the engine and surfaced to the caller for
/// user-facing messaging. The engine never retries any of them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Product id is not part of the catalog snapshot.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// The product has no such unit (e.g. no box packaging defined).
    ///
    /// ## When This Occurs
    /// The screen offered a "box" control for a piece-only product.
    /// Callers should check `Product::supports` before showing the control.
    #[error("Product {sku} cannot be sold by the {unit_type} unit")]
    UnsupportedUnitType { sku: String, unit_type: UnitType },

    /// Requested quantity is above what the stock snapshot allows.
    ///
    /// ## User Workflow
    /// ```text
    /// Stock: 10 pieces, 3 pieces already in cart, box = 5 pieces
    ///      │
    ///      ▼
    /// update_quantity(box, +2)  → requested 2 boxes = 10 pieces
    ///      │
    ///      ▼
    /// StockExceeded { available: 1, requested: 2 }
    ///      │
    ///      ▼
    /// UI shows: "Only 1 box of WATER-500 available"
    /// ```
    #[error("Insufficient stock for {sku} ({unit_type}): available {available}, requested {requested}")]
    StockExceeded {
        sku: String,
        unit_type: UnitType,
        available: i64,
        requested: i64,
    },

    /// Cart line for (product, unit) does not exist.
    #[error("Product {product_id} ({unit_type}) is not in the cart")]
    LineNotFound {
        product_id: String,
        unit_type: UnitType,
    },

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Split cash amount must be strictly between zero and the total.
    #[error("Split cash amount {cash_amount} must be greater than zero and less than the total {total}")]
    InvalidSplitAmount { cash_amount: Money, total: Money },

    /// A collected amount of zero or less.
    #[error("Amount must be greater than zero, got {amount}")]
    NonPositiveAmount { amount: Money },

    /// Collected amount is larger than what the customer owes.
    #[error("Amount {amount} exceeds the customer's outstanding balance {balance}")]
    AmountExceedsBalance { amount: Money, balance: Money },

    /// Credit portion would push the customer past their credit limit.
    #[error("Credit of {requested} exceeds available credit {available}")]
    CreditLimitExceeded { requested: Money, available: Money },

    /// Drafts cannot be built from an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// The order is billed to a customer but none is attached.
    #[error("A customer must be selected for this order")]
    NoCustomerSelected,

    /// The payment allocation was computed for a different total.
    ///
    /// ## When This Occurs
    /// The cart was edited after the payment step computed its split.
    #[error("Payment covers {allocated} but the cart total is {cart_total}")]
    AllocationMismatch { allocated: Money, cart_total: Money },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for boundary data (catalog snapshots, typed amounts, check numbers)
/// before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., malformed amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate product id in a snapshot).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
