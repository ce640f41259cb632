//! # Money
//!
//! Integer-cent amounts for prices, totals, payments and balances.
//!
//! ## Why Cents?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Floats drift                                                           │
//! │                                                                         │
//! │  Split payment entered in a driver app:                                 │
//! │    total 50.30, cash 20.10 → credit 30.199999999999996  ❌              │
//! │                                                                         │
//! │  Integer cents instead                                                  │
//! │    5030 - 2010 = 3020 cents, and 2010 + 3020 == 5030 exactly           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use routecart_core::money::Money;
//!
//! let price = Money::from_cents(200);          // $2.00
//! let line = price * 3_i64;                    // $6.00
//! let entered: Money = "$9.00".parse().unwrap();
//! assert_eq!((line + entered).cents(), 1500);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// An amount in cents. Serializes as a bare integer.
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.base_unit_price ──┐                                            │
/// │  PriceOverride ────────────┴──► CartLine.unit_price ──► Cart.total      │
/// │                                                                         │
/// │  Cart.total ──► PaymentAllocation { cash_amount, credit_amount }        │
/// │                                                                         │
/// │  Customer.current_balance ──► CollectionSubmission.amount               │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Wraps an amount already expressed in cents, as it arrives on the wire.
    ///
    /// ```rust
    /// use routecart_core::money::Money;
    ///
    /// let box_price = Money::from_cents(900);
    /// assert_eq!(box_price.to_string(), "$9.00");
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Parses an amount typed by a user into cents.
    ///
    /// ## Accepted Input
    /// ```text
    /// "150"        → 15000
    /// "$150"       → 15000
    /// "1,250.5"    → 125050
    /// " 0.99 "     → 99
    /// "-$5.50"     → -550
    ///
    /// ""           → Required
    /// "12.345"     → InvalidFormat (more than two decimals)
    /// "12a"        → InvalidFormat
    /// ```
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, trimmed),
        };
        let rest = rest.strip_prefix('$').unwrap_or(rest);
        let cleaned: String = rest.chars().filter(|c| *c != ',').collect();

        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let (whole, fraction) = match cleaned.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (cleaned.as_str(), ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("must contain digits"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("must be a number"));
        }
        if fraction.len() > 2 {
            return Err(invalid("at most two decimal places"));
        }

        let major: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("amount is too large"))?
        };
        let minor: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid("must be a number"))? * 10,
            _ => fraction.parse().map_err(|_| invalid("must be a number"))?,
        };

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(|| invalid("amount is too large"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Strictly above zero. Collections and split cash parts must be.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Line subtotal: `unit price × quantity`.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Restricts the value to `[min, max]`.
    ///
    /// Per-unit discounts go through this so they never drop below zero
    /// or exceed the unit price they discount.
    ///
    /// ```rust
    /// use routecart_core::money::Money;
    ///
    /// let price = Money::from_cents(200);
    /// assert_eq!(Money::from_cents(500).clamp_to(Money::zero(), price), price);
    /// assert_eq!(Money::from_cents(-5).clamp_to(Money::zero(), price), Money::zero());
    /// ```
    #[inline]
    pub fn clamp_to(self, min: Money, max: Money) -> Self {
        self.max(min).min(max)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// `$12.34` style, used in error messages and logs. Receipts use the
/// store's currency settings instead.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.unsigned_abs();
        if self.0 < 0 {
            f.write_str("-")?;
        }
        write!(f, "${}.{:02}", magnitude / 100, magnitude % 100)
    }
}

impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse(s)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
