//! # Payment Allocator
//!
//! Splits a cart total across cash, credit, or a mix of both.
//!
//! ## Method Selection State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │          select(Cash)             select(Credit)                        │
//! │   ┌──────────────────────┐  ┌──────────────────────┐                    │
//! │   ▼                      │  ▼                      │                    │
//! │ ┌──────┐  select(Credit) ┌────────┐ select(Split) ┌───────┐             │
//! │ │ CASH │ ──────────────► │ CREDIT │ ────────────► │ SPLIT │             │
//! │ └──────┘ ◄───────────────└────────┘ ◄──────────── └───────┘             │
//! │  cash = total            cash = 0                 cash = last entry     │
//! │                                                   (user types amount)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Output Invariant
//! `cash_amount + credit_amount == total`, exactly, in integer cents.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Customer, PaymentType};

// =============================================================================
// Payment Allocation
// =============================================================================

/// Cash/credit amounts of a split. Only constructible through
/// [`SplitAmounts::new`], so `0 < cash < total` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitAmounts {
    cash_amount: Money,
    credit_amount: Money,
}

impl SplitAmounts {
    /// Fails with `InvalidSplitAmount` unless `0 < cash_amount < total`.
    pub fn new(total: Money, cash_amount: Money) -> CoreResult<Self> {
        if !cash_amount.is_positive() || cash_amount >= total {
            return Err(CoreError::InvalidSplitAmount { cash_amount, total });
        }
        Ok(SplitAmounts {
            cash_amount,
            credit_amount: total - cash_amount,
        })
    }

    pub fn cash_amount(&self) -> Money {
        self.cash_amount
    }

    pub fn credit_amount(&self) -> Money {
        self.credit_amount
    }
}

/// How an order total is settled.
///
/// A closed union: a split without its amounts, or a cash payment with a
/// credit portion, cannot be expressed.
///
/// ## Serialization
/// ```json
/// { "paymentType": "split", "cashAmount": 2000, "creditAmount": 3000 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "AllocationSummary")]
pub enum PaymentAllocation {
    Cash { total: Money },
    Credit { total: Money },
    Split(SplitAmounts),
}

impl PaymentAllocation {
    pub fn payment_type(&self) -> PaymentType {
        match self {
            PaymentAllocation::Cash { .. } => PaymentType::Cash,
            PaymentAllocation::Credit { .. } => PaymentType::Credit,
            PaymentAllocation::Split(_) => PaymentType::Split,
        }
    }

    pub fn cash_amount(&self) -> Money {
        match self {
            PaymentAllocation::Cash { total } => *total,
            PaymentAllocation::Credit { .. } => Money::zero(),
            PaymentAllocation::Split(split) => split.cash_amount,
        }
    }

    pub fn credit_amount(&self) -> Money {
        match self {
            PaymentAllocation::Cash { .. } => Money::zero(),
            PaymentAllocation::Credit { total } => *total,
            PaymentAllocation::Split(split) => split.credit_amount,
        }
    }

    /// The total this allocation settles.
    pub fn total(&self) -> Money {
        self.cash_amount() + self.credit_amount()
    }

    /// Whether any part of the order lands on the customer's account.
    pub fn has_credit(&self) -> bool {
        self.credit_amount().is_positive()
    }

    pub fn summary(&self) -> AllocationSummary {
        AllocationSummary::from(*self)
    }
}

/// Flat view of a [`PaymentAllocation`] for clients and receipts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSummary {
    pub payment_type: PaymentType,
    pub cash_amount: Money,
    pub credit_amount: Money,
}

impl From<PaymentAllocation> for AllocationSummary {
    fn from(allocation: PaymentAllocation) -> Self {
        AllocationSummary {
            payment_type: allocation.payment_type(),
            cash_amount: allocation.cash_amount(),
            credit_amount: allocation.credit_amount(),
        }
    }
}

// =============================================================================
// Allocator
// =============================================================================

/// Payment step state of one sale session.
///
/// ## Usage
/// ```rust
/// use routecart_core::payment::PaymentAllocator;
/// use routecart_core::{Money, PaymentType};
///
/// let total = Money::from_cents(5000);
/// let mut allocator = PaymentAllocator::new();
/// allocator.select(PaymentType::Split, total);
/// allocator.set_cash_amount(Money::from_cents(2000));
///
/// let allocation = allocator.allocate(total).unwrap();
/// assert_eq!(allocation.credit_amount().cents(), 3000);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentAllocator {
    method: PaymentType,
    cash_amount: Money,
}

impl PaymentAllocator {
    /// Starts on cash with no amount entered.
    pub fn new() -> Self {
        PaymentAllocator::default()
    }

    pub fn method(&self) -> PaymentType {
        self.method
    }

    /// Cash amount as currently shown in the payment form.
    pub fn cash_amount(&self) -> Money {
        self.cash_amount
    }

    /// Switches the payment method.
    ///
    /// ## Transitions
    /// - Cash: cash amount becomes `total`
    /// - Credit: cash amount becomes zero
    /// - Split: cash amount keeps its last value
    pub fn select(&mut self, method: PaymentType, total: Money) {
        self.method = method;
        match method {
            PaymentType::Cash => self.cash_amount = total,
            PaymentType::Credit => self.cash_amount = Money::zero(),
            PaymentType::Split => {}
        }
    }

    /// Records the cash part typed for a split payment.
    ///
    /// Cash and credit allocations always derive their amounts from the
    /// total, so this only matters while split is selected.
    pub fn set_cash_amount(&mut self, amount: Money) {
        self.cash_amount = amount;
    }

    /// Checks the current selection against `total`.
    ///
    /// Cash and credit are always valid; split needs `0 < cash < total`.
    pub fn validate(&self, total: Money) -> CoreResult<()> {
        self.allocate(total).map(|_| ())
    }

    /// Produces the allocation for `total`.
    pub fn allocate(&self, total: Money) -> CoreResult<PaymentAllocation> {
        match self.method {
            PaymentType::Cash => Ok(PaymentAllocation::Cash { total }),
            PaymentType::Credit => Ok(PaymentAllocation::Credit { total }),
            PaymentType::Split => {
                SplitAmounts::new(total, self.cash_amount).map(PaymentAllocation::Split)
            }
        }
    }

    /// Back to cash with no amount, ready for the next sale.
    pub fn reset(&mut self) {
        *self = PaymentAllocator::default();
    }
}

/// Rejects an allocation whose credit portion exceeds the customer's
/// remaining credit (`credit_limit - current_balance`).
///
/// Cash-only allocations always pass.
pub fn check_credit_limit(allocation: &PaymentAllocation, customer: &Customer) -> CoreResult<()> {
    let requested = allocation.credit_amount();
    if !requested.is_positive() {
        return Ok(());
    }

    let available = customer.available_credit();
    if requested > available {
        return Err(CoreError::CreditLimitExceeded {
            requested,
            available,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
