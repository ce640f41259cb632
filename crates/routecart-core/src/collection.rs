//! # Cash Collection
//!
//! Validates a payment collected against a customer's outstanding balance
//! (the "collect cash" screens of the driver apps).
//!
//! ```text
//! amount ≤ 0             ──► NonPositiveAmount
//! amount > balance       ──► AmountExceedsBalance
//! check without number   ──► Validation(Required)
//! otherwise              ──► CollectionSubmission (balance_after = balance - amount)
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Customer;
use crate::validation::{normalize_notes, validate_check_number};

/// How the collected amount was paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "paymentType", rename_all = "snake_case")]
pub enum CollectionMethod {
    Cash,
    Check {
        #[serde(rename = "checkNumber")]
        check_number: String,
    },
}

/// Checks a collected amount against what the customer owes.
pub fn validate_collection_amount(amount: Money, customer: &Customer) -> CoreResult<()> {
    if !amount.is_positive() {
        return Err(CoreError::NonPositiveAmount { amount });
    }

    if amount > customer.current_balance {
        return Err(CoreError::AmountExceedsBalance {
            amount,
            balance: customer.current_balance,
        });
    }

    Ok(())
}

/// A validated collection, in the shape the collection endpoint expects.
///
/// ```json
/// { "customerId": "c-1", "amount": 12000, "paymentType": "check",
///   "checkNumber": "000123", "notes": "paid at counter" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSubmission {
    pub customer_id: String,
    pub amount: Money,
    #[serde(flatten)]
    pub method: CollectionMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Balance the customer will owe once the backend accepts this.
    #[serde(skip)]
    pub balance_after: Money,
}

impl CollectionSubmission {
    /// Validates and builds a collection for `customer`.
    pub fn new(
        customer: &Customer,
        amount: Money,
        method: CollectionMethod,
        notes: Option<&str>,
    ) -> CoreResult<Self> {
        validate_collection_amount(amount, customer)?;

        let method = match method {
            CollectionMethod::Cash => CollectionMethod::Cash,
            CollectionMethod::Check { check_number } => CollectionMethod::Check {
                check_number: validate_check_number(&check_number)?,
            },
        };

        Ok(CollectionSubmission {
            customer_id: customer.id.clone(),
            amount,
            method,
            notes: normalize_notes(notes)?,
            balance_after: customer.current_balance - amount,
        })
    }

    /// Whether this collection settles the whole balance.
    pub fn settles_balance(&self) -> bool {
        self.balance_after.is_zero()
    }
}
