//! # Cash Collection
//!
//! Collects a payment against a customer's outstanding balance, outside of
//! any sale. The customer is re-read from the backend first so the amount
//! is checked against the current balance.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use ts_rs::TS;

use routecart_core::collection::{CollectionMethod, CollectionSubmission};
use routecart_core::validation::validate_id;
use routecart_core::{CoreError, Money};

use crate::backend::Backend;
use crate::error::SessionResult;

/// Receipt of a collection the backend accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CollectionReceipt {
    pub collection_id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub amount: Money,
    pub method: CollectionMethod,
    pub balance_before: Money,
    pub balance_after: Money,
    #[ts(type = "string")]
    pub collected_at: DateTime<Utc>,
}

/// Validates and submits a collection for `customer_id`.
///
/// ## Errors
/// - `NonPositiveAmount`, `AmountExceedsBalance`, `Validation` from the
///   collection rules (nothing is sent)
/// - `Backend` when loading the customer or submitting fails
pub async fn collect_payment<B>(
    backend: &B,
    customer_id: &str,
    amount: Money,
    method: CollectionMethod,
    notes: Option<&str>,
) -> SessionResult<CollectionReceipt>
where
    B: Backend + ?Sized,
{
    validate_id("customerId", customer_id).map_err(CoreError::from)?;
    let customer = backend.load_customer(customer_id).await?;

    let submission = match CollectionSubmission::new(&customer, amount, method, notes) {
        Ok(submission) => submission,
        Err(e) => {
            warn!(customer_id, %amount, error = %e, "Collection rejected");
            return Err(e.into());
        }
    };
    debug!(
        customer_id,
        %amount,
        balance = %customer.current_balance,
        "Submitting collection"
    );

    let confirmation = match backend.submit_collection(&submission).await {
        Ok(confirmation) => confirmation,
        Err(e) => {
            warn!(customer_id, error = %e, "Collection submission failed");
            return Err(e.into());
        }
    };

    let balance_after = confirmation
        .new_balance
        .unwrap_or(submission.balance_after);
    info!(
        customer_id,
        collection_id = %confirmation.collection_id,
        %amount,
        %balance_after,
        settled = balance_after.is_zero(),
        "Collection accepted"
    );

    Ok(CollectionReceipt {
        collection_id: confirmation.collection_id,
        customer_id: customer.id,
        customer_name: customer.name,
        amount,
        method: submission.method,
        balance_before: customer.current_balance,
        balance_after,
        collected_at: Utc::now(),
    })
}
