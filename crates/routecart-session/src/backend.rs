//! # Backend Boundary
//!
//! What a sale session needs from the remote API. The host application
//! supplies the implementation (HTTP client, offline queue, test double);
//! this crate ships none.
//!
//! ```text
//! SaleSession::start ────────► load_catalog
//! SaleSession::attach_customer ► load_customer + load_price_overrides
//! SaleSession::checkout ─────► submit_order
//! collect_payment ───────────► load_customer + submit_collection
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use routecart_core::collection::CollectionSubmission;
use routecart_core::order::OrderSubmission;
use routecart_core::pricing::CustomerPriceOverride;
use routecart_core::{Customer, Money, Product};

use crate::error::BackendResult;

/// Remote API used by sale sessions.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Products on sale, optionally limited to one merchant.
    async fn load_catalog(&self, merchant_id: Option<&str>) -> BackendResult<Vec<Product>>;

    async fn load_customer(&self, customer_id: &str) -> BackendResult<Customer>;

    /// Price overrides of a customer. Inactive entries may be included.
    async fn load_price_overrides(
        &self,
        customer_id: &str,
    ) -> BackendResult<Vec<CustomerPriceOverride>>;

    async fn submit_order(&self, order: &OrderSubmission) -> BackendResult<OrderConfirmation>;

    async fn submit_collection(
        &self,
        collection: &CollectionSubmission,
    ) -> BackendResult<CollectionConfirmation>;
}

/// Backend answer to an accepted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub order_id: String,
    /// Human-facing number printed on the receipt, when the backend assigns one.
    #[serde(default)]
    pub order_number: Option<String>,
}

/// Backend answer to an accepted collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CollectionConfirmation {
    pub collection_id: String,
    /// Balance as recorded by the backend after applying the collection.
    #[serde(default)]
    pub new_balance: Option<Money>,
}
