//! # Sale Session
//!
//! One sale from first tap to accepted order. Owns the catalog snapshot,
//! the cart and the payment step; the host keeps the session value and
//! passes its backend into the async calls.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  start(backend) ──► catalog loaded                                      │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  attach_customer(backend, id) ──► customer + price overrides            │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  add / update_quantity / apply_discount / remove   (sync, pure core)    │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  select_payment / set_cash_amount                                       │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  checkout(backend) ──┬── accepted ──► receipt, cart + payment cleared   │
//! │                      └── failed ────► error, cart + payment untouched   │
//! │                                                                         │
//! │  cancel() ──► cart + payment cleared, customer kept                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use routecart_core::cart::{Cart, CartTotals, LineChange};
use routecart_core::catalog::CatalogSnapshot;
use routecart_core::order::{self, Fulfillment, OrderDraft, OrderMetadata, ReceiptSummary};
use routecart_core::payment::{check_credit_limit, PaymentAllocation, PaymentAllocator};
use routecart_core::pricing::{resolve_price, PriceOverrides};
use routecart_core::validation::{normalize_notes, validate_id};
use routecart_core::{CoreError, Customer, Money, PaymentType, Product, UnitType, ValidationError};

use crate::backend::{Backend, OrderConfirmation};
use crate::config::{FulfillmentMode, SessionConfig};
use crate::error::{ApiError, SessionError, SessionResult};

// =============================================================================
// Receipts
// =============================================================================

/// Receipt of an order the backend accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub session_id: String,
    pub order_id: String,
    pub order_number: Option<String>,
    pub store_name: String,
    /// Set for multi-merchant checkouts.
    pub merchant_id: Option<String>,
    #[ts(type = "string")]
    pub completed_at: DateTime<Utc>,
    /// Total formatted with the configured currency.
    pub formatted_total: String,
    pub summary: ReceiptSummary,
}

/// Outcome of [`SaleSession::checkout_by_merchant`].
///
/// Merchant orders are submitted one by one. Submission stops at the first
/// failure; the lines of that merchant and of those not yet submitted stay
/// in the cart so the checkout can be retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MerchantCheckout {
    pub receipts: Vec<CheckoutReceipt>,
    pub failure: Option<MerchantFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MerchantFailure {
    pub merchant_id: Option<String>,
    pub error: ApiError,
}

impl MerchantCheckout {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

// =============================================================================
// Sale Session
// =============================================================================

#[derive(Debug)]
pub struct SaleSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    config: SessionConfig,
    catalog: CatalogSnapshot,
    cart: Cart,
    payment: PaymentAllocator,
    customer: Option<Customer>,
    overrides: Option<PriceOverrides>,
    /// `None` falls back to the configured default.
    fulfillment: Option<Fulfillment>,
    notes: Option<String>,
}

impl SaleSession {
    /// Loads the catalog and opens a session.
    ///
    /// `merchant_id` limits the catalog to one merchant (storefront pages).
    pub async fn start<B>(
        backend: &B,
        config: SessionConfig,
        merchant_id: Option<&str>,
    ) -> SessionResult<Self>
    where
        B: Backend + ?Sized,
    {
        let products = backend.load_catalog(merchant_id).await?;
        let catalog = CatalogSnapshot::new(products)?;
        Ok(Self::with_catalog(config, catalog))
    }

    /// Opens a session over an already loaded catalog.
    pub fn with_catalog(config: SessionConfig, catalog: CatalogSnapshot) -> Self {
        let session = SaleSession {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            config,
            catalog,
            cart: Cart::new(),
            payment: PaymentAllocator::new(),
            customer: None,
            overrides: None,
            fulfillment: None,
            notes: None,
        };
        info!(
            session_id = %session.id,
            store_id = %session.config.store_id(),
            products = session.catalog.len(),
            "Sale session started"
        );
        session
    }

    // =========================================================================
    // Customer
    // =========================================================================

    /// Attaches a customer and loads their price overrides.
    ///
    /// Lines already in the cart are repriced against the new overrides.
    pub async fn attach_customer<B>(
        &mut self,
        backend: &B,
        customer_id: &str,
    ) -> SessionResult<&Customer>
    where
        B: Backend + ?Sized,
    {
        validate_id("customerId", customer_id).map_err(CoreError::from)?;

        let (customer, overrides) = tokio::try_join!(
            backend.load_customer(customer_id),
            backend.load_price_overrides(customer_id),
        )?;
        let overrides = PriceOverrides::for_customer(customer.id.clone(), overrides)?;

        debug!(
            session_id = %self.id,
            customer_id = %customer.id,
            overrides = overrides.len(),
            lines_kept = self.cart.line_count(),
            "Customer attached"
        );

        self.overrides = Some(overrides);
        self.reprice_lines();
        Ok(&*self.customer.insert(customer))
    }

    /// Drops the customer and their overrides.
    ///
    /// Cart lines are kept and go back to catalog prices.
    pub fn detach_customer(&mut self) -> Option<Customer> {
        self.overrides = None;
        let customer = self.customer.take();
        if let Some(c) = &customer {
            debug!(session_id = %self.id, customer_id = %c.id, "Customer detached");
            self.reprice_lines();
        }
        customer
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Adds one unit of a catalog product at its resolved price.
    pub fn add(&mut self, product_id: &str, unit_type: UnitType) -> SessionResult<LineChange> {
        let product = self
            .catalog
            .require(product_id)
            .map_err(|e| rejected("add", e))?;
        let resolution = resolve_price(product, unit_type, self.overrides.as_ref())
            .map_err(|e| rejected("add", e))?;
        let change = self
            .cart
            .add_line(product, unit_type, resolution)
            .map_err(|e| rejected("add", e))?;

        match change {
            LineChange::AtStockLimit { quantity } => warn!(
                product_id,
                %unit_type,
                quantity,
                "Add ignored, line already at stock limit"
            ),
            _ => debug!(
                product_id,
                %unit_type,
                price = %resolution.price,
                overridden = resolution.is_overridden,
                ?change,
                "Added to cart"
            ),
        }
        Ok(change)
    }

    pub fn update_quantity(
        &mut self,
        product_id: &str,
        unit_type: UnitType,
        delta: i64,
    ) -> SessionResult<LineChange> {
        let change = self
            .cart
            .update_quantity(product_id, unit_type, delta)
            .map_err(|e| rejected("update_quantity", e))?;
        debug!(product_id, %unit_type, delta, ?change, "Quantity updated");
        Ok(change)
    }

    pub fn set_quantity(
        &mut self,
        product_id: &str,
        unit_type: UnitType,
        quantity: i64,
    ) -> SessionResult<LineChange> {
        let change = self
            .cart
            .set_quantity(product_id, unit_type, quantity)
            .map_err(|e| rejected("set_quantity", e))?;
        debug!(product_id, %unit_type, quantity, ?change, "Quantity set");
        Ok(change)
    }

    pub fn remove(&mut self, product_id: &str, unit_type: UnitType) -> bool {
        let removed = self.cart.remove_line(product_id, unit_type);
        debug!(product_id, %unit_type, removed, "Line removed");
        removed
    }

    /// Sets a per-unit discount. Returns the amount actually applied.
    pub fn apply_discount(
        &mut self,
        product_id: &str,
        unit_type: UnitType,
        per_unit_amount: Money,
    ) -> SessionResult<Money> {
        let applied = self
            .cart
            .apply_discount(product_id, unit_type, per_unit_amount)
            .map_err(|e| rejected("apply_discount", e))?;

        if applied != per_unit_amount {
            warn!(
                product_id,
                %unit_type,
                requested = %per_unit_amount,
                %applied,
                "Discount clamped"
            );
        } else {
            debug!(product_id, %unit_type, %applied, "Discount applied");
        }
        Ok(applied)
    }

    /// How many of this (product, unit) the cart may hold right now.
    pub fn available(&self, product_id: &str, unit_type: UnitType) -> SessionResult<i64> {
        let product = self.catalog.require(product_id)?;
        Ok(self.cart.available_for(product, unit_type))
    }

    pub fn search(&self, query: &str) -> Vec<&Product> {
        self.catalog.search(query)
    }

    // =========================================================================
    // Payment
    // =========================================================================

    pub fn select_payment(&mut self, method: PaymentType) {
        self.payment.select(method, self.cart.total());
        debug!(session_id = %self.id, %method, cash = %self.payment.cash_amount(), "Payment method selected");
    }

    pub fn set_cash_amount(&mut self, amount: Money) {
        self.payment.set_cash_amount(amount);
        debug!(session_id = %self.id, cash = %amount, "Cash amount entered");
    }

    /// Parses a typed amount ("$20", "1,250.50") into the cash field.
    pub fn enter_cash_amount(&mut self, input: &str) -> SessionResult<Money> {
        let amount = Money::parse(input).map_err(|e| rejected("enter_cash_amount", e.into()))?;
        self.set_cash_amount(amount);
        Ok(amount)
    }

    /// Allocation of the current cart total under the selected method.
    ///
    /// Applies the credit limit when the configuration enforces it.
    pub fn allocation(&self) -> SessionResult<PaymentAllocation> {
        let allocation = self
            .payment
            .allocate(self.cart.total())
            .map_err(|e| rejected("allocate", e))?;

        if self.config.checkout.enforce_credit_limit {
            if let Some(customer) = &self.customer {
                check_credit_limit(&allocation, customer).map_err(|e| rejected("allocate", e))?;
            }
        }
        Ok(allocation)
    }

    // =========================================================================
    // Order
    // =========================================================================

    pub fn set_fulfillment(&mut self, fulfillment: Fulfillment) -> SessionResult<()> {
        if let Fulfillment::Delivery { address } = &fulfillment {
            if address.trim().is_empty() {
                return Err(CoreError::from(ValidationError::Required {
                    field: "deliveryAddress".to_string(),
                })
                .into());
            }
        }
        debug!(session_id = %self.id, ?fulfillment, "Fulfillment set");
        self.fulfillment = Some(fulfillment);
        Ok(())
    }

    pub fn set_notes(&mut self, notes: Option<&str>) -> SessionResult<()> {
        self.notes = normalize_notes(notes).map_err(CoreError::from)?;
        Ok(())
    }

    /// Draft of the order as it would be submitted now.
    pub fn draft(&self) -> SessionResult<OrderDraft> {
        if self.cart.is_empty() {
            return Err(rejected("draft", CoreError::EmptyCart));
        }
        let allocation = self.allocation()?;
        let metadata = self.metadata()?;
        order::build(&self.cart, &allocation, &metadata).map_err(|e| rejected("draft", e))
    }

    /// Submits the order.
    ///
    /// On success the cart and payment step are cleared for the next sale.
    /// On any failure both are left exactly as they were.
    pub async fn checkout<B>(&mut self, backend: &B) -> SessionResult<CheckoutReceipt>
    where
        B: Backend + ?Sized,
    {
        let draft = self.draft()?;
        let submission = draft.submission();
        debug!(
            session_id = %self.id,
            items = submission.items.len(),
            payment_type = %submission.payment_type,
            "Submitting order"
        );

        let confirmation = match backend.submit_order(&submission).await {
            Ok(confirmation) => confirmation,
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Order submission failed, cart kept");
                return Err(e.into());
            }
        };

        let receipt = self.receipt(&draft, confirmation, None);
        info!(
            session_id = %self.id,
            order_id = %receipt.order_id,
            total = %receipt.formatted_total,
            payment_type = %draft.payment.payment_type,
            "Order accepted"
        );

        if draft.payment.credit_amount.is_positive() {
            self.refresh_customer(backend, draft.payment.credit_amount).await;
        }
        self.reset_sale();
        Ok(receipt)
    }

    /// Submits one order per merchant in the cart.
    ///
    /// Every draft is built before anything is sent, so rule violations
    /// fail the whole checkout up front. Split payments are only allowed
    /// for single-merchant carts.
    pub async fn checkout_by_merchant<B>(&mut self, backend: &B) -> SessionResult<MerchantCheckout>
    where
        B: Backend + ?Sized,
    {
        if self.cart.is_empty() {
            return Err(rejected("checkout_by_merchant", CoreError::EmptyCart));
        }

        let partitions = self.cart.partitions();
        if partitions.len() > 1 && self.payment.method() == PaymentType::Split {
            warn!(session_id = %self.id, merchants = partitions.len(), "Split payment across merchants");
            return Err(SessionError::SplitAcrossMerchants {
                merchants: partitions.len(),
            });
        }

        // Credit limit applies to the whole sale
        self.allocation()?;
        let metadata = self.metadata()?;

        let mut drafts = Vec::with_capacity(partitions.len());
        for partition in &partitions {
            let allocation = self
                .payment
                .allocate(partition.cart.total())
                .map_err(|e| rejected("checkout_by_merchant", e))?;
            let draft = order::build(&partition.cart, &allocation, &metadata)
                .map_err(|e| rejected("checkout_by_merchant", e))?;
            drafts.push((partition.merchant_id.clone(), draft));
        }

        let mut receipts = Vec::with_capacity(drafts.len());
        let mut failure = None;
        let mut credit_extended = Money::zero();
        for (merchant_id, draft) in drafts {
            match backend.submit_order(&draft.submission()).await {
                Ok(confirmation) => {
                    for item in &draft.items {
                        self.cart.remove_line(&item.product_id, item.unit_type);
                    }
                    info!(
                        session_id = %self.id,
                        merchant_id = ?merchant_id,
                        order_id = %confirmation.order_id,
                        "Merchant order accepted"
                    );
                    credit_extended += draft.payment.credit_amount;
                    receipts.push(self.receipt(&draft, confirmation, merchant_id));
                }
                Err(e) => {
                    warn!(
                        session_id = %self.id,
                        merchant_id = ?merchant_id,
                        error = %e,
                        accepted = receipts.len(),
                        "Merchant order failed, remaining lines kept"
                    );
                    failure = Some(MerchantFailure {
                        merchant_id,
                        error: e.into(),
                    });
                    break;
                }
            }
        }

        if credit_extended.is_positive() {
            self.refresh_customer(backend, credit_extended).await;
        }
        if failure.is_none() {
            self.reset_sale();
        }
        Ok(MerchantCheckout { receipts, failure })
    }

    /// Abandons the sale. The customer stays attached.
    pub fn cancel(&mut self) {
        info!(session_id = %self.id, lines = self.cart.line_count(), "Sale cancelled");
        self.reset_sale();
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn catalog(&self) -> &CatalogSnapshot {
        &self.catalog
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn totals(&self) -> CartTotals {
        self.cart.totals()
    }

    pub fn payment(&self) -> &PaymentAllocator {
        &self.payment
    }

    pub fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn metadata(&self) -> SessionResult<OrderMetadata> {
        let fulfillment = match &self.fulfillment {
            Some(fulfillment) => fulfillment.clone(),
            None => match self.config.checkout.default_fulfillment {
                FulfillmentMode::Pickup => Fulfillment::Pickup,
                FulfillmentMode::Delivery => {
                    return Err(CoreError::from(ValidationError::Required {
                        field: "deliveryAddress".to_string(),
                    })
                    .into())
                }
            },
        };

        Ok(OrderMetadata {
            customer_id: self.customer.as_ref().map(|c| c.id.clone()),
            requires_customer: self.config.checkout.require_customer,
            fulfillment,
            notes: self.notes.clone(),
        })
    }

    fn receipt(
        &self,
        draft: &OrderDraft,
        confirmation: OrderConfirmation,
        merchant_id: Option<String>,
    ) -> CheckoutReceipt {
        CheckoutReceipt {
            session_id: self.id.to_string(),
            order_id: confirmation.order_id,
            order_number: confirmation.order_number,
            store_name: self.config.store.name.clone(),
            merchant_id,
            completed_at: Utc::now(),
            formatted_total: self.config.format_money(draft.total),
            summary: draft.receipt(),
        }
    }

    /// Re-resolves every line against the current override set.
    fn reprice_lines(&mut self) -> usize {
        let keys: Vec<(String, UnitType)> = self
            .cart
            .lines()
            .iter()
            .map(|line| (line.product_id.clone(), line.unit_type))
            .collect();

        let mut repriced = 0;
        for (product_id, unit_type) in keys {
            let resolution = self
                .catalog
                .require(&product_id)
                .and_then(|product| resolve_price(product, unit_type, self.overrides.as_ref()));
            match resolution.and_then(|r| self.cart.reprice_line(&product_id, unit_type, r)) {
                Ok(true) => repriced += 1,
                Ok(false) => {}
                Err(e) => warn!(
                    product_id = %product_id,
                    %unit_type,
                    error = %e,
                    "Line kept at its previous price"
                ),
            }
        }

        if repriced > 0 {
            debug!(
                session_id = %self.id,
                customer_id = ?self.overrides.as_ref().map(PriceOverrides::customer_id),
                repriced,
                "Cart repriced for customer change"
            );
        }
        repriced
    }

    /// Reloads the attached customer after `credit` was added to their
    /// balance. If the reload fails the credit is added locally instead.
    async fn refresh_customer<B>(&mut self, backend: &B, credit: Money)
    where
        B: Backend + ?Sized,
    {
        let Some(customer_id) = self.customer.as_ref().map(|c| c.id.clone()) else {
            return;
        };

        match backend.load_customer(&customer_id).await {
            Ok(customer) => {
                debug!(
                    session_id = %self.id,
                    customer_id = %customer.id,
                    balance = %customer.current_balance,
                    "Customer balance refreshed"
                );
                self.customer = Some(customer);
            }
            Err(e) => {
                if let Some(customer) = self.customer.as_mut() {
                    customer.current_balance += credit;
                    warn!(
                        session_id = %self.id,
                        customer_id = %customer.id,
                        error = %e,
                        balance = %customer.current_balance,
                        "Customer reload failed, balance updated locally"
                    );
                }
            }
        }
    }

    fn reset_sale(&mut self) {
        self.cart.clear();
        self.payment.reset();
        self.fulfillment = None;
        self.notes = None;
    }
}

fn rejected(operation: &str, err: CoreError) -> SessionError {
    warn!(operation, error = %err, "Operation rejected");
    err.into()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BackendError, ErrorCode};
    use crate::testing::InMemoryBackend;

    async fn session(backend: &InMemoryBackend) -> SaleSession {
        SaleSession::start(backend, SessionConfig::default(), None)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_start_loads_catalog() {
        let backend = InMemoryBackend::seeded();
        let session = session(&backend).await;
        assert_eq!(session.catalog().len(), 2);
        assert!(session.cart().is_empty());

        let storefront = SaleSession::start(&backend, SessionConfig::default(), Some("m-2"))
            .await
            .unwrap();
        assert_eq!(storefront.catalog().len(), 1);
        assert!(matches!(
            storefront.catalog().require("p-1"),
            Err(CoreError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_dual_unit_sale() {
        let backend = InMemoryBackend::seeded();
        let mut session = session(&backend).await;

        for _ in 0..3 {
            session.add("p-1", UnitType::Base).unwrap();
        }
        assert_eq!(session.available("p-1", UnitType::Second).unwrap(), 1);
        assert_eq!(session.add("p-1", UnitType::Second).unwrap(), LineChange::Inserted);
        assert!(matches!(
            session.add("p-1", UnitType::Second).unwrap(),
            LineChange::AtStockLimit { quantity: 1 }
        ));
        assert!(matches!(
            session.update_quantity("p-1", UnitType::Second, 1),
            Err(SessionError::Core(CoreError::StockExceeded { .. }))
        ));

        assert_eq!(session.totals().total, Money::from_cents(1500));
    }

    #[tokio::test]
    async fn test_attach_reprices_existing_lines() {
        let backend = InMemoryBackend::seeded();
        let mut session = session(&backend).await;

        session.add("p-1", UnitType::Base).unwrap();
        session.attach_customer(&backend, "c-1").await.unwrap();
        session.add("p-1", UnitType::Second).unwrap();
        session.add("p-1", UnitType::Base).unwrap();

        let piece = session.cart().line("p-1", UnitType::Base).unwrap();
        assert_eq!(piece.unit_price.cents(), 150);
        assert!(piece.is_price_overridden);
        assert_eq!(piece.quantity, 2);

        // No box override, catalog price
        let boxed = session.cart().line("p-1", UnitType::Second).unwrap();
        assert_eq!(boxed.unit_price.cents(), 900);
        assert!(!boxed.is_price_overridden);
    }

    #[tokio::test]
    async fn test_detach_restores_catalog_price() {
        let backend = InMemoryBackend::seeded();
        let mut session = session(&backend).await;
        session.attach_customer(&backend, "c-1").await.unwrap();
        session.add("p-1", UnitType::Base).unwrap();
        session.apply_discount("p-1", UnitType::Base, Money::from_cents(150)).unwrap();

        let detached = session.detach_customer().unwrap();
        assert_eq!(detached.id, "c-1");
        session.select_payment(PaymentType::Cash);

        let draft = session.draft().unwrap();
        assert_eq!(draft.customer_id, None);
        assert_eq!(draft.items[0].unit_price.cents(), 200);
        assert_eq!(draft.items[0].discount.cents(), 150);
        assert_eq!(draft.total.cents(), 50);
        assert!(!session.cart().line("p-1", UnitType::Base).unwrap().is_price_overridden);

        session.attach_customer(&backend, "c-1").await.unwrap();
        let line = session.cart().line("p-1", UnitType::Base).unwrap();
        assert_eq!(line.unit_price.cents(), 150);
        assert!(line.is_price_overridden);
        assert_eq!(line.per_unit_discount.cents(), 150);
    }

    #[tokio::test]
    async fn test_credit_checkout_refreshes_balance() {
        let backend = InMemoryBackend::seeded();
        let mut config = SessionConfig::default();
        config.checkout.enforce_credit_limit = true;
        let mut session = SaleSession::start(&backend, config, None).await.unwrap();
        session.attach_customer(&backend, "c-1").await.unwrap();

        // $10 of credit left, each sale is $7.00
        for _ in 0..2 {
            session.add("p-2", UnitType::Base).unwrap();
        }
        session.select_payment(PaymentType::Credit);
        session.checkout(&backend).await.unwrap();
        assert_eq!(session.customer().unwrap().current_balance.cents(), 12_700);

        for _ in 0..2 {
            session.add("p-2", UnitType::Base).unwrap();
        }
        session.select_payment(PaymentType::Credit);
        assert!(matches!(
            session.checkout(&backend).await,
            Err(SessionError::Core(CoreError::CreditLimitExceeded { .. }))
        ));
        assert_eq!(backend.orders.lock().await.len(), 1);
        assert_eq!(session.cart().line_count(), 1);
    }

    #[tokio::test]
    async fn test_merchant_credit_checkout_refreshes_balance() {
        let backend = InMemoryBackend::seeded();
        let mut session = session(&backend).await;
        session.attach_customer(&backend, "c-1").await.unwrap();
        session.add("p-1", UnitType::Base).unwrap();
        session.add("p-2", UnitType::Base).unwrap();
        session.select_payment(PaymentType::Credit);

        let outcome = session.checkout_by_merchant(&backend).await.unwrap();
        assert!(outcome.is_complete());
        assert_eq!(session.customer().unwrap().current_balance.cents(), 12_500);
    }

    #[tokio::test]
    async fn test_override_price_on_new_line() {
        let backend = InMemoryBackend::seeded();
        let mut session = session(&backend).await;
        session.attach_customer(&backend, "c-1").await.unwrap();

        session.add("p-1", UnitType::Base).unwrap();
        let line = session.cart().line("p-1", UnitType::Base).unwrap();
        assert_eq!(line.unit_price.cents(), 150);
        assert!(line.is_price_overridden);
    }

    #[tokio::test]
    async fn test_unknown_customer() {
        let backend = InMemoryBackend::seeded();
        let mut session = session(&backend).await;

        let result = session.attach_customer(&backend, "c-404").await;
        assert!(matches!(
            result,
            Err(SessionError::Backend(BackendError::NotFound { .. }))
        ));
        assert!(session.customer().is_none());
    }

    #[tokio::test]
    async fn test_checkout_clears_cart() {
        let backend = InMemoryBackend::seeded();
        let mut session = session(&backend).await;
        session.attach_customer(&backend, "c-1").await.unwrap();
        session.add("p-2", UnitType::Base).unwrap();
        session.add("p-2", UnitType::Base).unwrap();
        session.select_payment(PaymentType::Split);
        session.enter_cash_amount("$5").unwrap();
        session.set_notes(Some("leave at back door")).unwrap();

        let receipt = session.checkout(&backend).await.unwrap();
        assert_eq!(receipt.order_id, "order-1");
        assert_eq!(receipt.formatted_total, "$7.00");
        assert_eq!(receipt.summary.cash_amount.cents(), 500);
        assert_eq!(receipt.summary.credit_amount.cents(), 200);

        let orders = backend.orders.lock().await;
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].customer_id.as_deref(), Some("c-1"));
        assert_eq!(orders[0].notes.as_deref(), Some("leave at back door"));
        drop(orders);

        assert!(session.cart().is_empty());
        assert_eq!(session.payment(), &PaymentAllocator::new());
        assert!(session.notes().is_none());
        assert!(session.customer().is_some());
    }

    #[tokio::test]
    async fn test_failed_checkout_keeps_cart() {
        let backend = InMemoryBackend::seeded();
        let mut session = session(&backend).await;
        session.add("p-2", UnitType::Base).unwrap();
        session.apply_discount("p-2", UnitType::Base, Money::from_cents(50)).unwrap();
        let cart_before = session.cart().clone();
        let payment_before = *session.payment();

        backend
            .fail_next(BackendError::Unavailable("timeout".to_string()))
            .await;
        let err = session.checkout(&backend).await.unwrap_err();
        assert_eq!(ApiError::from(err).code, ErrorCode::BackendUnavailable);

        assert_eq!(session.cart(), &cart_before);
        assert_eq!(session.payment(), &payment_before);

        // Retry with the same cart succeeds
        let receipt = session.checkout(&backend).await.unwrap();
        assert_eq!(receipt.summary.total.cents(), 300);
        assert_eq!(backend.orders.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_checkout_empty_cart() {
        let backend = InMemoryBackend::seeded();
        let mut session = session(&backend).await;

        let result = session.checkout(&backend).await;
        assert!(matches!(result, Err(SessionError::Core(CoreError::EmptyCart))));
        assert!(backend.orders.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_credit_requires_customer() {
        let backend = InMemoryBackend::seeded();
        let mut session = session(&backend).await;
        session.add("p-2", UnitType::Base).unwrap();
        session.select_payment(PaymentType::Credit);

        let result = session.checkout(&backend).await;
        assert!(matches!(
            result,
            Err(SessionError::Core(CoreError::NoCustomerSelected))
        ));
        assert_eq!(session.cart().line_count(), 1);
    }

    #[tokio::test]
    async fn test_require_customer_setting() {
        let backend = InMemoryBackend::seeded();
        let mut config = SessionConfig::default();
        config.checkout.require_customer = true;
        let mut session = SaleSession::start(&backend, config, None).await.unwrap();
        session.add("p-2", UnitType::Base).unwrap();

        assert!(matches!(
            session.draft(),
            Err(SessionError::Core(CoreError::NoCustomerSelected))
        ));

        session.attach_customer(&backend, "c-1").await.unwrap();
        assert!(session.draft().is_ok());
    }

    #[tokio::test]
    async fn test_credit_limit_only_when_enforced() {
        let backend = InMemoryBackend::seeded();

        // $10 of credit left, order is $10.50
        let mut lenient = session(&backend).await;
        lenient.attach_customer(&backend, "c-1").await.unwrap();
        for _ in 0..3 {
            lenient.add("p-2", UnitType::Base).unwrap();
        }
        lenient.select_payment(PaymentType::Credit);
        assert!(lenient.allocation().is_ok());

        let mut config = SessionConfig::default();
        config.checkout.enforce_credit_limit = true;
        let mut strict = SaleSession::start(&backend, config, None).await.unwrap();
        strict.attach_customer(&backend, "c-1").await.unwrap();
        for _ in 0..3 {
            strict.add("p-2", UnitType::Base).unwrap();
        }
        strict.select_payment(PaymentType::Credit);
        assert!(matches!(
            strict.checkout(&backend).await,
            Err(SessionError::Core(CoreError::CreditLimitExceeded { .. }))
        ));

        // Paying part in cash brings the credit portion under the limit
        strict.select_payment(PaymentType::Split);
        strict.set_cash_amount(Money::from_cents(100));
        assert!(strict.checkout(&backend).await.is_ok());
    }

    #[tokio::test]
    async fn test_split_above_total() {
        let backend = InMemoryBackend::seeded();
        let mut session = session(&backend).await;
        session.attach_customer(&backend, "c-1").await.unwrap();
        session.add("p-2", UnitType::Base).unwrap();
        session.select_payment(PaymentType::Split);
        session.enter_cash_amount("$60").unwrap();

        assert!(matches!(
            session.allocation(),
            Err(SessionError::Core(CoreError::InvalidSplitAmount { .. }))
        ));
        assert!(session.enter_cash_amount("sixty").is_err());
    }

    #[tokio::test]
    async fn test_delivery_default_needs_address() {
        let backend = InMemoryBackend::seeded();
        let mut config = SessionConfig::default();
        config.checkout.default_fulfillment = FulfillmentMode::Delivery;
        let mut session = SaleSession::start(&backend, config, None).await.unwrap();
        session.add("p-2", UnitType::Base).unwrap();

        assert!(matches!(
            session.draft(),
            Err(SessionError::Core(CoreError::Validation(ValidationError::Required { .. })))
        ));
        assert!(session
            .set_fulfillment(Fulfillment::Delivery {
                address: " ".to_string()
            })
            .is_err());

        session
            .set_fulfillment(Fulfillment::Delivery {
                address: "12 Harbour Rd".to_string(),
            })
            .unwrap();
        let draft = session.draft().unwrap();
        assert!(matches!(draft.fulfillment, Fulfillment::Delivery { .. }));
    }

    #[tokio::test]
    async fn test_checkout_by_merchant() {
        let backend = InMemoryBackend::seeded();
        let mut session = session(&backend).await;
        session.add("p-1", UnitType::Base).unwrap();
        session.add("p-2", UnitType::Base).unwrap();
        session.add("p-1", UnitType::Second).unwrap();

        let outcome = session.checkout_by_merchant(&backend).await.unwrap();
        assert!(outcome.is_complete());
        assert_eq!(outcome.receipts.len(), 2);
        assert_eq!(outcome.receipts[0].merchant_id.as_deref(), Some("m-1"));
        assert_eq!(outcome.receipts[0].summary.total.cents(), 1100);
        assert_eq!(outcome.receipts[1].merchant_id.as_deref(), Some("m-2"));
        assert_eq!(outcome.receipts[1].summary.total.cents(), 350);

        let orders = backend.orders.lock().await;
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].items.len(), 2);
        assert_eq!(orders[1].items.len(), 1);
        drop(orders);
        assert!(session.cart().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_by_merchant_partial_failure() {
        let backend = InMemoryBackend::seeded();
        let mut session = session(&backend).await;
        session.add("p-1", UnitType::Base).unwrap();
        session.add("p-2", UnitType::Base).unwrap();

        // First merchant fails, nothing is sent for the second
        backend
            .fail_next(BackendError::Rejected {
                status: 409,
                message: "Merchant closed".to_string(),
            })
            .await;
        let outcome = session.checkout_by_merchant(&backend).await.unwrap();
        assert!(outcome.receipts.is_empty());
        let failure = outcome.failure.unwrap();
        assert_eq!(failure.merchant_id.as_deref(), Some("m-1"));
        assert_eq!(failure.error.code, ErrorCode::BackendRejected);
        assert_eq!(session.cart().line_count(), 2);

        let retry = session.checkout_by_merchant(&backend).await.unwrap();
        assert!(retry.is_complete());
        assert!(session.cart().is_empty());
    }

    #[tokio::test]
    async fn test_split_across_merchants_rejected() {
        let backend = InMemoryBackend::seeded();
        let mut session = session(&backend).await;
        session.attach_customer(&backend, "c-1").await.unwrap();
        session.add("p-1", UnitType::Base).unwrap();
        session.add("p-2", UnitType::Base).unwrap();
        session.select_payment(PaymentType::Split);
        session.set_cash_amount(Money::from_cents(100));

        assert!(matches!(
            session.checkout_by_merchant(&backend).await,
            Err(SessionError::SplitAcrossMerchants { merchants: 2 })
        ));
    }

    #[tokio::test]
    async fn test_cancel_keeps_customer() {
        let backend = InMemoryBackend::seeded();
        let mut session = session(&backend).await;
        session.attach_customer(&backend, "c-1").await.unwrap();
        session.add("p-1", UnitType::Base).unwrap();
        session.select_payment(PaymentType::Credit);

        session.cancel();
        assert!(session.cart().is_empty());
        assert_eq!(session.payment().method(), PaymentType::Cash);
        assert_eq!(session.customer().map(|c| c.id.as_str()), Some("c-1"));
    }

    #[tokio::test]
    async fn test_discount_is_clamped() {
        let backend = InMemoryBackend::seeded();
        let mut session = session(&backend).await;
        session.add("p-2", UnitType::Base).unwrap();

        let applied = session
            .apply_discount("p-2", UnitType::Base, Money::from_cents(1000))
            .unwrap();
        assert_eq!(applied.cents(), 350);
        assert_eq!(session.totals().total, Money::zero());
        assert!(session
            .apply_discount("p-1", UnitType::Base, Money::from_cents(10))
            .is_err());
    }
}
