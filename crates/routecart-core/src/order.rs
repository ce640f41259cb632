//! # Order Draft Builder
//!
//! Turns a cart and a payment allocation into the immutable draft the
//! order-creation endpoint expects.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cart ─────────────┐                                                    │
//! │  PaymentAllocation ┼──► build() ──► OrderDraft ──┬──► submission()      │
//! │  OrderMetadata ────┘       │                     │    (POST /orders)    │
//! │                            │                     └──► receipt()         │
//! │                            ├── EmptyCart                                │
//! │                            ├── NoCustomerSelected                       │
//! │                            └── AllocationMismatch                       │
//! │                                                                         │
//! │  build() only reads the cart. Clearing it is the caller's follow-up     │
//! │  once the backend accepted the order, so a failed submission can be     │
//! │  retried with the exact same cart.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::{Cart, CartLine};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::payment::{AllocationSummary, PaymentAllocation};
use crate::types::{PaymentType, UnitType};

// =============================================================================
// Metadata
// =============================================================================

/// How the goods reach the customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fulfillment {
    /// Handed over on the spot (driver POS) or collected at the store.
    #[default]
    Pickup,
    /// Delivered to an address.
    Delivery { address: String },
}

/// Caller-supplied order context. Carried into the draft unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderMetadata {
    pub customer_id: Option<String>,
    /// The order must be billed to a customer even when paid in cash.
    #[serde(default)]
    pub requires_customer: bool,
    #[serde(default)]
    pub fulfillment: Fulfillment,
    #[serde(default)]
    pub notes: Option<String>,
}

impl OrderMetadata {
    /// Metadata for an order billed to `customer_id`.
    pub fn for_customer(customer_id: impl Into<String>) -> Self {
        OrderMetadata {
            customer_id: Some(customer_id.into()),
            requires_customer: true,
            ..OrderMetadata::default()
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn delivered_to(mut self, address: impl Into<String>) -> Self {
        self.fulfillment = Fulfillment::Delivery {
            address: address.into(),
        };
        self
    }

    fn attached_customer(&self) -> Option<&str> {
        self.customer_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }
}

// =============================================================================
// Draft
// =============================================================================

/// One draft line, mirroring a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraftLine {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub unit_label: String,
    pub unit_type: UnitType,
    pub quantity: i64,
    pub unit_price: Money,
    /// Per-unit discount.
    pub discount: Money,
    pub line_total: Money,
}

impl From<&CartLine> for OrderDraftLine {
    fn from(line: &CartLine) -> Self {
        OrderDraftLine {
            product_id: line.product_id.clone(),
            sku: line.sku.clone(),
            name: line.name.clone(),
            unit_label: line.unit_label.clone(),
            unit_type: line.unit_type,
            quantity: line.quantity,
            unit_price: line.unit_price,
            discount: line.per_unit_discount,
            line_total: line.line_total(),
        }
    }
}

/// Immutable, submission-ready snapshot of a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub customer_id: Option<String>,
    pub fulfillment: Fulfillment,
    pub notes: Option<String>,
    pub items: Vec<OrderDraftLine>,
    pub subtotal: Money,
    pub total_discount: Money,
    pub total: Money,
    pub payment: AllocationSummary,
}

/// Builds an order draft.
///
/// ## Errors
/// - `EmptyCart` when the cart has no lines
/// - `NoCustomerSelected` when the order must be billed (metadata flag, or
///   any credit portion) and no customer is attached
/// - `AllocationMismatch` when the allocation settles a different total
///   than the cart's current one
pub fn build(
    cart: &Cart,
    allocation: &PaymentAllocation,
    metadata: &OrderMetadata,
) -> CoreResult<OrderDraft> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let customer_id = metadata.attached_customer();
    if customer_id.is_none() && (metadata.requires_customer || allocation.has_credit()) {
        return Err(CoreError::NoCustomerSelected);
    }

    let cart_total = cart.total();
    if allocation.total() != cart_total {
        return Err(CoreError::AllocationMismatch {
            allocated: allocation.total(),
            cart_total,
        });
    }

    Ok(OrderDraft {
        customer_id: customer_id.map(str::to_string),
        fulfillment: metadata.fulfillment.clone(),
        notes: metadata.notes.clone(),
        items: cart.lines().iter().map(OrderDraftLine::from).collect(),
        subtotal: cart.subtotal(),
        total_discount: cart.total_discount(),
        total: cart_total,
        payment: allocation.summary(),
    })
}

impl OrderDraft {
    /// The body posted to the order-creation endpoint.
    pub fn submission(&self) -> OrderSubmission {
        OrderSubmission {
            customer_id: self.customer_id.clone(),
            payment_type: self.payment.payment_type,
            cash_amount: self.payment.cash_amount,
            notes: self.notes.clone(),
            items: self
                .items
                .iter()
                .map(|item| OrderSubmissionItem {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                    unit_type: item.unit_type,
                    unit_price: item.unit_price,
                    discount: item.discount,
                })
                .collect(),
        }
    }

    /// Receipt-ready data. Formatting and printing belong to the caller.
    pub fn receipt(&self) -> ReceiptSummary {
        ReceiptSummary {
            customer_id: self.customer_id.clone(),
            lines: self
                .items
                .iter()
                .map(|item| ReceiptLine {
                    name: item.name.clone(),
                    unit_label: item.unit_label.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    discount: item.discount,
                    line_total: item.line_total,
                })
                .collect(),
            subtotal: self.subtotal,
            total_discount: self.total_discount,
            total: self.total,
            payment_type: self.payment.payment_type,
            cash_amount: self.payment.cash_amount,
            credit_amount: self.payment.credit_amount,
            fulfillment: self.fulfillment.clone(),
            notes: self.notes.clone(),
        }
    }
}

// =============================================================================
// Submission
// =============================================================================

/// Order-creation request body.
///
/// ```json
/// { "customerId": "c-1", "paymentType": "split", "cashAmount": 2000,
///   "items": [{ "productId": "p-1", "quantity": 3, "unitType": "base",
///               "unitPrice": 200, "discount": 0 }] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderSubmission {
    pub customer_id: Option<String>,
    pub payment_type: PaymentType,
    pub cash_amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub items: Vec<OrderSubmissionItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderSubmissionItem {
    pub product_id: String,
    pub quantity: i64,
    pub unit_type: UnitType,
    pub unit_price: Money,
    pub discount: Money,
}

// =============================================================================
// Receipt
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub name: String,
    pub unit_label: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub discount: Money,
    pub line_total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptSummary {
    pub customer_id: Option<String>,
    pub lines: Vec<ReceiptLine>,
    pub subtotal: Money,
    pub total_discount: Money,
    pub total: Money,
    pub payment_type: PaymentType,
    pub cash_amount: Money,
    pub credit_amount: Money,
    pub fulfillment: Fulfillment,
    pub notes: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogSnapshot;
    use crate::payment::PaymentAllocator;
    use crate::pricing::{resolve_price, CustomerPriceOverride, PriceOverrides};
    use crate::types::Product;

    fn water() -> Product {
        Product {
            id: "p-1".to_string(),
            sku: "WATER-500".to_string(),
            name: "Water 500ml".to_string(),
            base_unit: "piece".to_string(),
            second_unit: Some("box".to_string()),
            units_per_second_unit: 5,
            stock_in_base_units: 10,
            base_unit_price: Money::from_cents(200),
            second_unit_price: Money::from_cents(900),
            image_url: None,
            merchant_id: None,
        }
    }

    fn add(cart: &mut Cart, product: &Product, unit_type: UnitType, overrides: Option<&PriceOverrides>) {
        let resolution = resolve_price(product, unit_type, overrides).unwrap();
        cart.add_line(product, unit_type, resolution).unwrap();
    }

    fn scenario_a_cart() -> Cart {
        let catalog = CatalogSnapshot::new(vec![water()]).unwrap();
        let product = catalog.require("p-1").unwrap();
        let mut cart = Cart::new();
        for _ in 0..3 {
            add(&mut cart, product, UnitType::Base, None);
        }
        add(&mut cart, product, UnitType::Second, None);
        cart
    }

    #[test]
    fn test_scenario_a_dual_unit_total() {
        let cart = scenario_a_cart();
        assert_eq!(cart.total(), Money::parse("15.00").unwrap());

        let allocation = PaymentAllocation::Cash { total: cart.total() };
        let draft = build(&cart, &allocation, &OrderMetadata::default()).unwrap();
        assert_eq!(draft.items.len(), 2);
        assert_eq!(draft.items[0].unit_type, UnitType::Base);
        assert_eq!(draft.items[0].quantity, 3);
        assert_eq!(draft.items[1].unit_type, UnitType::Second);
        assert_eq!(draft.items[1].unit_price.cents(), 900);
        assert_eq!(draft.total.cents(), 1500);
        assert_eq!(draft.payment.cash_amount.cents(), 1500);
    }

    #[test]
    fn test_scenario_b_override_price_flows_into_draft() {
        let overrides = PriceOverrides::for_customer(
            "c-1",
            vec![CustomerPriceOverride {
                product_id: "p-1".to_string(),
                base_unit_override: Some(Money::parse("1.50").unwrap()),
                second_unit_override: None,
                active: true,
            }],
        )
        .unwrap();

        let resolved = resolve_price(&water(), UnitType::Base, Some(&overrides)).unwrap();
        assert_eq!(resolved.price.cents(), 150);
        assert!(resolved.is_overridden);

        let mut cart = Cart::new();
        add(&mut cart, &water(), UnitType::Base, Some(&overrides));
        let allocation = PaymentAllocation::Credit { total: cart.total() };
        let draft = build(&cart, &allocation, &OrderMetadata::for_customer("c-1")).unwrap();
        assert_eq!(draft.items[0].unit_price.cents(), 150);
        assert_eq!(draft.payment.credit_amount.cents(), 150);
    }

    #[test]
    fn test_scenario_c_split_above_total() {
        let total = Money::parse("50.00").unwrap();
        let mut allocator = PaymentAllocator::new();
        allocator.select(PaymentType::Split, total);
        allocator.set_cash_amount(Money::parse("$60").unwrap());
        assert!(matches!(
            allocator.validate(total),
            Err(CoreError::InvalidSplitAmount { .. })
        ));
    }

    #[test]
    fn test_scenario_e_empty_cart() {
        let cart = Cart::new();
        let allocation = PaymentAllocation::Cash { total: Money::zero() };

        let result = build(&cart, &allocation, &OrderMetadata::default());
        assert!(matches!(result, Err(CoreError::EmptyCart)));
        assert!(cart.is_empty());
        assert_eq!(cart, Cart::new());
    }

    #[test]
    fn test_no_customer_selected() {
        let cart = scenario_a_cart();
        let cash = PaymentAllocation::Cash { total: cart.total() };

        let mut metadata = OrderMetadata::default();
        metadata.requires_customer = true;
        assert!(matches!(
            build(&cart, &cash, &metadata),
            Err(CoreError::NoCustomerSelected)
        ));

        // Credit always needs someone to bill.
        let credit = PaymentAllocation::Credit { total: cart.total() };
        assert!(matches!(
            build(&cart, &credit, &OrderMetadata::default()),
            Err(CoreError::NoCustomerSelected)
        ));

        // A blank id counts as no customer.
        let blank = OrderMetadata {
            customer_id: Some("  ".to_string()),
            ..OrderMetadata::default()
        };
        assert!(matches!(
            build(&cart, &credit, &blank),
            Err(CoreError::NoCustomerSelected)
        ));
    }

    #[test]
    fn test_stale_allocation_is_rejected() {
        let mut cart = scenario_a_cart();
        let allocation = PaymentAllocation::Cash { total: cart.total() };
        cart.update_quantity("p-1", UnitType::Base, -1).unwrap();

        assert!(matches!(
            build(&cart, &allocation, &OrderMetadata::default()),
            Err(CoreError::AllocationMismatch { .. })
        ));
    }

    #[test]
    fn test_draft_purity() {
        let mut cart = scenario_a_cart();
        cart.apply_discount("p-1", UnitType::Base, Money::from_cents(20))
            .unwrap();
        let before = cart.clone();

        let mut allocator = PaymentAllocator::new();
        allocator.select(PaymentType::Split, cart.total());
        allocator.set_cash_amount(Money::from_cents(500));
        let allocation = allocator.allocate(cart.total()).unwrap();
        let metadata = OrderMetadata::for_customer("c-1")
            .delivered_to("12 Harbour Rd")
            .with_notes("ring twice");

        let first = build(&cart, &allocation, &metadata).unwrap();
        let second = build(&cart, &allocation, &metadata).unwrap();

        assert_eq!(first, second);
        assert_eq!(cart, before);
        assert_eq!(cart.line_count(), 2);
        assert_eq!(first.total, cart.total());
        assert_eq!(
            first.fulfillment,
            Fulfillment::Delivery {
                address: "12 Harbour Rd".to_string()
            }
        );
    }

    #[test]
    fn test_submission_wire_shape() {
        let mut cart = scenario_a_cart();
        cart.apply_discount("p-1", UnitType::Base, Money::from_cents(20))
            .unwrap();
        let total = cart.total();

        let mut allocator = PaymentAllocator::new();
        allocator.select(PaymentType::Split, total);
        allocator.set_cash_amount(Money::from_cents(1000));
        let allocation = allocator.allocate(total).unwrap();

        let draft = build(
            &cart,
            &allocation,
            &OrderMetadata::for_customer("c-1").with_notes("back door"),
        )
        .unwrap();

        let json = serde_json::to_value(draft.submission()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "customerId": "c-1",
                "paymentType": "split",
                "cashAmount": 1000,
                "notes": "back door",
                "items": [
                    { "productId": "p-1", "quantity": 3, "unitType": "base", "unitPrice": 200, "discount": 20 },
                    { "productId": "p-1", "quantity": 1, "unitType": "second", "unitPrice": 900, "discount": 0 }
                ]
            })
        );
    }

    #[test]
    fn test_receipt_summary() {
        let cart = scenario_a_cart();
        let allocation = PaymentAllocation::Cash { total: cart.total() };
        let receipt = build(&cart, &allocation, &OrderMetadata::default())
            .unwrap()
            .receipt();

        assert_eq!(receipt.lines.len(), 2);
        assert_eq!(receipt.lines[0].unit_label, "piece");
        assert_eq!(receipt.lines[0].line_total.cents(), 600);
        assert_eq!(receipt.lines[1].unit_label, "box");
        assert_eq!(receipt.total.cents(), 1500);
        assert_eq!(receipt.credit_amount, Money::zero());
    }
}
