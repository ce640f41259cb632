//! In-memory backend double and fixtures for session tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use routecart_core::collection::CollectionSubmission;
use routecart_core::order::OrderSubmission;
use routecart_core::pricing::CustomerPriceOverride;
use routecart_core::{Customer, Money, Product};

use crate::backend::{Backend, CollectionConfirmation, OrderConfirmation};
use crate::error::{BackendError, BackendResult};

pub fn water() -> Product {
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
        merchant_id: Some("m-1".to_string()),
    }
}

pub fn bread() -> Product {
    Product {
        id: "p-2".to_string(),
        sku: "BREAD-WHT".to_string(),
        name: "White Bread".to_string(),
        base_unit: "loaf".to_string(),
        second_unit: None,
        units_per_second_unit: 1,
        stock_in_base_units: 40,
        base_unit_price: Money::from_cents(350),
        second_unit_price: Money::zero(),
        image_url: None,
        merchant_id: Some("m-2".to_string()),
    }
}

pub fn corner_shop() -> Customer {
    Customer {
        id: "c-1".to_string(),
        name: "Corner Shop".to_string(),
        phone: Some("555-0100".to_string()),
        current_balance: Money::from_cents(12_000),
        credit_limit: Money::from_cents(13_000),
    }
}

#[derive(Default)]
pub struct InMemoryBackend {
    pub products: Vec<Product>,
    /// Balances move as credit orders are accepted.
    pub customers: Mutex<HashMap<String, Customer>>,
    pub overrides: HashMap<String, Vec<CustomerPriceOverride>>,
    pub orders: Mutex<Vec<OrderSubmission>>,
    pub collections: Mutex<Vec<CollectionSubmission>>,
    /// Returned by the next submission instead of accepting it.
    pub next_failure: Mutex<Option<BackendError>>,
}

impl InMemoryBackend {
    /// Water and bread on sale, Corner Shop with a $1.50 water override.
    pub fn seeded() -> Self {
        let customer = corner_shop();
        let overrides = vec![CustomerPriceOverride {
            product_id: "p-1".to_string(),
            base_unit_override: Some(Money::from_cents(150)),
            second_unit_override: None,
            active: true,
        }];

        InMemoryBackend {
            products: vec![water(), bread()],
            customers: Mutex::new(HashMap::from([(customer.id.clone(), customer)])),
            overrides: HashMap::from([("c-1".to_string(), overrides)]),
            ..InMemoryBackend::default()
        }
    }

    pub async fn fail_next(&self, error: BackendError) {
        *self.next_failure.lock().await = Some(error);
    }

    async fn take_failure(&self) -> BackendResult<()> {
        match self.next_failure.lock().await.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn load_catalog(&self, merchant_id: Option<&str>) -> BackendResult<Vec<Product>> {
        Ok(self
            .products
            .iter()
            .filter(|p| merchant_id.is_none() || p.merchant_id.as_deref() == merchant_id)
            .cloned()
            .collect())
    }

    async fn load_customer(&self, customer_id: &str) -> BackendResult<Customer> {
        self.customers
            .lock()
            .await
            .get(customer_id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound {
                entity: "Customer".to_string(),
                id: customer_id.to_string(),
            })
    }

    async fn load_price_overrides(
        &self,
        customer_id: &str,
    ) -> BackendResult<Vec<CustomerPriceOverride>> {
        Ok(self.overrides.get(customer_id).cloned().unwrap_or_default())
    }

    async fn submit_order(&self, order: &OrderSubmission) -> BackendResult<OrderConfirmation> {
        self.take_failure().await?;
        let total: Money = order
            .items
            .iter()
            .map(|item| (item.unit_price - item.discount) * item.quantity)
            .sum();
        let credit = total - order.cash_amount;
        if let (true, Some(customer_id)) = (credit.is_positive(), order.customer_id.as_deref()) {
            if let Some(customer) = self.customers.lock().await.get_mut(customer_id) {
                customer.current_balance += credit;
            }
        }

        let mut orders = self.orders.lock().await;
        orders.push(order.clone());
        Ok(OrderConfirmation {
            order_id: format!("order-{}", orders.len()),
            order_number: Some(format!("R-{:04}", orders.len())),
        })
    }

    async fn submit_collection(
        &self,
        collection: &CollectionSubmission,
    ) -> BackendResult<CollectionConfirmation> {
        self.take_failure().await?;
        let mut collections = self.collections.lock().await;
        collections.push(collection.clone());
        Ok(CollectionConfirmation {
            collection_id: format!("col-{}", collections.len()),
            new_balance: Some(collection.balance_after),
        })
    }
}
