//! Integration-test harness for Inkwave.
//!
//! Provides recording mock gateways, catalog/order fixtures, and a
//! pre-wired [`Harness`] that assembles the checkout orchestrator and the
//! sweeper against in-memory stores. Scenario tests live in `tests/`.
//!
//! # Example
//!
//! ```rust,ignore
//! let harness = Harness::new()
//!     .with_product(manual_product("poster", "10.00"))
//!     .with_gateway(MockGateway::new("printful").with_flat_rates(&[("r1", "5"), ("r2", "8")]));
//!
//! let quote = harness.checkout().quote(&cart(&[("poster", 2)]), &address()).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use inkwave_core::{CurrencyCode, Email, Money, ProductId, RateId, ShippingAddress, VariantId};

use inkwave_storefront::models::product::{
    FulfillmentConfig, MANUAL_PROVIDER, Product, Variant,
};
use inkwave_storefront::models::quote::CartItem;
use inkwave_storefront::payments::{
    CheckoutSession, CheckoutSessionRequest, PaymentError, PaymentGateway,
};
use inkwave_storefront::providers::{
    DraftOrderRequest, FulfillmentGateway, GatewayRegistry, ProviderError, RemoteOrder,
    ShippingQuoteRequest, ShippingRate,
};
use inkwave_storefront::services::{CheckoutService, DraftSweeper};
use inkwave_storefront::store::{MemoryCatalog, MemoryOrderStore};

// =============================================================================
// Mock fulfillment gateway
// =============================================================================

/// A recording mock fulfillment gateway.
///
/// Calls are recorded for assertions; failures are opt-in per operation so
/// tests can model one provider failing while others succeed.
#[derive(Debug)]
pub struct MockGateway {
    name: String,
    rates: Vec<ShippingRate>,
    fail_quote: bool,
    fail_create: bool,
    fail_cancel: bool,
    fail_confirm: bool,
    quotes: Mutex<Vec<ShippingQuoteRequest>>,
    created: Mutex<Vec<DraftOrderRequest>>,
    cancelled: Mutex<Vec<String>>,
    confirmed: Mutex<Vec<String>>,
}

impl MockGateway {
    /// A gateway with no rates configured; add some with `with_rates`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            rates: Vec::new(),
            fail_quote: false,
            fail_create: false,
            fail_cancel: false,
            fail_confirm: false,
            quotes: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
            confirmed: Mutex::new(Vec::new()),
        }
    }

    /// Replace the rate list.
    #[must_use]
    pub fn with_rates(mut self, rates: Vec<ShippingRate>) -> Self {
        self.rates = rates;
        self
    }

    /// Shorthand: `(id, cost)` pairs become USD rates with no day bounds.
    #[must_use]
    pub fn with_flat_rates(self, rates: &[(&str, &str)]) -> Self {
        let rates = rates
            .iter()
            .map(|(id, cost)| ShippingRate {
                id: RateId::new(*id),
                name: (*id).to_owned(),
                rate: cost.parse().expect("rate literal"),
                currency: CurrencyCode::USD,
                min_delivery_days: None,
                max_delivery_days: None,
            })
            .collect();
        self.with_rates(rates)
    }

    #[must_use]
    pub fn failing_quote(mut self) -> Self {
        self.fail_quote = true;
        self
    }

    #[must_use]
    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    #[must_use]
    pub fn failing_cancel(mut self) -> Self {
        self.fail_cancel = true;
        self
    }

    #[must_use]
    pub fn failing_confirm(mut self) -> Self {
        self.fail_confirm = true;
        self
    }

    /// Quote requests received so far.
    #[must_use]
    pub fn quote_calls(&self) -> Vec<ShippingQuoteRequest> {
        self.quotes.lock().expect("lock").clone()
    }

    /// Draft-order requests received so far.
    #[must_use]
    pub fn created_drafts(&self) -> Vec<DraftOrderRequest> {
        self.created.lock().expect("lock").clone()
    }

    /// Cancelled order IDs received so far.
    #[must_use]
    pub fn cancelled_ids(&self) -> Vec<String> {
        self.cancelled.lock().expect("lock").clone()
    }

    /// Confirmed order IDs received so far.
    #[must_use]
    pub fn confirmed_ids(&self) -> Vec<String> {
        self.confirmed.lock().expect("lock").clone()
    }

    fn api_error(&self, message: &str) -> ProviderError {
        ProviderError::Api {
            provider: self.name.clone(),
            status: 400,
            message: message.to_owned(),
        }
    }
}

#[async_trait]
impl FulfillmentGateway for MockGateway {
    fn name(&self) -> &str {
        &self.name
    }

    async fn quote_order(
        &self,
        request: &ShippingQuoteRequest,
    ) -> Result<Vec<ShippingRate>, ProviderError> {
        self.quotes.lock().expect("lock").push(request.clone());
        if self.fail_quote {
            return Err(self.api_error("quote refused"));
        }
        Ok(self.rates.clone())
    }

    async fn create_order(
        &self,
        request: &DraftOrderRequest,
    ) -> Result<RemoteOrder, ProviderError> {
        if self.fail_create {
            return Err(self.api_error("create refused"));
        }
        let mut created = self.created.lock().expect("lock");
        created.push(request.clone());
        Ok(RemoteOrder {
            id: format!("{}-d{}", self.name, created.len()),
            status: "draft".to_owned(),
        })
    }

    async fn cancel_order(&self, id: &str) -> Result<RemoteOrder, ProviderError> {
        if self.fail_cancel {
            return Err(self.api_error("already in production"));
        }
        self.cancelled.lock().expect("lock").push(id.to_owned());
        Ok(RemoteOrder {
            id: id.to_owned(),
            status: "canceled".to_owned(),
        })
    }

    async fn confirm_order(&self, id: &str) -> Result<RemoteOrder, ProviderError> {
        if self.fail_confirm {
            return Err(self.api_error("confirm refused"));
        }
        self.confirmed.lock().expect("lock").push(id.to_owned());
        Ok(RemoteOrder {
            id: id.to_owned(),
            status: "confirmed".to_owned(),
        })
    }
}

// =============================================================================
// Mock payment gateway
// =============================================================================

/// A recording mock payment gateway.
pub struct MockPayment {
    fail: bool,
    sessions: Mutex<Vec<CheckoutSessionRequest>>,
}

impl MockPayment {
    #[must_use]
    pub fn new() -> Self {
        Self {
            fail: false,
            sessions: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Session requests received so far.
    #[must_use]
    pub fn session_requests(&self) -> Vec<CheckoutSessionRequest> {
        self.sessions.lock().expect("lock").clone()
    }
}

impl Default for MockPayment {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for MockPayment {
    fn name(&self) -> &str {
        "stripe"
    }

    async fn create_checkout(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        if self.fail {
            return Err(PaymentError::Api {
                provider: "stripe".to_owned(),
                status: 402,
                message: "session refused".to_owned(),
            });
        }
        let mut sessions = self.sessions.lock().expect("lock");
        sessions.push(request.clone());
        Ok(CheckoutSession {
            session_id: format!("cs_test_{}", sessions.len()),
            url: format!("https://pay.test/cs_test_{}", sessions.len()),
        })
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// A USD amount from a string literal.
#[must_use]
pub fn usd(amount: &str) -> Money {
    Money::new(amount.parse().expect("amount literal"), CurrencyCode::USD)
}

/// A valid shipping address.
#[must_use]
pub fn address() -> ShippingAddress {
    ShippingAddress {
        first_name: "Ada".to_owned(),
        last_name: "Lovelace".to_owned(),
        address1: "1 Analytical Way".to_owned(),
        address2: None,
        city: "London".to_owned(),
        state: "LND".to_owned(),
        postal_code: "EC1A 1BB".to_owned(),
        country: "GB".to_owned(),
        email: Email::parse("ada@example.com").expect("fixture email"),
        phone: None,
    }
}

/// A variant-less product fulfilled locally.
#[must_use]
pub fn manual_product(id: &str, price: &str) -> Product {
    Product {
        id: ProductId::new(id),
        title: id.to_owned(),
        description: None,
        price: usd(price),
        fulfillment_provider: MANUAL_PROVIDER.to_owned(),
        image_url: None,
        variants: Vec::new(),
        active: true,
    }
}

/// A single-variant product routed to `provider`.
#[must_use]
pub fn provider_product(id: &str, price: &str, provider: &str) -> Product {
    Product {
        id: ProductId::new(id),
        title: id.to_owned(),
        description: None,
        price: usd(price),
        fulfillment_provider: provider.to_owned(),
        image_url: None,
        variants: vec![Variant {
            id: VariantId::new(format!("{id}-std")),
            title: "Standard".to_owned(),
            price: None,
            attributes: BTreeMap::new(),
            fulfillment: FulfillmentConfig {
                external_variant_id: Some(format!("ext-{id}")),
                external_product_id: None,
                design_files: Vec::new(),
                extra: serde_json::Value::Null,
            },
        }],
        active: true,
    }
}

/// Build a cart from `(product_id, quantity)` pairs.
#[must_use]
pub fn cart(lines: &[(&str, u32)]) -> Vec<CartItem> {
    lines
        .iter()
        .map(|(id, quantity)| CartItem {
            product_id: ProductId::new(*id),
            variant_id: None,
            quantity: *quantity,
        })
        .collect()
}

// =============================================================================
// Harness
// =============================================================================

/// Everything a scenario test needs, wired against in-memory stores.
pub struct Harness {
    products: Vec<Product>,
    orders: Arc<MemoryOrderStore>,
    registry: GatewayRegistry,
    payment: Arc<MockPayment>,
    gateways: Vec<Arc<MockGateway>>,
}

impl Harness {
    /// A harness with an empty catalog, the manual gateway, and a working
    /// payment gateway.
    #[must_use]
    pub fn new() -> Self {
        Self {
            products: Vec::new(),
            orders: Arc::new(MemoryOrderStore::new()),
            registry: GatewayRegistry::with_manual(),
            payment: Arc::new(MockPayment::new()),
            gateways: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_payment(mut self, payment: MockPayment) -> Self {
        self.payment = Arc::new(payment);
        self
    }

    /// Register a mock gateway; a handle stays available via
    /// [`Harness::gateway`].
    #[must_use]
    pub fn with_gateway(mut self, gateway: MockGateway) -> Self {
        let gateway = Arc::new(gateway);
        self.registry.register(gateway.clone());
        self.gateways.push(gateway);
        self
    }

    /// Add a product to the catalog.
    #[must_use]
    pub fn with_product(mut self, product: Product) -> Self {
        self.products.push(product);
        self
    }

    /// The registered mock gateway with this name.
    ///
    /// # Panics
    ///
    /// Panics if no mock with that name was registered.
    #[must_use]
    pub fn gateway(&self, name: &str) -> &Arc<MockGateway> {
        self.gateways
            .iter()
            .find(|g| g.name == name)
            .unwrap_or_else(|| panic!("no mock gateway named {name}"))
    }

    /// The recording payment gateway.
    #[must_use]
    pub fn payment(&self) -> &Arc<MockPayment> {
        &self.payment
    }

    /// The in-memory order store.
    #[must_use]
    pub fn orders(&self) -> &Arc<MemoryOrderStore> {
        &self.orders
    }

    /// Build the checkout orchestrator.
    #[must_use]
    pub fn checkout(&self) -> CheckoutService {
        CheckoutService::new(
            Arc::new(MemoryCatalog::with_products(self.products.clone())),
            self.orders.clone(),
            Arc::new(self.registry.clone()),
            self.payment.clone(),
        )
    }

    /// Build the abandonment sweeper.
    #[must_use]
    pub fn sweeper(&self) -> DraftSweeper {
        DraftSweeper::new(self.orders.clone(), Arc::new(self.registry.clone()))
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
