//! The checkout orchestrator.
//!
//! A cart can contain items fulfilled by different providers. Quoting fans
//! out to every provider bucket concurrently and aggregates the results
//! into one customer-facing total; checkout confirmation runs a sequential
//! multi-phase commit against one local store and N+1 remote systems with
//! no distributed transaction available.
//!
//! # Failure model
//!
//! Quote and checkout are all-or-nothing at the request level: any failure
//! from a configured provider aborts the request. Remote side effects that
//! already happened (draft orders created before a later step failed) are
//! NOT compensated here - the order keeps the draft IDs it accumulated and
//! the abandonment sweeper reconciles them on its next pass.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, instrument, warn};

use inkwave_core::{
    AddressError, CurrencyCode, Money, OrderId, OrderStatus, ProductId, RateId, ShippingAddress,
    UserId, VariantId,
};

use crate::models::order::{DeliveryEstimate, Order, OrderItem};
use crate::models::product::{FulfillmentConfig, MANUAL_PROVIDER};
use crate::models::quote::{CartItem, ProviderQuote, Quote, SelectedRate};
use crate::payments::{CheckoutSessionRequest, PaymentError, PaymentGateway, PaymentLineItem};
use crate::providers::{
    DraftOrderRequest, FulfillmentGateway as _, GatewayRegistry, OrderItemRef, ProviderError,
    Recipient, RetailCosts, ShippingQuoteRequest, ShippingRate,
};
use crate::store::{Catalog, OrderStore, StoreError};

/// Errors from quote or checkout orchestration.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart has no items.
    #[error("cart is empty")]
    EmptyCart,

    /// A cart item has quantity zero.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// A cart item references a product that does not exist.
    #[error("unknown product: {0}")]
    UnknownProduct(ProductId),

    /// A cart item references a variant its product does not have.
    #[error("unknown variant '{variant}' for product '{product}'")]
    UnknownVariant {
        product: ProductId,
        variant: VariantId,
    },

    /// The cart's resolved lines disagree on currency.
    #[error("cart mixes currencies: {left} and {right}")]
    CurrencyMismatch {
        left: CurrencyCode,
        right: CurrencyCode,
    },

    /// The shipping address failed validation.
    #[error("invalid shipping address: {0}")]
    InvalidAddress(#[from] AddressError),

    /// A configured provider returned an empty rate list.
    #[error("no shipping rates available from provider '{provider}'")]
    NoRates { provider: String },

    /// Checkout was confirmed without a rate for a provider that has items.
    #[error("no shipping rate selected for provider '{provider}'")]
    MissingSelectedRate { provider: String },

    /// A fulfillment gateway call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The payment session could not be created.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A checkout-confirmation request, as accepted from the storefront.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    /// Owning user; anonymous checkouts default to `"guest"`.
    pub user_id: Option<UserId>,
    pub items: Vec<CartItem>,
    pub shipping_address: ShippingAddress,
    /// Provider name -> the rate the customer chose from the quote.
    pub selected_rates: BTreeMap<String, RateId>,
    /// Aggregate shipping cost as shown on the accepted quote.
    pub shipping_cost: Decimal,
    /// Aggregated delivery window from the accepted quote, when one was
    /// reported.
    pub delivery_estimate: Option<DeliveryEstimate>,
    pub success_url: String,
    pub cancel_url: String,
}

/// The result of a confirmed checkout: where to redirect the customer and
/// which remote references were created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutOutcome {
    pub order_id: OrderId,
    pub checkout_session_id: String,
    pub checkout_url: String,
    pub draft_order_ids: BTreeMap<String, String>,
}

/// One cart line resolved against the catalog.
struct ResolvedLine {
    product_id: ProductId,
    variant_id: Option<VariantId>,
    name: String,
    variant_title: Option<String>,
    description: Option<String>,
    image_url: Option<String>,
    quantity: u32,
    unit_price: Money,
    attributes: BTreeMap<String, String>,
    fulfillment: FulfillmentConfig,
}

impl ResolvedLine {
    fn item_ref(&self) -> OrderItemRef {
        OrderItemRef::from_config(&self.fulfillment, self.quantity)
    }

    fn line_total(&self) -> Decimal {
        self.unit_price.times(self.quantity).amount
    }
}

/// A cart resolved and grouped into provider buckets.
///
/// `BTreeMap` keeps bucket iteration deterministic, which pins down which
/// providers were "already processed" when a later bucket fails.
struct ResolvedCart {
    buckets: BTreeMap<String, Vec<ResolvedLine>>,
    subtotal: Decimal,
    currency: CurrencyCode,
}

/// The checkout orchestrator.
#[derive(Clone)]
pub struct CheckoutService {
    catalog: Arc<dyn Catalog>,
    orders: Arc<dyn OrderStore>,
    gateways: Arc<GatewayRegistry>,
    payments: Arc<dyn PaymentGateway>,
}

impl CheckoutService {
    /// Wire up the orchestrator.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn Catalog>,
        orders: Arc<dyn OrderStore>,
        gateways: Arc<GatewayRegistry>,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            catalog,
            orders,
            gateways,
            payments,
        }
    }

    /// Compute an aggregated shipping quote for a cart.
    ///
    /// Provider buckets are quoted concurrently; a failure from any
    /// configured provider, or an empty rate list, fails the whole quote.
    /// There are no partial quotes.
    ///
    /// # Errors
    ///
    /// See [`CheckoutError`]; unresolvable products and unconfigured
    /// providers fail before any remote call is made.
    #[instrument(skip(self, items, address), fields(lines = items.len()))]
    pub async fn quote(
        &self,
        items: &[CartItem],
        address: &ShippingAddress,
    ) -> Result<Quote, CheckoutError> {
        address.validate()?;
        let cart = self.resolve(items).await?;

        // Every bucket must have a gateway before anything goes remote.
        for provider in cart.buckets.keys() {
            self.gateways.get(provider)?;
        }

        let recipient = Recipient::from(address);
        let quotes = future::try_join_all(cart.buckets.iter().map(|(provider, lines)| {
            self.quote_bucket(provider, lines, recipient.clone(), cart.currency)
        }))
        .await?;

        let shipping_cost: Decimal = quotes
            .iter()
            .map(|q| q.selected_shipping.shipping_cost)
            .sum();
        let delivery_estimate = aggregate_estimate(&quotes);

        info!(
            providers = quotes.len(),
            subtotal = %cart.subtotal,
            shipping = %shipping_cost,
            "quote aggregated"
        );

        Ok(Quote {
            subtotal: cart.subtotal,
            shipping_cost,
            total: cart.subtotal + shipping_cost,
            currency: cart.currency,
            providers: quotes,
            delivery_estimate,
        })
    }

    /// Confirm a checkout: create the local order, a draft order per
    /// provider, and one payment session for the aggregate total.
    ///
    /// Steps are strictly sequential so the local order ID exists before
    /// any external reference is requested, and so the payment session can
    /// embed the final draft-order map in its metadata. Draft IDs are
    /// persisted as each provider call succeeds, so a failure partway
    /// through leaves an inspectable record of what was created.
    ///
    /// # Errors
    ///
    /// Any failure aborts the remaining steps and is returned to the
    /// caller; already-created drafts are left for the sweeper.
    #[instrument(skip(self, request), fields(lines = request.items.len()))]
    pub async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        request.shipping_address.validate()?;

        // Re-resolve against the current catalog. Prices may have moved
        // since the quote was shown; that staleness is accepted.
        let cart = self.resolve(&request.items).await?;
        let total = Money::new(cart.subtotal + request.shipping_cost, cart.currency);

        let mut order = Order::new(
            request
                .user_id
                .clone()
                .unwrap_or_else(|| UserId::new("guest")),
            total,
            request.shipping_address.clone(),
            freeze_items(&cart),
        );
        order.delivery_estimate = request.delivery_estimate;
        self.orders.insert(&order).await?;
        info!(order_id = %order.id, total = %total, "order created");

        let recipient = Recipient::from(&request.shipping_address);
        let mut draft_order_ids: BTreeMap<String, String> = BTreeMap::new();

        for (provider, lines) in &cart.buckets {
            if provider == MANUAL_PROVIDER {
                continue;
            }

            let gateway = self.gateways.get(provider)?;
            let rate_id = request.selected_rates.get(provider).ok_or_else(|| {
                CheckoutError::MissingSelectedRate {
                    provider: provider.clone(),
                }
            })?;

            let draft_request = DraftOrderRequest {
                external_id: order.id.to_string(),
                recipient: recipient.clone(),
                items: lines.iter().map(ResolvedLine::item_ref).collect(),
                retail_costs: RetailCosts {
                    subtotal: lines.iter().map(ResolvedLine::line_total).sum(),
                    shipping: None,
                    currency: cart.currency,
                },
                shipping_rate_id: Some(rate_id.clone()),
            };

            let remote = gateway.create_order(&draft_request).await.map_err(|e| {
                warn!(
                    order_id = %order.id,
                    provider = provider.as_str(),
                    created = draft_order_ids.len(),
                    error = %e,
                    "draft order creation failed; leaving prior drafts for the sweeper"
                );
                e
            })?;

            draft_order_ids.insert(provider.clone(), remote.id);
            self.orders
                .set_draft_order_ids(order.id, &draft_order_ids)
                .await?;
        }

        let session = self
            .payments
            .create_checkout(&payment_request(&order, &cart, request, &draft_order_ids))
            .await?;

        self.orders
            .set_checkout_session(order.id, &session.session_id, self.payments.name())
            .await?;
        self.orders
            .set_status(order.id, OrderStatus::DraftCreated)
            .await?;

        info!(
            order_id = %order.id,
            session_id = session.session_id.as_str(),
            drafts = draft_order_ids.len(),
            "checkout session created"
        );

        Ok(CheckoutOutcome {
            order_id: order.id,
            checkout_session_id: session.session_id,
            checkout_url: session.url,
            draft_order_ids,
        })
    }

    async fn quote_bucket(
        &self,
        provider: &str,
        lines: &[ResolvedLine],
        recipient: Recipient,
        currency: CurrencyCode,
    ) -> Result<ProviderQuote, CheckoutError> {
        let gateway = self.gateways.get(provider)?;
        let request = ShippingQuoteRequest {
            recipient,
            items: lines.iter().map(ResolvedLine::item_ref).collect(),
            currency,
        };

        let rates = gateway.quote_order(&request).await?;
        let selected = cheapest_rate(&rates)
            .map(SelectedRate::from)
            .ok_or_else(|| CheckoutError::NoRates {
                provider: provider.to_owned(),
            })?;

        Ok(ProviderQuote {
            provider: provider.to_owned(),
            item_count: lines.iter().map(|l| l.quantity).sum(),
            subtotal: lines.iter().map(ResolvedLine::line_total).sum(),
            selected_shipping: selected,
            available_rates: rates,
        })
    }

    /// Resolve cart items against the catalog and group them into provider
    /// buckets, accumulating the subtotal.
    async fn resolve(&self, items: &[CartItem]) -> Result<ResolvedCart, CheckoutError> {
        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let mut buckets: BTreeMap<String, Vec<ResolvedLine>> = BTreeMap::new();
        let mut subtotal = Decimal::ZERO;
        let mut currency: Option<CurrencyCode> = None;

        for item in items {
            if item.quantity == 0 {
                return Err(CheckoutError::InvalidQuantity);
            }

            let product = self
                .catalog
                .find(&item.product_id)
                .await?
                .ok_or_else(|| CheckoutError::UnknownProduct(item.product_id.clone()))?;

            let variant = match &item.variant_id {
                Some(id) => Some(product.variant(id).ok_or_else(|| {
                    CheckoutError::UnknownVariant {
                        product: item.product_id.clone(),
                        variant: id.clone(),
                    }
                })?),
                None => product.default_variant(),
            };

            let unit_price = variant.and_then(|v| v.price).unwrap_or(product.price);
            match currency {
                None => currency = Some(unit_price.currency),
                Some(existing) if existing != unit_price.currency => {
                    return Err(CheckoutError::CurrencyMismatch {
                        left: existing,
                        right: unit_price.currency,
                    });
                }
                Some(_) => {}
            }

            subtotal += unit_price.times(item.quantity).amount;

            let line = ResolvedLine {
                product_id: product.id.clone(),
                variant_id: variant.map(|v| v.id.clone()),
                name: product.title.clone(),
                variant_title: variant.map(|v| v.title.clone()),
                description: product.description.clone(),
                image_url: product.image_url.clone(),
                quantity: item.quantity,
                unit_price,
                attributes: variant.map(|v| v.attributes.clone()).unwrap_or_default(),
                fulfillment: variant
                    .map(|v| v.fulfillment.clone())
                    .unwrap_or_default(),
            };

            buckets
                .entry(product.fulfillment_provider.clone())
                .or_default()
                .push(line);
        }

        Ok(ResolvedCart {
            buckets,
            subtotal,
            currency: currency.unwrap_or_default(),
        })
    }
}

/// The cheapest rate; ties break to the lowest regardless of order.
fn cheapest_rate(rates: &[ShippingRate]) -> Option<&ShippingRate> {
    rates.iter().min_by(|a, b| a.rate.cmp(&b.rate))
}

/// Aggregate per-bucket delivery windows into [min of mins, max of maxes].
/// `None` when no bucket reported day bounds.
fn aggregate_estimate(quotes: &[ProviderQuote]) -> Option<DeliveryEstimate> {
    let mins: Vec<u32> = quotes
        .iter()
        .filter_map(|q| q.selected_shipping.min_delivery_days)
        .collect();
    let maxes: Vec<u32> = quotes
        .iter()
        .filter_map(|q| q.selected_shipping.max_delivery_days)
        .collect();

    let min_days = mins.iter().min().or_else(|| maxes.iter().min())?;
    let max_days = maxes.iter().max().or_else(|| mins.iter().max())?;

    Some(DeliveryEstimate {
        min_days: *min_days,
        max_days: *max_days,
    })
}

/// Freeze resolved lines into order items, flattened across buckets in
/// deterministic provider order.
fn freeze_items(cart: &ResolvedCart) -> Vec<OrderItem> {
    cart.buckets
        .iter()
        .flat_map(|(provider, lines)| {
            lines.iter().map(|line| OrderItem {
                product_id: line.product_id.clone(),
                variant_id: line.variant_id.clone(),
                name: line.name.clone(),
                variant_title: line.variant_title.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                attributes: line.attributes.clone(),
                fulfillment_provider: provider.clone(),
                fulfillment: line.fulfillment.clone(),
                image_url: line.image_url.clone(),
            })
        })
        .collect()
}

/// Build the payment-session request: one line per catalog line, plus a
/// synthetic "Shipping" line when shipping is non-zero. The payment
/// provider never sees the per-provider breakdown.
fn payment_request(
    order: &Order,
    cart: &ResolvedCart,
    request: &CheckoutRequest,
    draft_order_ids: &BTreeMap<String, String>,
) -> CheckoutSessionRequest {
    let mut items: Vec<PaymentLineItem> = cart
        .buckets
        .values()
        .flatten()
        .map(|line| PaymentLineItem {
            name: line.variant_title.as_ref().map_or_else(
                || line.name.clone(),
                |variant| format!("{} ({variant})", line.name),
            ),
            description: line.description.clone(),
            image_url: line.image_url.clone(),
            unit_amount: line.unit_price,
            quantity: line.quantity,
        })
        .collect();

    if request.shipping_cost > Decimal::ZERO {
        items.push(PaymentLineItem {
            name: "Shipping".to_owned(),
            description: None,
            image_url: None,
            unit_amount: Money::new(request.shipping_cost, order.total.currency),
            quantity: 1,
        });
    }

    let mut metadata = BTreeMap::new();
    metadata.insert("order_id".to_owned(), order.id.to_string());
    metadata.insert(
        "draft_order_ids".to_owned(),
        serde_json::to_string(draft_order_ids).unwrap_or_default(),
    );
    metadata.insert(
        "fulfillment_reference_id".to_owned(),
        order.fulfillment_reference_id.clone(),
    );

    CheckoutSessionRequest {
        order_id: order.id,
        amount: order.total,
        items,
        customer_email: request.shipping_address.email.to_string(),
        success_url: request.success_url.clone(),
        cancel_url: request.cancel_url.clone(),
        metadata,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use inkwave_core::Email;
    use rust_decimal::Decimal;

    use crate::models::product::{Product, Variant};
    use crate::store::{MemoryCatalog, MemoryOrderStore};

    fn usd(s: &str) -> Money {
        Money::new(s.parse().unwrap(), CurrencyCode::USD)
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            address1: "1 Analytical Way".to_owned(),
            address2: None,
            city: "London".to_owned(),
            state: "LND".to_owned(),
            postal_code: "EC1A 1BB".to_owned(),
            country: "GB".to_owned(),
            email: Email::parse("ada@example.com").unwrap(),
            phone: None,
        }
    }

    fn manual_product(id: &str, price: &str) -> Product {
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

    fn service(catalog: MemoryCatalog) -> CheckoutService {
        struct NoPayment;
        #[async_trait::async_trait]
        impl PaymentGateway for NoPayment {
            fn name(&self) -> &str {
                "stripe"
            }
            async fn create_checkout(
                &self,
                _request: &CheckoutSessionRequest,
            ) -> Result<crate::payments::CheckoutSession, PaymentError> {
                Ok(crate::payments::CheckoutSession {
                    session_id: "cs_test".to_owned(),
                    url: "https://pay.test/cs_test".to_owned(),
                })
            }
        }

        CheckoutService::new(
            Arc::new(catalog),
            Arc::new(MemoryOrderStore::new()),
            Arc::new(GatewayRegistry::with_manual()),
            Arc::new(NoPayment),
        )
    }

    #[test]
    fn cheapest_rate_picks_lowest_cost() {
        let rates = vec![
            ShippingRate {
                id: RateId::new("r2"),
                name: "Express".to_owned(),
                rate: Decimal::from(8),
                currency: CurrencyCode::USD,
                min_delivery_days: Some(1),
                max_delivery_days: Some(3),
            },
            ShippingRate {
                id: RateId::new("r1"),
                name: "Standard".to_owned(),
                rate: Decimal::from(5),
                currency: CurrencyCode::USD,
                min_delivery_days: Some(4),
                max_delivery_days: Some(8),
            },
        ];
        assert_eq!(cheapest_rate(&rates).unwrap().id, RateId::new("r1"));
        assert!(cheapest_rate(&[]).is_none());
    }

    #[test]
    fn estimate_spans_all_buckets() {
        let quote = |min: Option<u32>, max: Option<u32>| ProviderQuote {
            provider: "p".to_owned(),
            item_count: 1,
            subtotal: Decimal::ZERO,
            selected_shipping: SelectedRate {
                rate_id: RateId::new("r"),
                name: "r".to_owned(),
                shipping_cost: Decimal::ZERO,
                min_delivery_days: min,
                max_delivery_days: max,
            },
            available_rates: Vec::new(),
        };

        let estimate = aggregate_estimate(&[quote(Some(2), Some(5)), quote(Some(5), Some(10))]);
        assert_eq!(
            estimate,
            Some(DeliveryEstimate {
                min_days: 2,
                max_days: 10
            })
        );
        assert_eq!(aggregate_estimate(&[quote(None, None)]), None);
    }

    #[tokio::test]
    async fn quote_rejects_empty_cart() {
        let svc = service(MemoryCatalog::new());
        let err = svc.quote(&[], &address()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
    }

    #[tokio::test]
    async fn quote_rejects_zero_quantity() {
        let catalog = MemoryCatalog::with_products([manual_product("poster", "10")]);
        let svc = service(catalog);
        let items = [CartItem {
            product_id: ProductId::new("poster"),
            variant_id: None,
            quantity: 0,
        }];
        let err = svc.quote(&items, &address()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidQuantity));
    }

    #[tokio::test]
    async fn quote_rejects_unknown_product() {
        let svc = service(MemoryCatalog::new());
        let items = [CartItem {
            product_id: ProductId::new("ghost"),
            variant_id: None,
            quantity: 1,
        }];
        let err = svc.quote(&items, &address()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::UnknownProduct(_)));
    }

    #[tokio::test]
    async fn quote_rejects_unknown_variant() {
        let mut product = manual_product("tee", "25");
        product.variants = vec![Variant {
            id: VariantId::new("tee-m"),
            title: "M".to_owned(),
            price: None,
            attributes: BTreeMap::new(),
            fulfillment: FulfillmentConfig::default(),
        }];
        let svc = service(MemoryCatalog::with_products([product]));
        let items = [CartItem {
            product_id: ProductId::new("tee"),
            variant_id: Some(VariantId::new("tee-xxl")),
            quantity: 1,
        }];
        let err = svc.quote(&items, &address()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::UnknownVariant { .. }));
    }

    #[tokio::test]
    async fn quote_fails_fast_for_unconfigured_provider() {
        let mut product = manual_product("mug", "12");
        product.fulfillment_provider = "printful".to_owned();
        let svc = service(MemoryCatalog::with_products([product]));
        let items = [CartItem {
            product_id: ProductId::new("mug"),
            variant_id: None,
            quantity: 1,
        }];
        let err = svc.quote(&items, &address()).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Provider(ProviderError::NotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn manual_quote_uses_flat_free_rate() {
        let svc = service(MemoryCatalog::with_products([manual_product(
            "poster", "10",
        )]));
        let items = [CartItem {
            product_id: ProductId::new("poster"),
            variant_id: None,
            quantity: 2,
        }];
        let quote = svc.quote(&items, &address()).await.unwrap();

        assert_eq!(quote.subtotal, Decimal::from(20));
        assert_eq!(quote.shipping_cost, Decimal::ZERO);
        assert_eq!(quote.total, Decimal::from(20));
        assert_eq!(quote.providers.len(), 1);
        let breakdown = quote.providers.first().unwrap();
        assert_eq!(breakdown.item_count, 2);
        assert_eq!(
            breakdown.selected_shipping.rate_id,
            RateId::new("manual-standard")
        );
        assert_eq!(
            quote.delivery_estimate,
            Some(DeliveryEstimate {
                min_days: 5,
                max_days: 10
            })
        );
    }

    #[tokio::test]
    async fn variant_price_overrides_product_price() {
        let mut product = manual_product("tee", "25");
        product.variants = vec![Variant {
            id: VariantId::new("tee-l"),
            title: "L".to_owned(),
            price: Some(usd("27")),
            attributes: BTreeMap::new(),
            fulfillment: FulfillmentConfig::default(),
        }];
        let svc = service(MemoryCatalog::with_products([product]));
        let items = [CartItem {
            product_id: ProductId::new("tee"),
            variant_id: None, // defaults to first variant
            quantity: 1,
        }];
        let quote = svc.quote(&items, &address()).await.unwrap();
        assert_eq!(quote.subtotal, Decimal::from(27));
    }

    #[tokio::test]
    async fn mixed_currencies_are_rejected() {
        let mut eur = manual_product("eur-print", "30");
        eur.price = Money::new(Decimal::from(30), CurrencyCode::EUR);
        let catalog =
            MemoryCatalog::with_products([manual_product("poster", "10"), eur]);
        let svc = service(catalog);
        let items = [
            CartItem {
                product_id: ProductId::new("poster"),
                variant_id: None,
                quantity: 1,
            },
            CartItem {
                product_id: ProductId::new("eur-print"),
                variant_id: None,
                quantity: 1,
            },
        ];
        let err = svc.quote(&items, &address()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::CurrencyMismatch { .. }));
    }
}
