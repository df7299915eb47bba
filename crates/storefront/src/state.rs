//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::{PgCatalog, PgOrderStore};
use crate::payments::{PaymentGateway, StripeGateway};
use crate::providers::{GatewayRegistry, GelatoGateway, PrintfulGateway, ProviderError};
use crate::services::{CheckoutService, DraftSweeper};
use crate::store::{Catalog, OrderStore};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// stores, gateways, and services every request needs.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: Option<PgPool>,
    catalog: Arc<dyn Catalog>,
    orders: Arc<dyn OrderStore>,
    gateways: Arc<GatewayRegistry>,
    checkout: CheckoutService,
    sweeper: DraftSweeper,
}

impl AppState {
    /// Build production state: Postgres-backed stores, gateways from
    /// configuration, Stripe payments.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured gateway fails to construct.
    pub fn from_pool(config: StorefrontConfig, pool: PgPool) -> Result<Self, ProviderError> {
        let catalog: Arc<dyn Catalog> = Arc::new(PgCatalog::new(pool.clone()));
        let orders: Arc<dyn OrderStore> = Arc::new(PgOrderStore::new(pool.clone()));
        let gateways = Arc::new(build_gateways(&config)?);
        let payments: Arc<dyn PaymentGateway> = Arc::new(StripeGateway::new(&config.stripe));

        Ok(Self::assemble(
            config,
            Some(pool),
            catalog,
            orders,
            gateways,
            payments,
        ))
    }

    /// Assemble state from explicit parts (tests use in-memory stores and
    /// mock gateways here).
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        catalog: Arc<dyn Catalog>,
        orders: Arc<dyn OrderStore>,
        gateways: Arc<GatewayRegistry>,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self::assemble(config, None, catalog, orders, gateways, payments)
    }

    fn assemble(
        config: StorefrontConfig,
        pool: Option<PgPool>,
        catalog: Arc<dyn Catalog>,
        orders: Arc<dyn OrderStore>,
        gateways: Arc<GatewayRegistry>,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        let checkout = CheckoutService::new(
            catalog.clone(),
            orders.clone(),
            gateways.clone(),
            payments,
        );
        let sweeper = DraftSweeper::new(orders.clone(), gateways.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                orders,
                gateways,
                checkout,
                sweeper,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the database pool, when the state is Postgres-backed.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.inner.catalog
    }

    /// Get a reference to the order store.
    #[must_use]
    pub fn orders(&self) -> &Arc<dyn OrderStore> {
        &self.inner.orders
    }

    /// Get a reference to the fulfillment gateway registry.
    #[must_use]
    pub fn gateways(&self) -> &Arc<GatewayRegistry> {
        &self.inner.gateways
    }

    /// Get a reference to the checkout orchestrator.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }

    /// Get a reference to the abandonment sweeper.
    #[must_use]
    pub fn sweeper(&self) -> &DraftSweeper {
        &self.inner.sweeper
    }
}

/// Build the gateway registry from configuration.
///
/// The synthetic `"manual"` gateway is always present; external gateways
/// are registered only when their provider section is configured.
pub fn build_gateways(config: &StorefrontConfig) -> Result<GatewayRegistry, ProviderError> {
    let mut registry = GatewayRegistry::with_manual();

    if let Some(printful) = &config.printful {
        registry.register(Arc::new(PrintfulGateway::new(printful)?));
    }
    if let Some(gelato) = &config.gelato {
        registry.register(Arc::new(GelatoGateway::new(gelato)?));
    }

    Ok(registry)
}
