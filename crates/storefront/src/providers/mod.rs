//! Fulfillment provider gateways.
//!
//! # Architecture
//!
//! Every fulfillment provider is adapted to one capability surface,
//! [`FulfillmentGateway`]: quote shipping, create a draft order, cancel it,
//! confirm it. The [`GatewayRegistry`] maps provider names to gateway
//! instances and is populated once at startup from configuration - there is
//! no runtime plugin loading.
//!
//! The synthetic `"manual"` gateway handles locally fulfilled items
//! in-process so they never block a quote on an external call.

pub mod gelato;
pub mod manual;
pub mod printful;
pub mod types;

pub use gelato::GelatoGateway;
pub use manual::ManualFulfillment;
pub use printful::PrintfulGateway;
pub use types::{
    DraftOrderRequest, OrderItemRef, Recipient, RemoteOrder, RetailCosts, ShippingQuoteRequest,
    ShippingRate,
};

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from a fulfillment gateway call.
///
/// Every variant names the provider so failures can be surfaced to the
/// caller as "provider X failed" per the all-or-nothing quote/checkout
/// contract.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A cart item requires a provider that has no configured gateway.
    #[error("fulfillment provider '{0}' is not configured")]
    NotConfigured(String),

    /// The HTTP request to the provider failed (network, timeout, TLS).
    #[error("request to provider '{provider}' failed: {source}")]
    Request {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    /// The provider returned an error response.
    #[error("provider '{provider}' returned {status}: {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    /// The provider's response could not be interpreted.
    #[error("unexpected response from provider '{provider}': {message}")]
    UnexpectedResponse { provider: String, message: String },
}

impl ProviderError {
    /// The provider this error belongs to.
    #[must_use]
    pub fn provider(&self) -> &str {
        match self {
            Self::NotConfigured(name) => name,
            Self::Request { provider, .. }
            | Self::Api { provider, .. }
            | Self::UnexpectedResponse { provider, .. } => provider,
        }
    }
}

/// Uniform capability surface over a fulfillment provider.
#[async_trait]
pub trait FulfillmentGateway: Send + Sync + std::fmt::Debug {
    /// The provider name this gateway is registered under.
    fn name(&self) -> &str;

    /// Quote shipping for a set of items to a recipient.
    ///
    /// An empty rate list is a valid response here; the orchestrator treats
    /// it as a quote failure.
    async fn quote_order(
        &self,
        request: &ShippingQuoteRequest,
    ) -> Result<Vec<ShippingRate>, ProviderError>;

    /// Create a draft order: placed with the provider but not yet confirmed
    /// for production. Cancellable until the provider moves it further.
    async fn create_order(&self, request: &DraftOrderRequest)
        -> Result<RemoteOrder, ProviderError>;

    /// Cancel a previously created order by its provider-side ID.
    async fn cancel_order(&self, id: &str) -> Result<RemoteOrder, ProviderError>;

    /// Confirm a draft order for production.
    async fn confirm_order(&self, id: &str) -> Result<RemoteOrder, ProviderError>;
}

/// Provider name -> gateway instance, built at startup.
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    gateways: BTreeMap<String, Arc<dyn FulfillmentGateway>>,
}

impl GatewayRegistry {
    /// An empty registry. [`ManualFulfillment`] is not implied; callers
    /// register it explicitly (see [`GatewayRegistry::with_manual`]).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with the synthetic `"manual"` gateway.
    #[must_use]
    pub fn with_manual() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ManualFulfillment::new()));
        registry
    }

    /// Register a gateway under its own name. Later registrations replace
    /// earlier ones.
    pub fn register(&mut self, gateway: Arc<dyn FulfillmentGateway>) {
        self.gateways.insert(gateway.name().to_owned(), gateway);
    }

    /// Look up a gateway by provider name.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotConfigured`] for unknown names.
    pub fn get(&self, name: &str) -> Result<Arc<dyn FulfillmentGateway>, ProviderError> {
        self.gateways
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::NotConfigured(name.to_owned()))
    }

    /// Whether a gateway is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.gateways.contains_key(name)
    }

    /// Registered provider names, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.gateways.keys().map(String::as_str)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn registry_lookup_unknown_provider_fails() {
        let registry = GatewayRegistry::new();
        let err = registry.get("printful").unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
        assert_eq!(err.provider(), "printful");
    }

    #[test]
    fn with_manual_registers_the_synthetic_gateway() {
        let registry = GatewayRegistry::with_manual();
        assert!(registry.contains(crate::models::product::MANUAL_PROVIDER));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["manual"]);
    }

    #[test]
    fn error_display_names_the_provider() {
        let err = ProviderError::Api {
            provider: "gelato".to_owned(),
            status: 422,
            message: "no shipment methods".to_owned(),
        };
        assert!(err.to_string().contains("gelato"));
        assert!(err.to_string().contains("422"));
    }
}
