//! Payment provider gateways.
//!
//! One capability matters to the orchestrator: turn an aggregate order total
//! plus display line items into a hosted checkout session the customer can
//! be redirected to. The per-provider fulfillment breakdown never reaches
//! the payment provider - only totals and the metadata needed to reconcile
//! the webhook back to local state.

pub mod stripe;

pub use stripe::StripeGateway;

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use inkwave_core::{Money, MoneyError, OrderId};

/// Errors from a payment gateway call.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The HTTP request to the provider failed.
    #[error("request to payment provider '{provider}' failed: {source}")]
    Request {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    /// The provider returned an error response.
    #[error("payment provider '{provider}' returned {status}: {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    /// The provider's response was missing an expected field.
    #[error("unexpected response from payment provider '{provider}': {message}")]
    UnexpectedResponse { provider: String, message: String },

    /// An amount could not be converted to the provider's representation.
    #[error("invalid amount: {0}")]
    Amount(#[from] MoneyError),
}

/// One display line on the hosted checkout page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentLineItem {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// Price per unit in major currency units.
    pub unit_amount: Money,
    pub quantity: u32,
}

/// A checkout-session creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    pub order_id: OrderId,
    /// Aggregate total the session must charge.
    pub amount: Money,
    pub items: Vec<PaymentLineItem>,
    pub customer_email: String,
    pub success_url: String,
    pub cancel_url: String,
    /// Opaque keys persisted on the session; the webhook handler reads
    /// these to reconcile provider drafts against the local order.
    pub metadata: BTreeMap<String, String>,
}

/// A created hosted checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub session_id: String,
    pub url: String,
}

/// Uniform capability surface over a payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// The provider name recorded on orders (e.g. `"stripe"`).
    fn name(&self) -> &str;

    /// Create a hosted checkout session for the aggregate total.
    async fn create_checkout(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError>;
}
