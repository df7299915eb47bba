//! Ephemeral shipping quotes.
//!
//! A quote is computed per request and returned to the storefront; it is
//! never persisted. Invariant: `total = subtotal + shipping_cost` where
//! `shipping_cost` is the sum of each provider's selected (cheapest) rate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use inkwave_core::{CurrencyCode, ProductId, RateId, VariantId};

use super::order::DeliveryEstimate;
use crate::providers::ShippingRate;

/// One cart line as submitted for quoting or checkout.
///
/// `variant_id` absent means the product's first variant (or the base
/// product, for variant-less products) is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    pub quantity: u32,
}

/// An aggregated shipping quote across all providers in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub currency: CurrencyCode,
    pub providers: Vec<ProviderQuote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_estimate: Option<DeliveryEstimate>,
}

/// Per-provider breakdown of a quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderQuote {
    pub provider: String,
    pub item_count: u32,
    pub subtotal: Decimal,
    pub selected_shipping: SelectedRate,
    pub available_rates: Vec<ShippingRate>,
}

/// The cheapest rate a provider offered, as shown to the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedRate {
    pub rate_id: RateId,
    pub name: String,
    pub shipping_cost: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_delivery_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_delivery_days: Option<u32>,
}

impl From<&ShippingRate> for SelectedRate {
    fn from(rate: &ShippingRate) -> Self {
        Self {
            rate_id: rate.id.clone(),
            name: rate.name.clone(),
            shipping_cost: rate.rate,
            min_delivery_days: rate.min_delivery_days,
            max_delivery_days: rate.max_delivery_days,
        }
    }
}
