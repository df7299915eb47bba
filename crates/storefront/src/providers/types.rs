//! Request/response types shared by all fulfillment gateways.
//!
//! Every concrete gateway adapts its provider's wire format to and from
//! these types; nothing provider-specific leaks past this module boundary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use inkwave_core::{CurrencyCode, RateId, ShippingAddress};

use crate::models::product::{DesignFile, FulfillmentConfig};

/// The shipment recipient, derived from the customer's shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub name: String,
    pub address1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    pub city: String,
    pub state_code: String,
    pub country_code: String,
    pub zip: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl From<&ShippingAddress> for Recipient {
    fn from(addr: &ShippingAddress) -> Self {
        Self {
            name: addr.full_name(),
            address1: addr.address1.clone(),
            address2: addr.address2.clone(),
            city: addr.city.clone(),
            state_code: addr.state.clone(),
            country_code: addr.country.clone(),
            zip: addr.postal_code.clone(),
            email: addr.email.to_string(),
            phone: addr.phone.clone(),
        }
    }
}

/// One order line as the provider sees it: external identifiers plus
/// quantity and design files, taken from the variant's fulfillment binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_variant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_product_id: Option<String>,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub design_files: Vec<DesignFile>,
    /// Opaque provider-specific payload carried through from the catalog.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub extra: serde_json::Value,
}

impl OrderItemRef {
    /// Build an item reference from a fulfillment binding and quantity.
    #[must_use]
    pub fn from_config(config: &FulfillmentConfig, quantity: u32) -> Self {
        Self {
            external_variant_id: config.external_variant_id.clone(),
            external_product_id: config.external_product_id.clone(),
            quantity,
            design_files: config.design_files.clone(),
            extra: config.extra.clone(),
        }
    }
}

/// A shipping-quote request for one provider bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingQuoteRequest {
    pub recipient: Recipient,
    pub items: Vec<OrderItemRef>,
    pub currency: CurrencyCode,
}

/// A shipping rate offered by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRate {
    pub id: RateId,
    pub name: String,
    /// Cost in major currency units.
    pub rate: Decimal,
    pub currency: CurrencyCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_delivery_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_delivery_days: Option<u32>,
}

/// Retail amounts echoed to the provider on the customer's receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetailCosts {
    pub subtotal: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping: Option<Decimal>,
    pub currency: CurrencyCode,
}

/// A draft-order creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftOrderRequest {
    /// Local correlation key, sent to the provider as its external ID.
    pub external_id: String,
    pub recipient: Recipient,
    pub items: Vec<OrderItemRef>,
    pub retail_costs: RetailCosts,
    /// The customer's chosen shipping rate for this provider, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_rate_id: Option<RateId>,
}

/// A provider-side order as reported by create/cancel/confirm calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteOrder {
    pub id: String,
    pub status: String,
}
