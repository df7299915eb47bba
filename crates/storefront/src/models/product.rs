//! Catalog products and variants.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use inkwave_core::{Money, ProductId, VariantId};

/// Name of the synthetic provider for locally fulfilled items.
pub const MANUAL_PROVIDER: &str = "manual";

fn default_provider() -> String {
    MANUAL_PROVIDER.to_owned()
}

/// A sellable product.
///
/// The `fulfillment_provider` names the gateway that produces and ships this
/// product; `"manual"` means the item is packed locally and never leaves the
/// building through a dropship API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Base price; variants may override it.
    pub price: Money,
    #[serde(default = "default_provider")]
    pub fulfillment_provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default = "Product::default_active")]
    pub active: bool,
}

impl Product {
    const fn default_active() -> bool {
        true
    }

    /// Look up a variant by ID.
    #[must_use]
    pub fn variant(&self, id: &VariantId) -> Option<&Variant> {
        self.variants.iter().find(|v| &v.id == id)
    }

    /// The variant used when a cart item names none: the first one, if any.
    #[must_use]
    pub fn default_variant(&self) -> Option<&Variant> {
        self.variants.first()
    }
}

/// A concrete purchasable variation of a product (size, color, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: VariantId,
    pub title: String,
    /// Overrides the product price when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub fulfillment: FulfillmentConfig,
}

/// Provider-side identifiers needed to place an order for one variant.
///
/// Only meaningful in the context of the parent product's
/// `fulfillment_provider`; there is no cross-provider reuse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentConfig {
    /// The provider's variant identifier (e.g. a Printful catalog variant).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_variant_id: Option<String>,
    /// The provider's product identifier, when variants alone don't suffice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_product_id: Option<String>,
    /// Print/design files submitted with the order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub design_files: Vec<DesignFile>,
    /// Opaque provider-specific payload merged into order requests.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub extra: serde_json::Value,
}

/// A design file reference forwarded to the fulfillment provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignFile {
    pub url: String,
    /// Provider-specific placement hint (e.g. "front", "back").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<String>,
}
