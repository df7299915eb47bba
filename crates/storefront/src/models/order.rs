//! Persisted orders.
//!
//! An order is created once per checkout confirmation and then only mutated:
//! by the checkout orchestrator (session/draft references, status), by
//! webhook handlers (status, tracking), and by the abandonment sweeper
//! (cancellation statuses). Orders are never deleted - cancellation is a
//! status transition, not a row removal.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};

use inkwave_core::{Money, OrderId, OrderStatus, ProductId, ShippingAddress, UserId, VariantId};

use super::product::FulfillmentConfig;

/// Length of the random suffix in a fulfillment reference ID.
const REFERENCE_SUFFIX_LEN: usize = 12;

/// A customer order with frozen line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total: Money,
    /// Payment session reference, set once the session exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_provider: Option<String>,
    /// Fulfillment provider name -> remote draft order ID. Populated
    /// incrementally as each provider's draft is created, so a failed
    /// checkout shows exactly which providers got a draft.
    #[serde(default)]
    pub draft_order_ids: BTreeMap<String, String>,
    /// Locally generated correlation token, independent of the order ID.
    pub fulfillment_reference_id: String,
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub tracking: Vec<TrackingInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_estimate: Option<DeliveryEstimate>,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create a fresh `pending` order with frozen line items.
    #[must_use]
    pub fn new(
        user_id: UserId,
        total: Money,
        shipping_address: ShippingAddress,
        items: Vec<OrderItem>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::generate(),
            user_id,
            status: OrderStatus::Pending,
            total,
            checkout_session_id: None,
            checkout_provider: None,
            draft_order_ids: BTreeMap::new(),
            fulfillment_reference_id: generate_fulfillment_reference(),
            shipping_address,
            tracking: Vec::new(),
            delivery_estimate: None,
            items,
            created_at: now,
            updated_at: now,
        }
    }

}

/// A frozen copy of the purchased product/variant at order-creation time.
///
/// Later catalog edits must not retroactively change historical orders, so
/// everything needed for display and fulfillment is copied here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_title: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// The provider this line is routed to (`"manual"` for local items).
    pub fulfillment_provider: String,
    /// The fulfillment binding in effect when the order was placed.
    #[serde(default)]
    pub fulfillment: FulfillmentConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl OrderItem {
    /// Line total (unit price x quantity).
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// A shipment tracking entry reported by a provider webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingInfo {
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    pub tracking_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_url: Option<String>,
    pub added_at: DateTime<Utc>,
}

/// Aggregated delivery window in days, across all providers on the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryEstimate {
    pub min_days: u32,
    pub max_days: u32,
}

/// Generate a fulfillment reference token (`FR-` + 12 alphanumerics).
fn generate_fulfillment_reference() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(REFERENCE_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("FR-{}", suffix.to_ascii_uppercase())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use inkwave_core::{CurrencyCode, Email};
    use rust_decimal::Decimal;

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

    #[test]
    fn new_order_starts_pending_with_reference() {
        let order = Order::new(
            UserId::new("guest"),
            Money::new(Decimal::from(20), CurrencyCode::USD),
            address(),
            Vec::new(),
        );
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.fulfillment_reference_id.starts_with("FR-"));
        assert_eq!(order.fulfillment_reference_id.len(), 3 + REFERENCE_SUFFIX_LEN);
        assert!(order.draft_order_ids.is_empty());
        assert!(order.checkout_session_id.is_none());
    }

    #[test]
    fn fulfillment_references_are_unique() {
        assert_ne!(
            generate_fulfillment_reference(),
            generate_fulfillment_reference()
        );
    }

    #[test]
    fn line_total_scales_unit_price() {
        let item = OrderItem {
            product_id: ProductId::new("poster"),
            variant_id: None,
            name: "Poster".to_owned(),
            variant_title: None,
            quantity: 3,
            unit_price: Money::new(Decimal::from(10), CurrencyCode::USD),
            attributes: BTreeMap::new(),
            fulfillment_provider: "manual".to_owned(),
            fulfillment: FulfillmentConfig::default(),
            image_url: None,
        };
        assert_eq!(item.line_total().amount, Decimal::from(30));
    }
}
