//! The synthetic gateway for locally fulfilled items.
//!
//! Items whose product has no dropship provider are routed to `"manual"`.
//! Quoting is answered in-process with a single flat rate so local items
//! never block the quote flow on an external call. The orchestrator never
//! creates draft orders for the manual bucket; the order-side methods exist
//! to satisfy the gateway contract and return synthetic results.

use async_trait::async_trait;
use rust_decimal::Decimal;

use inkwave_core::{CurrencyCode, RateId};

use super::{
    DraftOrderRequest, FulfillmentGateway, ProviderError, RemoteOrder, ShippingQuoteRequest,
    ShippingRate,
};
use crate::models::product::MANUAL_PROVIDER;

/// Rate ID of the single flat manual rate.
pub const MANUAL_RATE_ID: &str = "manual-standard";

/// Delivery window quoted for locally fulfilled items, in days.
const MANUAL_MIN_DAYS: u32 = 5;
const MANUAL_MAX_DAYS: u32 = 10;

/// In-process gateway for the `"manual"` provider.
#[derive(Debug, Clone, Default)]
pub struct ManualFulfillment;

impl ManualFulfillment {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FulfillmentGateway for ManualFulfillment {
    fn name(&self) -> &str {
        MANUAL_PROVIDER
    }

    async fn quote_order(
        &self,
        request: &ShippingQuoteRequest,
    ) -> Result<Vec<ShippingRate>, ProviderError> {
        Ok(vec![ShippingRate {
            id: RateId::new(MANUAL_RATE_ID),
            name: "Standard Shipping".to_owned(),
            rate: Decimal::ZERO,
            currency: request.currency,
            min_delivery_days: Some(MANUAL_MIN_DAYS),
            max_delivery_days: Some(MANUAL_MAX_DAYS),
        }])
    }

    async fn create_order(
        &self,
        request: &DraftOrderRequest,
    ) -> Result<RemoteOrder, ProviderError> {
        Ok(RemoteOrder {
            id: format!("manual-{}", request.external_id),
            status: "draft".to_owned(),
        })
    }

    async fn cancel_order(&self, id: &str) -> Result<RemoteOrder, ProviderError> {
        Ok(RemoteOrder {
            id: id.to_owned(),
            status: "canceled".to_owned(),
        })
    }

    async fn confirm_order(&self, id: &str) -> Result<RemoteOrder, ProviderError> {
        Ok(RemoteOrder {
            id: id.to_owned(),
            status: "confirmed".to_owned(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::providers::Recipient;

    fn request() -> ShippingQuoteRequest {
        ShippingQuoteRequest {
            recipient: Recipient {
                name: "Ada Lovelace".to_owned(),
                address1: "1 Analytical Way".to_owned(),
                address2: None,
                city: "London".to_owned(),
                state_code: "LND".to_owned(),
                country_code: "GB".to_owned(),
                zip: "EC1A 1BB".to_owned(),
                email: "ada@example.com".to_owned(),
                phone: None,
            },
            items: Vec::new(),
            currency: CurrencyCode::USD,
        }
    }

    #[tokio::test]
    async fn quotes_exactly_one_free_rate() {
        let gateway = ManualFulfillment::new();
        let rates = gateway.quote_order(&request()).await.unwrap();
        assert_eq!(rates.len(), 1);
        let rate = rates.first().unwrap();
        assert_eq!(rate.id, RateId::new(MANUAL_RATE_ID));
        assert_eq!(rate.rate, Decimal::ZERO);
        assert_eq!(rate.min_delivery_days, Some(5));
        assert_eq!(rate.max_delivery_days, Some(10));
    }

    #[tokio::test]
    async fn quote_preserves_request_currency() {
        let gateway = ManualFulfillment::new();
        let mut req = request();
        req.currency = CurrencyCode::EUR;
        let rates = gateway.quote_order(&req).await.unwrap();
        assert_eq!(rates.first().unwrap().currency, CurrencyCode::EUR);
    }
}
