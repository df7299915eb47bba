//! Printful fulfillment gateway.
//!
//! REST client for the Printful API. All responses arrive in a
//! `{code, result}` envelope; errors carry a message in `result` or
//! `error.message`.
//!
//! # API Reference
//!
//! - Base URL: `https://api.printful.com`
//! - Authentication: `Authorization: Bearer <key>`
//! - Multi-store tokens scope requests via the `X-PF-Store-Id` header

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use inkwave_core::RateId;

use super::{
    DraftOrderRequest, FulfillmentGateway, ProviderError, RemoteOrder, ShippingQuoteRequest,
    ShippingRate,
};
use crate::config::PrintfulConfig;

/// Provider name this gateway registers under.
pub const PROVIDER_NAME: &str = "printful";

const BASE_URL: &str = "https://api.printful.com";

/// Gateway for Printful print-on-demand fulfillment.
#[derive(Clone, Debug)]
pub struct PrintfulGateway {
    inner: Arc<PrintfulInner>,
}

#[derive(Debug)]
struct PrintfulInner {
    client: reqwest::Client,
    base_url: String,
}

impl PrintfulGateway {
    /// Create a new Printful gateway from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &PrintfulConfig) -> Result<Self, ProviderError> {
        Self::with_base_url(config, BASE_URL)
    }

    /// Create a gateway pointed at a different base URL (tests).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_base_url(config: &PrintfulConfig, base_url: &str) -> Result<Self, ProviderError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_key.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value).map_err(|e| ProviderError::UnexpectedResponse {
                provider: PROVIDER_NAME.to_owned(),
                message: format!("invalid API key format: {e}"),
            })?,
        );

        if let Some(store_id) = &config.store_id {
            headers.insert(
                "X-PF-Store-Id",
                HeaderValue::from_str(store_id).map_err(|e| {
                    ProviderError::UnexpectedResponse {
                        provider: PROVIDER_NAME.to_owned(),
                        message: format!("invalid store id: {e}"),
                    }
                })?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ProviderError::Request {
                provider: PROVIDER_NAME.to_owned(),
                source: e,
            })?;

        Ok(Self {
            inner: Arc::new(PrintfulInner {
                client,
                base_url: base_url.trim_end_matches('/').to_owned(),
            }),
        })
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ProviderError> {
        let response = request.send().await.map_err(|e| ProviderError::Request {
            provider: PROVIDER_NAME.to_owned(),
            source: e,
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ProviderError::Request {
            provider: PROVIDER_NAME.to_owned(),
            source: e,
        })?;

        if !status.is_success() {
            return Err(ProviderError::Api {
                provider: PROVIDER_NAME.to_owned(),
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        let envelope: Envelope<T> =
            serde_json::from_str(&body).map_err(|e| ProviderError::UnexpectedResponse {
                provider: PROVIDER_NAME.to_owned(),
                message: format!("malformed envelope: {e}"),
            })?;

        Ok(envelope.result)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }
}

#[async_trait]
impl FulfillmentGateway for PrintfulGateway {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    #[instrument(skip_all, fields(provider = PROVIDER_NAME, items = request.items.len()))]
    async fn quote_order(
        &self,
        request: &ShippingQuoteRequest,
    ) -> Result<Vec<ShippingRate>, ProviderError> {
        let body = ShippingRatesBody::from(request);
        let rates: Vec<WireRate> = self
            .send(self.inner.client.post(self.url("/shipping/rates")).json(&body))
            .await?;

        rates.into_iter().map(WireRate::into_rate).collect()
    }

    #[instrument(skip_all, fields(provider = PROVIDER_NAME, external_id = %request.external_id))]
    async fn create_order(
        &self,
        request: &DraftOrderRequest,
    ) -> Result<RemoteOrder, ProviderError> {
        let body = CreateOrderBody::from(request);
        let order: WireOrder = self
            .send(
                self.inner
                    .client
                    .post(self.url("/orders"))
                    .query(&[("confirm", "false")])
                    .json(&body),
            )
            .await?;

        Ok(order.into())
    }

    #[instrument(skip_all, fields(provider = PROVIDER_NAME, order_id = id))]
    async fn cancel_order(&self, id: &str) -> Result<RemoteOrder, ProviderError> {
        let order: WireOrder = self
            .send(self.inner.client.delete(self.url(&format!("/orders/{id}"))))
            .await?;
        Ok(order.into())
    }

    #[instrument(skip_all, fields(provider = PROVIDER_NAME, order_id = id))]
    async fn confirm_order(&self, id: &str) -> Result<RemoteOrder, ProviderError> {
        let order: WireOrder = self
            .send(
                self.inner
                    .client
                    .post(self.url(&format!("/orders/{id}/confirm"))),
            )
            .await?;
        Ok(order.into())
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Serialize)]
struct ShippingRatesBody {
    recipient: WireAddress,
    items: Vec<WireQuoteItem>,
    currency: String,
}

impl From<&ShippingQuoteRequest> for ShippingRatesBody {
    fn from(req: &ShippingQuoteRequest) -> Self {
        Self {
            recipient: WireAddress::from_recipient(&req.recipient),
            items: req
                .items
                .iter()
                .map(|item| WireQuoteItem {
                    variant_id: item.external_variant_id.clone(),
                    quantity: item.quantity,
                })
                .collect(),
            currency: req.currency.code().to_owned(),
        }
    }
}

#[derive(Serialize)]
struct WireAddress {
    name: String,
    address1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    address2: Option<String>,
    city: String,
    state_code: String,
    country_code: String,
    zip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
}

impl WireAddress {
    fn from_recipient(recipient: &super::Recipient) -> Self {
        Self {
            name: recipient.name.clone(),
            address1: recipient.address1.clone(),
            address2: recipient.address2.clone(),
            city: recipient.city.clone(),
            state_code: recipient.state_code.clone(),
            country_code: recipient.country_code.clone(),
            zip: recipient.zip.clone(),
            email: Some(recipient.email.clone()),
            phone: recipient.phone.clone(),
        }
    }
}

#[derive(Serialize)]
struct WireQuoteItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    variant_id: Option<String>,
    quantity: u32,
}

#[derive(Serialize)]
struct CreateOrderBody {
    external_id: String,
    recipient: WireAddress,
    items: Vec<WireOrderItem>,
    retail_costs: WireRetailCosts,
    #[serde(skip_serializing_if = "Option::is_none")]
    shipping: Option<String>,
}

impl From<&DraftOrderRequest> for CreateOrderBody {
    fn from(req: &DraftOrderRequest) -> Self {
        Self {
            external_id: req.external_id.clone(),
            recipient: WireAddress::from_recipient(&req.recipient),
            items: req
                .items
                .iter()
                .map(|item| WireOrderItem {
                    variant_id: item.external_variant_id.clone(),
                    quantity: item.quantity,
                    files: item
                        .design_files
                        .iter()
                        .map(|f| WireFile {
                            url: f.url.clone(),
                            r#type: f.placement.clone(),
                        })
                        .collect(),
                })
                .collect(),
            retail_costs: WireRetailCosts {
                subtotal: req.retail_costs.subtotal.to_string(),
                shipping: req.retail_costs.shipping.map(|s| s.to_string()),
                currency: req.retail_costs.currency.code().to_owned(),
            },
            shipping: req.shipping_rate_id.as_ref().map(|r| r.as_str().to_owned()),
        }
    }
}

#[derive(Serialize)]
struct WireOrderItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    variant_id: Option<String>,
    quantity: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    files: Vec<WireFile>,
}

#[derive(Serialize)]
struct WireFile {
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    r#type: Option<String>,
}

#[derive(Serialize)]
struct WireRetailCosts {
    subtotal: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    shipping: Option<String>,
    currency: String,
}

/// Printful reports rates as decimal strings with camelCase day bounds.
#[derive(Deserialize)]
struct WireRate {
    id: String,
    name: String,
    rate: String,
    currency: String,
    #[serde(rename = "minDeliveryDays")]
    min_delivery_days: Option<u32>,
    #[serde(rename = "maxDeliveryDays")]
    max_delivery_days: Option<u32>,
}

impl WireRate {
    fn into_rate(self) -> Result<ShippingRate, ProviderError> {
        let rate: Decimal =
            self.rate
                .parse()
                .map_err(|_| ProviderError::UnexpectedResponse {
                    provider: PROVIDER_NAME.to_owned(),
                    message: format!("unparseable rate amount: {}", self.rate),
                })?;
        let currency = self
            .currency
            .parse()
            .map_err(|_| ProviderError::UnexpectedResponse {
                provider: PROVIDER_NAME.to_owned(),
                message: format!("unknown currency: {}", self.currency),
            })?;

        Ok(ShippingRate {
            id: RateId::new(self.id),
            name: self.name,
            rate,
            currency,
            min_delivery_days: self.min_delivery_days,
            max_delivery_days: self.max_delivery_days,
        })
    }
}

#[derive(Deserialize)]
struct WireOrder {
    id: serde_json::Value,
    status: String,
}

impl From<WireOrder> for RemoteOrder {
    fn from(order: WireOrder) -> Self {
        // Printful order IDs are numeric; normalize to a string.
        let id = match order.id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        Self {
            id,
            status: order.status,
        }
    }
}

fn extract_error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<ErrorDetail>,
        result: Option<serde_json::Value>,
    }
    #[derive(Deserialize)]
    struct ErrorDetail {
        message: String,
    }

    serde_json::from_str::<ErrorBody>(body).map_or_else(
        |_| truncate(body),
        |parsed| {
            parsed.error.map(|e| e.message).unwrap_or_else(|| {
                parsed
                    .result
                    .and_then(|r| r.as_str().map(ToOwned::to_owned))
                    .unwrap_or_else(|| truncate(body))
            })
        },
    )
}

fn truncate(body: &str) -> String {
    body.chars().take(200).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn wire_rate_parses_decimal_strings() {
        let wire = WireRate {
            id: "STANDARD".to_owned(),
            name: "Flat Rate".to_owned(),
            rate: "5.99".to_owned(),
            currency: "USD".to_owned(),
            min_delivery_days: Some(3),
            max_delivery_days: Some(8),
        };
        let rate = wire.into_rate().unwrap();
        assert_eq!(rate.rate, "5.99".parse::<Decimal>().unwrap());
        assert_eq!(rate.id, RateId::new("STANDARD"));
    }

    #[test]
    fn wire_rate_rejects_garbage_amounts() {
        let wire = WireRate {
            id: "STANDARD".to_owned(),
            name: "Flat Rate".to_owned(),
            rate: "free".to_owned(),
            currency: "USD".to_owned(),
            min_delivery_days: None,
            max_delivery_days: None,
        };
        assert!(matches!(
            wire.into_rate(),
            Err(ProviderError::UnexpectedResponse { .. })
        ));
    }

    #[test]
    fn numeric_order_ids_are_normalized() {
        let wire: WireOrder =
            serde_json::from_str(r#"{"id": 13222, "status": "draft"}"#).unwrap();
        let remote = RemoteOrder::from(wire);
        assert_eq!(remote.id, "13222");
        assert_eq!(remote.status, "draft");
    }

    #[test]
    fn error_message_prefers_error_detail() {
        let body = r#"{"code": 400, "result": "Bad Request", "error": {"message": "Invalid variant"}}"#;
        assert_eq!(extract_error_message(body), "Invalid variant");
    }

    #[test]
    fn error_message_falls_back_to_result_string() {
        let body = r#"{"code": 400, "result": "Country code is invalid"}"#;
        assert_eq!(extract_error_message(body), "Country code is invalid");
    }
}
