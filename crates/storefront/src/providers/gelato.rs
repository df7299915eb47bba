//! Gelato fulfillment gateway.
//!
//! REST client for the Gelato order API. Unlike Printful there is no
//! response envelope; errors arrive as `{code, message}` bodies.
//!
//! # API Reference
//!
//! - Base URL: `https://order.gelatoapis.com`
//! - Authentication: `X-API-KEY: <key>`
//! - Draft orders are created with `orderType: "draft"` and promoted to
//!   production by patching `orderType` to `"order"`

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use inkwave_core::RateId;

use super::{
    DraftOrderRequest, FulfillmentGateway, ProviderError, Recipient, RemoteOrder,
    ShippingQuoteRequest, ShippingRate,
};
use crate::config::GelatoConfig;

/// Provider name this gateway registers under.
pub const PROVIDER_NAME: &str = "gelato";

const BASE_URL: &str = "https://order.gelatoapis.com";

/// Gateway for Gelato print-on-demand fulfillment.
#[derive(Clone, Debug)]
pub struct GelatoGateway {
    inner: Arc<GelatoInner>,
}

#[derive(Debug)]
struct GelatoInner {
    client: reqwest::Client,
    base_url: String,
}

impl GelatoGateway {
    /// Create a new Gelato gateway from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &GelatoConfig) -> Result<Self, ProviderError> {
        Self::with_base_url(config, BASE_URL)
    }

    /// Create a gateway pointed at a different base URL (tests).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_base_url(config: &GelatoConfig, base_url: &str) -> Result<Self, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-API-KEY",
            HeaderValue::from_str(config.api_key.expose_secret()).map_err(|e| {
                ProviderError::UnexpectedResponse {
                    provider: PROVIDER_NAME.to_owned(),
                    message: format!("invalid API key format: {e}"),
                }
            })?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ProviderError::Request {
                provider: PROVIDER_NAME.to_owned(),
                source: e,
            })?;

        Ok(Self {
            inner: Arc::new(GelatoInner {
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

        serde_json::from_str(&body).map_err(|e| ProviderError::UnexpectedResponse {
            provider: PROVIDER_NAME.to_owned(),
            message: format!("malformed response: {e}"),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }
}

#[async_trait]
impl FulfillmentGateway for GelatoGateway {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    #[instrument(skip_all, fields(provider = PROVIDER_NAME, items = request.items.len()))]
    async fn quote_order(
        &self,
        request: &ShippingQuoteRequest,
    ) -> Result<Vec<ShippingRate>, ProviderError> {
        let body = QuoteBody::from(request);
        let response: QuoteResponse = self
            .send(
                self.inner
                    .client
                    .post(self.url("/v4/orders:quote"))
                    .json(&body),
            )
            .await?;

        // Methods are quoted per fulfillment country; the first quote covers
        // the whole bucket for single-country orders.
        let methods = response
            .quotes
            .into_iter()
            .next()
            .map(|q| q.shipment_methods)
            .unwrap_or_default();

        methods.into_iter().map(WireMethod::into_rate).collect()
    }

    #[instrument(skip_all, fields(provider = PROVIDER_NAME, external_id = %request.external_id))]
    async fn create_order(
        &self,
        request: &DraftOrderRequest,
    ) -> Result<RemoteOrder, ProviderError> {
        let body = CreateOrderBody::from(request);
        let order: WireOrder = self
            .send(self.inner.client.post(self.url("/v4/orders")).json(&body))
            .await?;
        Ok(order.into())
    }

    #[instrument(skip_all, fields(provider = PROVIDER_NAME, order_id = id))]
    async fn cancel_order(&self, id: &str) -> Result<RemoteOrder, ProviderError> {
        // Cancellation returns an empty body on success.
        let _: serde_json::Value = self
            .send(
                self.inner
                    .client
                    .post(self.url(&format!("/v4/orders/{id}:cancel"))),
            )
            .await
            .or_else(|err| match err {
                ProviderError::UnexpectedResponse { .. } => Ok(serde_json::Value::Null),
                other => Err(other),
            })?;

        Ok(RemoteOrder {
            id: id.to_owned(),
            status: "canceled".to_owned(),
        })
    }

    #[instrument(skip_all, fields(provider = PROVIDER_NAME, order_id = id))]
    async fn confirm_order(&self, id: &str) -> Result<RemoteOrder, ProviderError> {
        let body = serde_json::json!({ "orderType": "order" });
        let order: WireOrder = self
            .send(
                self.inner
                    .client
                    .patch(self.url(&format!("/v4/orders/{id}")))
                    .json(&body),
            )
            .await?;
        Ok(order.into())
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QuoteBody {
    recipient: WireAddress,
    products: Vec<WireProduct>,
    currency: String,
}

impl From<&ShippingQuoteRequest> for QuoteBody {
    fn from(req: &ShippingQuoteRequest) -> Self {
        Self {
            recipient: WireAddress::from_recipient(&req.recipient),
            products: req
                .items
                .iter()
                .enumerate()
                .map(|(i, item)| WireProduct {
                    item_reference_id: format!("item-{i}"),
                    product_uid: item
                        .external_product_id
                        .clone()
                        .or_else(|| item.external_variant_id.clone())
                        .unwrap_or_default(),
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
            currency: req.currency.code().to_owned(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireAddress {
    first_name: String,
    last_name: String,
    address_line1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    address_line2: Option<String>,
    city: String,
    state_code: String,
    country: String,
    post_code: String,
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
}

impl WireAddress {
    fn from_recipient(recipient: &Recipient) -> Self {
        // Gelato wants split names; the recipient carries a joined one.
        let (first, last) = recipient
            .name
            .split_once(' ')
            .map_or((recipient.name.as_str(), ""), |(f, l)| (f, l));
        Self {
            first_name: first.to_owned(),
            last_name: last.to_owned(),
            address_line1: recipient.address1.clone(),
            address_line2: recipient.address2.clone(),
            city: recipient.city.clone(),
            state_code: recipient.state_code.clone(),
            country: recipient.country_code.clone(),
            post_code: recipient.zip.clone(),
            email: recipient.email.clone(),
            phone: recipient.phone.clone(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireProduct {
    item_reference_id: String,
    product_uid: String,
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

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResponse {
    #[serde(default)]
    quotes: Vec<WireQuote>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireQuote {
    #[serde(default)]
    shipment_methods: Vec<WireMethod>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMethod {
    shipment_method_uid: String,
    name: String,
    price: Decimal,
    currency: String,
    min_delivery_days: Option<u32>,
    max_delivery_days: Option<u32>,
}

impl WireMethod {
    fn into_rate(self) -> Result<ShippingRate, ProviderError> {
        let currency = self
            .currency
            .parse()
            .map_err(|_| ProviderError::UnexpectedResponse {
                provider: PROVIDER_NAME.to_owned(),
                message: format!("unknown currency: {}", self.currency),
            })?;
        Ok(ShippingRate {
            id: RateId::new(self.shipment_method_uid),
            name: self.name,
            rate: self.price,
            currency,
            min_delivery_days: self.min_delivery_days,
            max_delivery_days: self.max_delivery_days,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrderBody {
    order_type: String,
    order_reference_id: String,
    currency: String,
    shipping_address: WireAddress,
    items: Vec<WireProduct>,
    #[serde(skip_serializing_if = "Option::is_none")]
    shipment_method_uid: Option<String>,
}

impl From<&DraftOrderRequest> for CreateOrderBody {
    fn from(req: &DraftOrderRequest) -> Self {
        Self {
            order_type: "draft".to_owned(),
            order_reference_id: req.external_id.clone(),
            currency: req.retail_costs.currency.code().to_owned(),
            shipping_address: WireAddress::from_recipient(&req.recipient),
            items: req
                .items
                .iter()
                .enumerate()
                .map(|(i, item)| WireProduct {
                    item_reference_id: format!("item-{i}"),
                    product_uid: item
                        .external_product_id
                        .clone()
                        .or_else(|| item.external_variant_id.clone())
                        .unwrap_or_default(),
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
            shipment_method_uid: req.shipping_rate_id.as_ref().map(|r| r.as_str().to_owned()),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireOrder {
    id: String,
    #[serde(default)]
    fulfillment_status: Option<String>,
}

impl From<WireOrder> for RemoteOrder {
    fn from(order: WireOrder) -> Self {
        Self {
            id: order.id,
            status: order.fulfillment_status.unwrap_or_else(|| "created".to_owned()),
        }
    }
}

fn extract_error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn quote_response_parses_shipment_methods() {
        let json = r#"{
            "orderReferenceId": "ord-1",
            "quotes": [{
                "fulfillmentCountry": "US",
                "shipmentMethods": [
                    {"shipmentMethodUid": "express", "name": "Express", "price": 12.5,
                     "currency": "USD", "minDeliveryDays": 1, "maxDeliveryDays": 3},
                    {"shipmentMethodUid": "normal", "name": "Standard", "price": 4.0,
                     "currency": "USD", "minDeliveryDays": 4, "maxDeliveryDays": 9}
                ]
            }]
        }"#;
        let response: QuoteResponse = serde_json::from_str(json).unwrap();
        let rates: Vec<ShippingRate> = response
            .quotes
            .into_iter()
            .next()
            .unwrap()
            .shipment_methods
            .into_iter()
            .map(|m| m.into_rate().unwrap())
            .collect();
        assert_eq!(rates.len(), 2);
        assert_eq!(rates.first().unwrap().id, RateId::new("express"));
        assert_eq!(rates.get(1).unwrap().rate, Decimal::from(4));
    }

    #[test]
    fn recipient_name_is_split_for_gelato() {
        let recipient = Recipient {
            name: "Ada Lovelace".to_owned(),
            address1: "1 Analytical Way".to_owned(),
            address2: None,
            city: "London".to_owned(),
            state_code: "LND".to_owned(),
            country_code: "GB".to_owned(),
            zip: "EC1A 1BB".to_owned(),
            email: "ada@example.com".to_owned(),
            phone: None,
        };
        let wire = WireAddress::from_recipient(&recipient);
        assert_eq!(wire.first_name, "Ada");
        assert_eq!(wire.last_name, "Lovelace");
    }

    #[test]
    fn error_message_prefers_body_message() {
        assert_eq!(
            extract_error_message(r#"{"code": "invalid", "message": "Bad product uid"}"#),
            "Bad product uid"
        );
        assert_eq!(extract_error_message("plain text"), "plain text");
    }
}
