//! Stripe payment gateway.
//!
//! Creates hosted Checkout Sessions via Stripe's form-encoded API. Amounts
//! are converted to minor units at this boundary; everything upstream works
//! in major units.
//!
//! # API Reference
//!
//! - Base URL: `https://api.stripe.com`
//! - Authentication: HTTP basic, secret key as the username
//! - Endpoint: `POST /v1/checkout/sessions` with bracketed form fields

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use super::{CheckoutSession, CheckoutSessionRequest, PaymentError, PaymentGateway};
use crate::config::StripeConfig;

/// Provider name recorded on orders paid through Stripe.
pub const PROVIDER_NAME: &str = "stripe";

const BASE_URL: &str = "https://api.stripe.com";

/// Gateway for Stripe Checkout.
#[derive(Clone)]
pub struct StripeGateway {
    inner: Arc<StripeInner>,
}

struct StripeInner {
    client: reqwest::Client,
    base_url: String,
    secret_key: SecretString,
}

impl StripeGateway {
    /// Create a new Stripe gateway from configuration.
    #[must_use]
    pub fn new(config: &StripeConfig) -> Self {
        Self::with_base_url(config, BASE_URL)
    }

    /// Create a gateway pointed at a different base URL (tests).
    #[must_use]
    pub fn with_base_url(config: &StripeConfig, base_url: &str) -> Self {
        Self {
            inner: Arc::new(StripeInner {
                client: reqwest::Client::new(),
                base_url: base_url.trim_end_matches('/').to_owned(),
                secret_key: config.secret_key.clone(),
            }),
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    #[instrument(skip_all, fields(provider = PROVIDER_NAME, order_id = %request.order_id))]
    async fn create_checkout(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let params = build_session_params(request)?;

        let response = self
            .inner
            .client
            .post(format!("{}/v1/checkout/sessions", self.inner.base_url))
            .basic_auth(self.inner.secret_key.expose_secret(), None::<&str>)
            .form(&params)
            .send()
            .await
            .map_err(|e| PaymentError::Request {
                provider: PROVIDER_NAME.to_owned(),
                source: e,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| PaymentError::Request {
            provider: PROVIDER_NAME.to_owned(),
            source: e,
        })?;

        if !status.is_success() {
            return Err(PaymentError::Api {
                provider: PROVIDER_NAME.to_owned(),
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        let session: WireSession =
            serde_json::from_str(&body).map_err(|e| PaymentError::UnexpectedResponse {
                provider: PROVIDER_NAME.to_owned(),
                message: format!("malformed session: {e}"),
            })?;

        let url = session.url.ok_or_else(|| PaymentError::UnexpectedResponse {
            provider: PROVIDER_NAME.to_owned(),
            message: "session has no redirect url".to_owned(),
        })?;

        Ok(CheckoutSession {
            session_id: session.id,
            url,
        })
    }
}

/// Flatten a session request into Stripe's bracketed form fields.
fn build_session_params(
    request: &CheckoutSessionRequest,
) -> Result<Vec<(String, String)>, PaymentError> {
    let mut params: Vec<(String, String)> = vec![
        ("mode".to_owned(), "payment".to_owned()),
        ("success_url".to_owned(), request.success_url.clone()),
        ("cancel_url".to_owned(), request.cancel_url.clone()),
        ("customer_email".to_owned(), request.customer_email.clone()),
        (
            "client_reference_id".to_owned(),
            request.order_id.to_string(),
        ),
    ];

    for (i, item) in request.items.iter().enumerate() {
        let prefix = format!("line_items[{i}]");
        params.push((format!("{prefix}[quantity]"), item.quantity.to_string()));
        params.push((
            format!("{prefix}[price_data][currency]"),
            item.unit_amount.currency.code_lower().to_owned(),
        ));
        params.push((
            format!("{prefix}[price_data][unit_amount]"),
            item.unit_amount.minor_units()?.to_string(),
        ));
        params.push((
            format!("{prefix}[price_data][product_data][name]"),
            item.name.clone(),
        ));
        if let Some(description) = &item.description {
            params.push((
                format!("{prefix}[price_data][product_data][description]"),
                description.clone(),
            ));
        }
        if let Some(image_url) = &item.image_url {
            params.push((
                format!("{prefix}[price_data][product_data][images][0]"),
                image_url.clone(),
            ));
        }
    }

    for (key, value) in &request.metadata {
        params.push((format!("metadata[{key}]"), value.clone()));
    }

    Ok(params)
}

#[derive(Deserialize)]
struct WireSession {
    id: String,
    url: Option<String>,
}

fn extract_error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<ErrorDetail>,
    }
    #[derive(Deserialize)]
    struct ErrorDetail {
        message: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|e| e.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.chars().take(200).collect())
}
