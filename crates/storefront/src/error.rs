//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`.
//!
//! Status mapping follows the error taxonomy: unknown records are 404s,
//! caller contract violations are 400s, provider and payment failures are
//! 502s (the request was fine, the upstream was not), and store failures
//! are 500s with details withheld from the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::payments::PaymentError;
use crate::providers::ProviderError;
use crate::services::CheckoutError;
use crate::store::StoreError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Quote/checkout orchestration failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// A fulfillment gateway call failed.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// A payment gateway call failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid credentials on a guarded endpoint.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Provider(_) | Self::Payment(_) => StatusCode::BAD_GATEWAY,
            Self::Checkout(err) => checkout_status(err),
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    /// Client-facing message. Provider failures keep the provider name so
    /// the storefront can tell the customer which part of the cart failed;
    /// store/internal details are withheld.
    fn client_message(&self) -> String {
        match self {
            Self::Store(_) | Self::Internal(_) => "Internal server error".to_owned(),
            Self::Checkout(CheckoutError::Store(_)) => "Internal server error".to_owned(),
            Self::Checkout(err) => err.to_string(),
            Self::Provider(err) => err.to_string(),
            Self::Payment(err) => err.to_string(),
            Self::NotFound(_) | Self::BadRequest(_) | Self::Unauthorized(_) => self.to_string(),
        }
    }
}

fn checkout_status(err: &CheckoutError) -> StatusCode {
    match err {
        CheckoutError::UnknownProduct(_) | CheckoutError::UnknownVariant { .. } => {
            StatusCode::NOT_FOUND
        }
        CheckoutError::EmptyCart
        | CheckoutError::InvalidQuantity
        | CheckoutError::CurrencyMismatch { .. }
        | CheckoutError::InvalidAddress(_)
        | CheckoutError::MissingSelectedRate { .. } => StatusCode::BAD_REQUEST,
        CheckoutError::NoRates { .. }
        | CheckoutError::Provider(_)
        | CheckoutError::Payment(_) => StatusCode::BAD_GATEWAY,
        CheckoutError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server-side failures to Sentry
        if self.status().is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = json!({ "error": self.client_message() });
        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use inkwave_core::ProductId;

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(
            AppError::NotFound("order".to_owned()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Checkout(CheckoutError::UnknownProduct(ProductId::new("x"))).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn contract_violations_map_to_400() {
        assert_eq!(
            AppError::Checkout(CheckoutError::MissingSelectedRate {
                provider: "printful".to_owned()
            })
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Checkout(CheckoutError::EmptyCart).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn provider_failures_map_to_502() {
        assert_eq!(
            AppError::Checkout(CheckoutError::NoRates {
                provider: "gelato".to_owned()
            })
            .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::Provider(ProviderError::NotConfigured("printful".to_owned())).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn provider_failures_keep_the_provider_name() {
        let err = AppError::Checkout(CheckoutError::NoRates {
            provider: "printful".to_owned(),
        });
        assert!(err.client_message().contains("printful"));
    }

    #[test]
    fn internal_details_are_withheld() {
        let err = AppError::Internal("connection pool exhausted".to_owned());
        assert_eq!(err.client_message(), "Internal server error");
    }
}
