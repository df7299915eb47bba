//! Quote and checkout route handlers.
//!
//! These are thin JSON adapters over [`crate::services::CheckoutService`];
//! the orchestration logic lives there.

use std::collections::BTreeMap;

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use inkwave_core::{OrderId, RateId, ShippingAddress, UserId};

use crate::error::Result;
use crate::models::order::DeliveryEstimate;
use crate::models::quote::{CartItem, Quote};
use crate::services::CheckoutRequest;
use crate::state::AppState;

/// `POST /quote` request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteBody {
    pub items: Vec<CartItem>,
    pub shipping_address: ShippingAddress,
}

/// `POST /checkout` request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutBody {
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub items: Vec<CartItem>,
    pub shipping_address: ShippingAddress,
    /// Provider name -> chosen rate ID from the accepted quote.
    #[serde(default)]
    pub selected_rates: BTreeMap<String, RateId>,
    /// Aggregate shipping cost from the accepted quote, in major units.
    pub shipping_cost: Decimal,
    /// Aggregated delivery window from the accepted quote.
    #[serde(default)]
    pub delivery_estimate: Option<DeliveryEstimate>,
    pub success_url: String,
    pub cancel_url: String,
}

/// `POST /checkout` response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub order_id: OrderId,
    pub checkout_session_id: String,
    pub checkout_url: String,
    pub draft_order_ids: BTreeMap<String, String>,
}

/// Compute an aggregate shipping quote for a cart.
#[instrument(skip(state, body), fields(lines = body.items.len()))]
pub async fn quote(
    State(state): State<AppState>,
    Json(body): Json<QuoteBody>,
) -> Result<Json<Quote>> {
    let quote = state
        .checkout()
        .quote(&body.items, &body.shipping_address)
        .await?;
    Ok(Json(quote))
}

/// Confirm a checkout and return the payment redirect.
#[instrument(skip(state, body), fields(lines = body.items.len()))]
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CheckoutBody>,
) -> Result<Json<CheckoutResponse>> {
    let request = CheckoutRequest {
        user_id: body.user_id,
        items: body.items,
        shipping_address: body.shipping_address,
        selected_rates: body.selected_rates,
        shipping_cost: body.shipping_cost,
        delivery_estimate: body.delivery_estimate,
        success_url: body.success_url,
        cancel_url: body.cancel_url,
    };

    let outcome = state.checkout().create_checkout(&request).await?;

    Ok(Json(CheckoutResponse {
        order_id: outcome.order_id,
        checkout_session_id: outcome.checkout_session_id,
        checkout_url: outcome.checkout_url,
        draft_order_ids: outcome.draft_order_ids,
    }))
}
