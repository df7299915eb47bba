//! Provider webhook handlers.
//!
//! Each handler accepts the raw body, optionally enforces a shared-secret
//! header (full signature verification is delegated to the deployment
//! edge), and dispatches to order-state updates. Provider delivery is
//! unordered and at-least-once, so every status change is guarded by
//! [`OrderStatus::can_transition`] and stale events are dropped.
//!
//! Unknown event types and unknown order references return 200 so the
//! provider stops retrying; malformed payloads return 400.

use axum::{Json, extract::State, http::HeaderMap};
use chrono::Utc;
use futures::future;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use inkwave_core::{OrderId, OrderStatus};

use crate::error::{AppError, Result};
use crate::models::order::{Order, TrackingInfo};
use crate::providers::FulfillmentGateway as _;
use crate::state::AppState;
use crate::store::OrderStore as _;

/// Shared-secret header checked when a provider has one configured.
const SECRET_HEADER: &str = "x-webhook-secret";

// =============================================================================
// Stripe
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripeEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: StripeObject,
}

#[derive(Debug, Deserialize)]
struct StripeObject {
    id: String,
    #[serde(default)]
    metadata: std::collections::BTreeMap<String, String>,
}

/// Handle Stripe payment lifecycle events.
#[instrument(skip_all)]
pub async fn stripe(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<serde_json::Value>> {
    verify_shared_secret(
        state.config().stripe.webhook_secret.as_ref(),
        &headers,
        "stripe",
    )?;

    let event: StripeEvent = serde_json::from_str(&body)
        .map_err(|e| AppError::BadRequest(format!("malformed stripe event: {e}")))?;

    match event.event_type.as_str() {
        "checkout.session.completed" => {
            session_completed(&state, &event.data.object).await?;
        }
        "charge.refunded" => {
            refund(&state, &event.data.object).await?;
        }
        other => debug!(event_type = other, "ignoring stripe event"),
    }

    Ok(Json(json!({ "received": true })))
}

/// The customer paid. Mark the order paid, then confirm every recorded
/// draft for production. The session metadata carries the draft map written
/// at checkout time; the persisted order is the fallback.
async fn session_completed(state: &AppState, object: &StripeObject) -> Result<()> {
    let order = match order_for_session(state, object).await? {
        Some(order) => order,
        None => {
            warn!(session_id = object.id.as_str(), "no order for session");
            return Ok(());
        }
    };

    if !order.status.can_transition(OrderStatus::Paid) {
        warn!(
            order_id = %order.id,
            status = %order.status,
            "dropping stale payment event"
        );
        return Ok(());
    }
    state.orders().set_status(order.id, OrderStatus::Paid).await?;

    let draft_order_ids = object
        .metadata
        .get("draft_order_ids")
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or_else(|| order.draft_order_ids.clone());

    let confirmations = future::join_all(draft_order_ids.iter().map(
        |(provider, draft_id): (&String, &String)| async move {
            let result = match state.gateways().get(provider) {
                Ok(gateway) => gateway.confirm_order(draft_id).await.map(|_| ()),
                Err(e) => Err(e),
            };
            (provider.clone(), result)
        },
    ))
    .await;

    let mut all_confirmed = true;
    for (provider, result) in confirmations {
        if let Err(e) = result {
            all_confirmed = false;
            warn!(
                order_id = %order.id,
                provider = provider.as_str(),
                error = %e,
                "draft confirmation failed"
            );
        }
    }

    let next = if all_confirmed {
        OrderStatus::Processing
    } else {
        OrderStatus::PaidPendingFulfillment
    };
    state.orders().set_status(order.id, next).await?;

    info!(order_id = %order.id, status = %next, "payment reconciled");
    Ok(())
}

async fn refund(state: &AppState, object: &StripeObject) -> Result<()> {
    let Some(order) = order_for_session(state, object).await? else {
        warn!(object_id = object.id.as_str(), "no order for refund event");
        return Ok(());
    };

    transition_guarded(state, &order, OrderStatus::Refunded).await?;
    Ok(())
}

async fn order_for_session(state: &AppState, object: &StripeObject) -> Result<Option<Order>> {
    if let Some(order) = match object.metadata.get("order_id") {
        Some(raw) => lookup_order(state, raw).await?,
        None => None,
    } {
        return Ok(Some(order));
    }

    Ok(state.orders().find_by_checkout_session(&object.id).await?)
}

// =============================================================================
// Printful
// =============================================================================

#[derive(Debug, Deserialize)]
struct PrintfulEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: PrintfulEventData,
}

#[derive(Debug, Deserialize)]
struct PrintfulEventData {
    order: Option<PrintfulOrderRef>,
    shipment: Option<PrintfulShipment>,
}

#[derive(Debug, Deserialize)]
struct PrintfulOrderRef {
    external_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PrintfulShipment {
    carrier: Option<String>,
    tracking_number: String,
    tracking_url: Option<String>,
}

/// Handle Printful fulfillment events.
#[instrument(skip_all)]
pub async fn printful(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<serde_json::Value>> {
    verify_shared_secret(
        state
            .config()
            .printful
            .as_ref()
            .and_then(|c| c.webhook_secret.as_ref()),
        &headers,
        "printful",
    )?;

    let event: PrintfulEvent = serde_json::from_str(&body)
        .map_err(|e| AppError::BadRequest(format!("malformed printful event: {e}")))?;

    let order = match event
        .data
        .order
        .as_ref()
        .and_then(|o| o.external_id.as_deref())
    {
        Some(reference) => lookup_order(&state, reference).await?,
        None => None,
    };
    let Some(order) = order else {
        debug!(
            event_type = event.event_type.as_str(),
            "printful event without a known order"
        );
        return Ok(Json(json!({ "received": true })));
    };

    match event.event_type.as_str() {
        "package_shipped" => {
            if let Some(shipment) = event.data.shipment {
                state
                    .orders()
                    .add_tracking(
                        order.id,
                        TrackingInfo {
                            provider: "printful".to_owned(),
                            carrier: shipment.carrier,
                            tracking_number: shipment.tracking_number,
                            tracking_url: shipment.tracking_url,
                            added_at: Utc::now(),
                        },
                    )
                    .await?;
            }
            transition_guarded(&state, &order, OrderStatus::Shipped).await?;
        }
        "order_canceled" => {
            transition_guarded(&state, &order, OrderStatus::Cancelled).await?;
        }
        other => debug!(event_type = other, "ignoring printful event"),
    }

    Ok(Json(json!({ "received": true })))
}

// =============================================================================
// Gelato
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GelatoEvent {
    event: String,
    order_reference_id: Option<String>,
    fulfillment_status: Option<String>,
    #[serde(default)]
    tracking_codes: Vec<GelatoTrackingCode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GelatoTrackingCode {
    code: String,
    url: Option<String>,
    shipment_method_name: Option<String>,
}

/// Handle Gelato fulfillment events.
#[instrument(skip_all)]
pub async fn gelato(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<serde_json::Value>> {
    verify_shared_secret(
        state
            .config()
            .gelato
            .as_ref()
            .and_then(|c| c.webhook_secret.as_ref()),
        &headers,
        "gelato",
    )?;

    let event: GelatoEvent = serde_json::from_str(&body)
        .map_err(|e| AppError::BadRequest(format!("malformed gelato event: {e}")))?;

    if event.event != "order_status_updated" {
        debug!(event = event.event.as_str(), "ignoring gelato event");
        return Ok(Json(json!({ "received": true })));
    }

    let order = match event.order_reference_id.as_deref() {
        Some(reference) => lookup_order(&state, reference).await?,
        None => None,
    };
    let Some(order) = order else {
        debug!("gelato event without a known order");
        return Ok(Json(json!({ "received": true })));
    };

    match event.fulfillment_status.as_deref() {
        Some("shipped") => {
            for code in event.tracking_codes {
                state
                    .orders()
                    .add_tracking(
                        order.id,
                        TrackingInfo {
                            provider: "gelato".to_owned(),
                            carrier: code.shipment_method_name,
                            tracking_number: code.code,
                            tracking_url: code.url,
                            added_at: Utc::now(),
                        },
                    )
                    .await?;
            }
            transition_guarded(&state, &order, OrderStatus::Shipped).await?;
        }
        Some("delivered") => {
            transition_guarded(&state, &order, OrderStatus::Delivered).await?;
        }
        Some("canceled") => {
            transition_guarded(&state, &order, OrderStatus::Cancelled).await?;
        }
        other => debug!(status = ?other, "ignoring gelato fulfillment status"),
    }

    Ok(Json(json!({ "received": true })))
}

// =============================================================================
// Shared helpers
// =============================================================================

fn verify_shared_secret(
    expected: Option<&SecretString>,
    headers: &HeaderMap,
    provider: &str,
) -> Result<()> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let presented = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
    if presented == Some(expected.expose_secret()) {
        Ok(())
    } else {
        Err(AppError::Unauthorized(format!(
            "invalid {provider} webhook secret"
        )))
    }
}

async fn lookup_order(state: &AppState, reference: &str) -> Result<Option<Order>> {
    let Ok(id) = reference.parse::<OrderId>() else {
        warn!(reference, "webhook reference is not an order id");
        return Ok(None);
    };
    Ok(state.orders().get(id).await?)
}

/// Apply a status transition if the lifecycle allows it; drop it otherwise.
async fn transition_guarded(
    state: &AppState,
    order: &Order,
    to: OrderStatus,
) -> Result<bool> {
    if order.status.can_transition(to) {
        state.orders().set_status(order.id, to).await?;
        info!(order_id = %order.id, from = %order.status, to = %to, "order status updated");
        Ok(true)
    } else {
        warn!(
            order_id = %order.id,
            from = %order.status,
            to = %to,
            "dropping out-of-order webhook transition"
        );
        Ok(false)
    }
}
