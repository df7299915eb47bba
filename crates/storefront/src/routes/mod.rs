//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check (in main.rs)
//! GET  /health/ready           - Readiness check (in main.rs)
//!
//! # Catalog
//! GET  /products               - Active products (JSON)
//! GET  /products/{id}          - Product detail (JSON)
//!
//! # Checkout
//! POST /quote                  - Aggregate shipping quote for a cart
//! POST /checkout               - Confirm checkout, returns payment redirect
//!
//! # Operations
//! POST /cron/cleanup-drafts    - Run one abandonment sweep (bearer guarded)
//!
//! # Webhooks
//! POST /webhooks/stripe        - Payment lifecycle events
//! POST /webhooks/printful      - Printful fulfillment events
//! POST /webhooks/gelato        - Gelato fulfillment events
//! ```

pub mod checkout;
pub mod cron;
pub mod products;
pub mod webhooks;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the storefront API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
        .route("/quote", post(checkout::quote))
        .route("/checkout", post(checkout::create))
        .route("/cron/cleanup-drafts", post(cron::cleanup_drafts))
        .route("/webhooks/stripe", post(webhooks::stripe))
        .route("/webhooks/printful", post(webhooks::printful))
        .route("/webhooks/gelato", post(webhooks::gelato))
}
