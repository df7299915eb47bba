//! Abandonment-sweeper scenarios: isolated per-provider cancellation and
//! outcome-accurate order statuses.

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};

use inkwave_core::{OrderStatus, UserId};
use inkwave_integration_tests::{Harness, MockGateway, address, usd};
use inkwave_storefront::models::order::Order;
use inkwave_storefront::store::OrderStore as _;

/// Insert a draft-stage order with the given provider draft map, backdated
/// past the default threshold.
async fn seed_stale_draft(harness: &Harness, drafts: &[(&str, &str)]) -> Order {
    let mut order = Order::new(UserId::new("guest"), usd("20.00"), address(), Vec::new());
    order.status = OrderStatus::DraftCreated;
    order.created_at = Utc::now() - Duration::hours(30);
    for (provider, draft_id) in drafts {
        order
            .draft_order_ids
            .insert((*provider).to_owned(), (*draft_id).to_owned());
    }
    harness.orders().insert(&order).await.unwrap();
    order
}

#[tokio::test]
async fn stale_draft_is_cancelled_at_its_provider() {
    let harness = Harness::new().with_gateway(MockGateway::new("printful"));
    let order = seed_stale_draft(&harness, &[("printful", "d1")]).await;

    let report = harness.sweeper().sweep(24).await.unwrap();

    assert_eq!(report.total_processed, 1);
    assert_eq!(report.cancelled, 1);
    assert_eq!(report.partially_cancelled, 0);
    assert_eq!(report.failed, 0);
    assert!(report.errors.is_empty());

    assert_eq!(harness.gateway("printful").cancelled_ids(), vec!["d1"]);
    let order = harness.orders().get(order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn failed_cancellation_leaves_the_order_for_retry() {
    let harness = Harness::new().with_gateway(MockGateway::new("printful").failing_cancel());
    let order = seed_stale_draft(&harness, &[("printful", "d1")]).await;

    let report = harness.sweeper().sweep(24).await.unwrap();

    assert_eq!(report.cancelled, 0);
    assert_eq!(report.partially_cancelled, 0);
    assert_eq!(report.failed, 1);
    assert_eq!(report.errors.len(), 1);
    let error = report.errors.first().unwrap();
    assert_eq!(error.order_id, order.id);
    assert_eq!(error.provider, "printful");

    // Status unchanged so the next sweep retries.
    let order = harness.orders().get(order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::DraftCreated);
}

#[tokio::test]
async fn partial_cancellation_is_recorded_as_such() {
    let harness = Harness::new()
        .with_gateway(MockGateway::new("printful").failing_cancel())
        .with_gateway(MockGateway::new("gelato"));
    let order = seed_stale_draft(&harness, &[("printful", "d1"), ("gelato", "d2")]).await;

    let report = harness.sweeper().sweep(24).await.unwrap();

    assert_eq!(report.cancelled, 0);
    assert_eq!(report.partially_cancelled, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors.first().unwrap().provider, "printful");

    // One provider's failure did not block the other's cancellation.
    assert_eq!(harness.gateway("gelato").cancelled_ids(), vec!["d2"]);
    let order = harness.orders().get(order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::PartiallyCancelled);
}

#[tokio::test]
async fn draftless_orders_are_trivially_cancelled() {
    let harness = Harness::new();
    let order = seed_stale_draft(&harness, &[]).await;

    let report = harness.sweeper().sweep(24).await.unwrap();

    assert_eq!(report.cancelled, 1);
    let order = harness.orders().get(order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn young_drafts_are_left_alone() {
    let harness = Harness::new().with_gateway(MockGateway::new("printful"));

    let mut order = Order::new(UserId::new("guest"), usd("20.00"), address(), Vec::new());
    order.status = OrderStatus::DraftCreated;
    order
        .draft_order_ids
        .insert("printful".to_owned(), "d1".to_owned());
    harness.orders().insert(&order).await.unwrap();

    let report = harness.sweeper().sweep(24).await.unwrap();

    assert_eq!(report.total_processed, 0);
    assert!(harness.gateway("printful").cancelled_ids().is_empty());
    let order = harness.orders().get(order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::DraftCreated);
}

#[tokio::test]
async fn non_draft_orders_are_ignored() {
    let harness = Harness::new().with_gateway(MockGateway::new("printful"));

    let mut order = Order::new(UserId::new("guest"), usd("20.00"), address(), Vec::new());
    order.status = OrderStatus::Paid;
    order.created_at = Utc::now() - Duration::hours(48);
    order
        .draft_order_ids
        .insert("printful".to_owned(), "d1".to_owned());
    harness.orders().insert(&order).await.unwrap();

    let report = harness.sweeper().sweep(24).await.unwrap();

    assert_eq!(report.total_processed, 0);
    assert!(harness.gateway("printful").cancelled_ids().is_empty());
}

#[tokio::test]
async fn unconfigured_provider_counts_as_a_failed_cancellation() {
    // A draft recorded for a provider whose gateway has since been removed
    // from configuration cannot be cancelled; the order must stay put.
    let harness = Harness::new();
    let order = seed_stale_draft(&harness, &[("printful", "d1")]).await;

    let report = harness.sweeper().sweep(24).await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.errors.len(), 1);
    let order = harness.orders().get(order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::DraftCreated);
}
