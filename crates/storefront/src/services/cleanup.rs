//! The abandonment sweeper.
//!
//! Orders stuck in `draft_created` past a time threshold have remote draft
//! orders (and an unpaid payment session) that will never be confirmed.
//! The sweeper cancels those drafts using the same per-provider
//! cancellation primitive as the orchestrator and records the outcome on
//! the order. It owns no timer - an external cron endpoint or the CLI
//! triggers each pass.
//!
//! Unlike quote/checkout, the sweep is partial-failure-tolerant: each
//! provider cancellation is isolated, and the order's final status
//! reflects exactly which succeeded.

use std::sync::Arc;

use chrono::{Duration, Utc};
use futures::future;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use inkwave_core::{OrderId, OrderStatus};

use crate::providers::{FulfillmentGateway as _, GatewayRegistry};
use crate::store::{OrderStore, StoreError};

/// Default age threshold for a sweep, in hours.
pub const DEFAULT_MAX_AGE_HOURS: i64 = 24;

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    /// Orders past the threshold that were examined.
    pub total_processed: u32,
    /// Orders whose every draft was cancelled (or that had none).
    pub cancelled: u32,
    /// Orders where only some cancellations succeeded.
    pub partially_cancelled: u32,
    /// Orders where every cancellation failed; status left unchanged so the
    /// next sweep retries them.
    pub failed: u32,
    pub errors: Vec<SweepError>,
}

/// One failed provider cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepError {
    pub order_id: OrderId,
    pub provider: String,
    pub message: String,
}

/// Cancels remote drafts for abandoned draft-stage orders.
#[derive(Clone)]
pub struct DraftSweeper {
    orders: Arc<dyn OrderStore>,
    gateways: Arc<GatewayRegistry>,
}

impl DraftSweeper {
    /// Wire up the sweeper.
    #[must_use]
    pub fn new(orders: Arc<dyn OrderStore>, gateways: Arc<GatewayRegistry>) -> Self {
        Self { orders, gateways }
    }

    /// Run one sweep over all `draft_created` orders older than
    /// `max_age_hours`.
    ///
    /// Age is measured from the order's creation timestamp and compared
    /// in-process after fetching all draft-status orders.
    ///
    /// # Errors
    ///
    /// Only store failures abort the sweep; provider cancellation failures
    /// are captured per provider in the report.
    #[instrument(skip(self))]
    pub async fn sweep(&self, max_age_hours: i64) -> Result<SweepReport, StoreError> {
        let cutoff = Utc::now() - Duration::hours(max_age_hours);
        let drafts = self.orders.list_by_status(OrderStatus::DraftCreated).await?;

        let mut report = SweepReport::default();

        for order in drafts.into_iter().filter(|o| o.created_at < cutoff) {
            report.total_processed += 1;

            if order.draft_order_ids.is_empty() {
                // Nothing was created remotely; the order just goes away.
                self.orders
                    .set_status(order.id, OrderStatus::Cancelled)
                    .await?;
                report.cancelled += 1;
                continue;
            }

            // Cancel at every provider independently; one failure must not
            // stop the others.
            let attempts = future::join_all(order.draft_order_ids.iter().map(
                |(provider, draft_id)| async move {
                    let result = match self.gateways.get(provider) {
                        Ok(gateway) => gateway.cancel_order(draft_id).await.map(|_| ()),
                        Err(e) => Err(e),
                    };
                    (provider.clone(), result)
                },
            ))
            .await;

            let total = attempts.len();
            let mut succeeded = 0usize;
            for (provider, result) in attempts {
                match result {
                    Ok(()) => succeeded += 1,
                    Err(e) => {
                        warn!(
                            order_id = %order.id,
                            provider = provider.as_str(),
                            error = %e,
                            "draft cancellation failed"
                        );
                        report.errors.push(SweepError {
                            order_id: order.id,
                            provider,
                            message: e.to_string(),
                        });
                    }
                }
            }

            if succeeded == total {
                self.orders
                    .set_status(order.id, OrderStatus::Cancelled)
                    .await?;
                report.cancelled += 1;
            } else if succeeded > 0 {
                self.orders
                    .set_status(order.id, OrderStatus::PartiallyCancelled)
                    .await?;
                report.partially_cancelled += 1;
            } else {
                // Leave the status as draft_created; the next sweep retries.
                report.failed += 1;
            }
        }

        info!(
            total = report.total_processed,
            cancelled = report.cancelled,
            partially_cancelled = report.partially_cancelled,
            failed = report.failed,
            "sweep complete"
        );

        Ok(report)
    }
}
