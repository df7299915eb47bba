//! Abandonment sweep command.
//!
//! Runs the same sweeper as `POST /cron/cleanup-drafts`, against the real
//! configured gateways. Useful for one-off reconciliation from a shell.

use std::sync::Arc;

use inkwave_storefront::config::StorefrontConfig;
use inkwave_storefront::db::PgOrderStore;
use inkwave_storefront::services::DraftSweeper;
use inkwave_storefront::state::build_gateways;

use super::connect;

/// Run one abandonment sweep.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the database is
/// unreachable, or the sweep's store operations fail. Per-provider
/// cancellation failures are reported, not fatal.
pub async fn run(max_age_hours: i64) -> Result<(), Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;
    let pool = connect().await?;

    let orders = Arc::new(PgOrderStore::new(pool));
    let gateways = Arc::new(build_gateways(&config)?);
    let sweeper = DraftSweeper::new(orders, gateways);

    let report = sweeper.sweep(max_age_hours).await?;

    tracing::info!(
        total = report.total_processed,
        cancelled = report.cancelled,
        partially_cancelled = report.partially_cancelled,
        failed = report.failed,
        "sweep finished"
    );
    for error in &report.errors {
        tracing::warn!(
            order_id = %error.order_id,
            provider = error.provider.as_str(),
            message = error.message.as_str(),
            "cancellation failure"
        );
    }

    Ok(())
}
