//! Cron-triggered operational endpoints.
//!
//! The sweeper owns no timer; an external scheduler (e.g. a daily cron
//! hitting this endpoint) drives each pass. When `CRON_AUTH_TOKEN` is
//! configured the endpoint requires it as a bearer token.

use axum::{Json, extract::State, http::HeaderMap};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::services::cleanup::{DEFAULT_MAX_AGE_HOURS, SweepReport};
use crate::state::AppState;

/// `POST /cron/cleanup-drafts` request body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupBody {
    /// Age threshold in hours; defaults to 24.
    pub max_age_hours: Option<i64>,
}

/// Run one abandonment sweep.
#[instrument(skip(state, headers, body))]
pub async fn cleanup_drafts(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<CleanupBody>>,
) -> Result<Json<SweepReport>> {
    authorize(&state, &headers)?;

    let max_age_hours = body
        .and_then(|Json(b)| b.max_age_hours)
        .unwrap_or(DEFAULT_MAX_AGE_HOURS);

    let report = state
        .sweeper()
        .sweep(max_age_hours)
        .await
        .map_err(AppError::Store)?;

    Ok(Json(report))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<()> {
    let Some(expected) = &state.config().cron_auth_token else {
        return Ok(());
    };

    let presented = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if presented == Some(expected.expose_secret()) {
        Ok(())
    } else {
        Err(AppError::Unauthorized("invalid cron token".to_owned()))
    }
}
