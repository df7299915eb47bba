//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use inkwave_core::ProductId;

use crate::error::{AppError, Result};
use crate::models::product::Product;
use crate::state::AppState;
use crate::store::Catalog as _;

/// List active products.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = state.catalog().list_active().await?;
    Ok(Json(products))
}

/// Fetch one product by ID.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let id = ProductId::new(id);
    let product = state
        .catalog()
        .find(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    Ok(Json(product))
}
