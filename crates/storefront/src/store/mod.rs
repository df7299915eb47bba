//! Narrow record-store interfaces for the catalog and orders.
//!
//! The orchestrator only ever sees these traits. Production wires in the
//! Postgres implementations from [`crate::db`]; tests and local development
//! use the in-memory implementations from [`memory`].

pub mod memory;

pub use memory::{MemoryCatalog, MemoryOrderStore};

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use inkwave_core::{OrderId, OrderStatus, ProductId};

use crate::models::order::{Order, TrackingInfo};
use crate::models::product::Product;

/// Errors from a store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record being updated does not exist.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A persisted payload could not be (de)serialized.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Read access to the product catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Find a product by ID.
    async fn find(&self, id: &ProductId) -> Result<Option<Product>, StoreError>;

    /// List all active products.
    async fn list_active(&self) -> Result<Vec<Product>, StoreError>;

    /// Insert or replace a product (seeding, catalog sync).
    async fn upsert(&self, product: &Product) -> Result<(), StoreError>;
}

/// Persistence for orders and the provider references needed to reconcile
/// them later (webhooks, the abandonment sweeper).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new order.
    async fn insert(&self, order: &Order) -> Result<(), StoreError>;

    /// Fetch an order by ID.
    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Fetch the order that owns a payment checkout session.
    async fn find_by_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<Option<Order>, StoreError>;

    /// Record the payment session reference on an order.
    async fn set_checkout_session(
        &self,
        id: OrderId,
        session_id: &str,
        provider: &str,
    ) -> Result<(), StoreError>;

    /// Replace the provider -> draft-order-ID map.
    ///
    /// Called once per successful draft creation so partial progress is
    /// visible if a later step fails.
    async fn set_draft_order_ids(
        &self,
        id: OrderId,
        draft_order_ids: &BTreeMap<String, String>,
    ) -> Result<(), StoreError>;

    /// Set the order status.
    async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<(), StoreError>;

    /// Append a tracking entry.
    async fn add_tracking(&self, id: OrderId, tracking: TrackingInfo) -> Result<(), StoreError>;

    /// All orders currently in `status`.
    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, StoreError>;
}
