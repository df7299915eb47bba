//! Postgres-backed order store.
//!
//! Scalar columns hold what queries filter on (status, session ID); the
//! address snapshot, frozen line items, tracking list, and provider
//! reference maps live in JSONB payload columns.
//!
//! There is no optimistic-concurrency column: each checkout request is the
//! only logical writer for its order.

use std::collections::BTreeMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row, postgres::PgRow};

use inkwave_core::{CurrencyCode, Money, OrderId, OrderStatus, UserId};

use crate::models::order::{Order, TrackingInfo};
use crate::store::{OrderStore, StoreError};

/// Postgres implementation of [`OrderStore`].
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Create an order store over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn ensure_updated(result: &sqlx::postgres::PgQueryResult, id: OrderId) -> Result<(), StoreError> {
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("order {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO orders
                (id, user_id, status, total, currency, checkout_session_id,
                 checkout_provider, draft_order_ids, fulfillment_reference_id,
                 shipping_address, tracking, delivery_estimate, items,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ",
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_str())
        .bind(order.status.to_string())
        .bind(order.total.amount)
        .bind(order.total.currency.code())
        .bind(&order.checkout_session_id)
        .bind(&order.checkout_provider)
        .bind(to_json(&order.draft_order_ids, "draft_order_ids")?)
        .bind(&order.fulfillment_reference_id)
        .bind(to_json(&order.shipping_address, "shipping_address")?)
        .bind(to_json(&order.tracking, "tracking")?)
        .bind(
            order
                .delivery_estimate
                .as_ref()
                .map(|e| to_json(e, "delivery_estimate"))
                .transpose()?,
        )
        .bind(to_json(&order.items, "items")?)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(&select_sql("WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(order_from_row).transpose()
    }

    async fn find_by_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(&select_sql("WHERE checkout_session_id = $1"))
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(order_from_row).transpose()
    }

    async fn set_checkout_session(
        &self,
        id: OrderId,
        session_id: &str,
        provider: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET checkout_session_id = $2, checkout_provider = $3, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .bind(session_id)
        .bind(provider)
        .execute(&self.pool)
        .await?;

        Self::ensure_updated(&result, id)
    }

    async fn set_draft_order_ids(
        &self,
        id: OrderId,
        draft_order_ids: &BTreeMap<String, String>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET draft_order_ids = $2, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .bind(to_json(draft_order_ids, "draft_order_ids")?)
        .execute(&self.pool)
        .await?;

        Self::ensure_updated(&result, id)
    }

    async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET status = $2, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .bind(status.to_string())
        .execute(&self.pool)
        .await?;

        Self::ensure_updated(&result, id)
    }

    async fn add_tracking(&self, id: OrderId, tracking: TrackingInfo) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET tracking = tracking || $2, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .bind(to_json(&[tracking], "tracking")?)
        .execute(&self.pool)
        .await?;

        Self::ensure_updated(&result, id)
    }

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query(&select_sql("WHERE status = $1 ORDER BY created_at"))
            .bind(status.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(order_from_row).collect()
    }
}

fn select_sql(clause: &str) -> String {
    format!(
        r"
        SELECT id, user_id, status, total, currency, checkout_session_id,
               checkout_provider, draft_order_ids, fulfillment_reference_id,
               shipping_address, tracking, delivery_estimate, items,
               created_at, updated_at
        FROM orders
        {clause}
        "
    )
}

fn to_json<T: serde::Serialize>(value: &T, field: &str) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(value)
        .map_err(|e| StoreError::Corrupt(format!("unserializable {field}: {e}")))
}

fn from_json<T: serde::de::DeserializeOwned>(
    value: serde_json::Value,
    field: &str,
) -> Result<T, StoreError> {
    serde_json::from_value(value)
        .map_err(|e| StoreError::Corrupt(format!("invalid {field} payload: {e}")))
}

fn order_from_row(row: &PgRow) -> Result<Order, StoreError> {
    let status: String = row.try_get("status")?;
    let status: OrderStatus = status.parse().map_err(|e: String| StoreError::Corrupt(e))?;

    let currency: String = row.try_get("currency")?;
    let currency: CurrencyCode = currency
        .parse()
        .map_err(|e: String| StoreError::Corrupt(e))?;
    let total: Decimal = row.try_get("total")?;

    let delivery_estimate = row
        .try_get::<Option<serde_json::Value>, _>("delivery_estimate")?
        .map(|v| from_json(v, "delivery_estimate"))
        .transpose()?;

    Ok(Order {
        id: OrderId::from_uuid(row.try_get("id")?),
        user_id: UserId::new(row.try_get::<String, _>("user_id")?),
        status,
        total: Money::new(total, currency),
        checkout_session_id: row.try_get("checkout_session_id")?,
        checkout_provider: row.try_get("checkout_provider")?,
        draft_order_ids: from_json(row.try_get("draft_order_ids")?, "draft_order_ids")?,
        fulfillment_reference_id: row.try_get("fulfillment_reference_id")?,
        shipping_address: from_json(row.try_get("shipping_address")?, "shipping_address")?,
        tracking: from_json(row.try_get("tracking")?, "tracking")?,
        delivery_estimate,
        items: from_json(row.try_get("items")?, "items")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
