//! Postgres-backed product catalog with a moka read cache.
//!
//! Product reads sit on the hot path of every quote and checkout, so
//! found products are cached for 5 minutes. Writes invalidate the entry.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row, postgres::PgRow};

use inkwave_core::{CurrencyCode, Money, ProductId};

use crate::models::product::Product;
use crate::store::{Catalog, StoreError};

const CACHE_CAPACITY: u64 = 1000;
const CACHE_TTL: Duration = Duration::from_secs(300); // 5 minutes

/// Postgres implementation of [`Catalog`].
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
    cache: Cache<String, Product>,
}

impl PgCatalog {
    /// Create a catalog over a connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();
        Self { pool, cache }
    }
}

#[async_trait]
impl Catalog for PgCatalog {
    async fn find(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        if let Some(product) = self.cache.get(id.as_str()).await {
            return Ok(Some(product));
        }

        let row = sqlx::query(
            r"
            SELECT id, title, description, price, currency, fulfillment_provider,
                   image_url, variants, active
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let product = product_from_row(&row)?;
                self.cache
                    .insert(product.id.as_str().to_owned(), product.clone())
                    .await;
                Ok(Some(product))
            }
            None => Ok(None),
        }
    }

    async fn list_active(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, description, price, currency, fulfillment_provider,
                   image_url, variants, active
            FROM products
            WHERE active
            ORDER BY id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(product_from_row).collect()
    }

    async fn upsert(&self, product: &Product) -> Result<(), StoreError> {
        let variants = serde_json::to_value(&product.variants)
            .map_err(|e| StoreError::Corrupt(format!("unserializable variants: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO products
                (id, title, description, price, currency, fulfillment_provider,
                 image_url, variants, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                price = EXCLUDED.price,
                currency = EXCLUDED.currency,
                fulfillment_provider = EXCLUDED.fulfillment_provider,
                image_url = EXCLUDED.image_url,
                variants = EXCLUDED.variants,
                active = EXCLUDED.active,
                updated_at = now()
            ",
        )
        .bind(product.id.as_str())
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.price.amount)
        .bind(product.price.currency.code())
        .bind(&product.fulfillment_provider)
        .bind(&product.image_url)
        .bind(variants)
        .bind(product.active)
        .execute(&self.pool)
        .await?;

        self.cache.invalidate(product.id.as_str()).await;
        Ok(())
    }
}

fn product_from_row(row: &PgRow) -> Result<Product, StoreError> {
    let currency: String = row.try_get("currency")?;
    let currency: CurrencyCode = currency
        .parse()
        .map_err(|e: String| StoreError::Corrupt(e))?;
    let price: Decimal = row.try_get("price")?;

    let variants: serde_json::Value = row.try_get("variants")?;
    let variants = serde_json::from_value(variants)
        .map_err(|e| StoreError::Corrupt(format!("invalid variants payload: {e}")))?;

    Ok(Product {
        id: ProductId::new(row.try_get::<String, _>("id")?),
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        price: Money::new(price, currency),
        fulfillment_provider: row.try_get("fulfillment_provider")?,
        image_url: row.try_get("image_url")?,
        variants,
        active: row.try_get("active")?,
    })
}
