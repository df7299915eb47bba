//! Database operations for storefront `PostgreSQL`.
//!
//! # Tables
//!
//! - `products` - Catalog products with variants and fulfillment bindings
//!   as JSONB payloads
//! - `orders` - Orders with frozen line items, the address snapshot, and
//!   the provider reference maps needed for reconciliation
//!
//! Queries use sqlx's runtime API; payload columns are JSONB and decode
//! through the same serde types the rest of the crate uses.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p inkwave-cli -- migrate
//! ```

mod orders;
mod products;

pub use orders::PgOrderStore;
pub use products::PgCatalog;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
