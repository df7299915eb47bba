//! In-memory store implementations for tests and local development.
//!
//! These hold everything behind a `tokio` `RwLock` and provide the same
//! interface as the Postgres implementations.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use inkwave_core::{OrderId, OrderStatus, ProductId};

use super::{Catalog, OrderStore, StoreError};
use crate::models::order::{Order, TrackingInfo};
use crate::models::product::Product;

/// In-memory product catalog.
#[derive(Clone, Default)]
pub struct MemoryCatalog {
    products: Arc<RwLock<BTreeMap<ProductId, Product>>>,
}

impl MemoryCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog pre-populated with `products`.
    #[must_use]
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let map = products.into_iter().map(|p| (p.id.clone(), p)).collect();
        Self {
            products: Arc::new(RwLock::new(map)),
        }
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn find(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn list_active(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self
            .products
            .read()
            .await
            .values()
            .filter(|p| p.active)
            .cloned()
            .collect())
    }

    async fn upsert(&self, product: &Product) -> Result<(), StoreError> {
        self.products
            .write()
            .await
            .insert(product.id.clone(), product.clone());
        Ok(())
    }
}

/// In-memory order store.
#[derive(Clone, Default)]
pub struct MemoryOrderStore {
    orders: Arc<RwLock<BTreeMap<OrderId, Order>>>,
}

impl MemoryOrderStore {
    /// Create an empty order store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }

    async fn update<F>(&self, id: OrderId, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Order),
    {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("order {id}")))?;
        apply(order);
        order.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        self.orders
            .write()
            .await
            .insert(order.id, order.clone());
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn find_by_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<Option<Order>, StoreError> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .find(|o| o.checkout_session_id.as_deref() == Some(session_id))
            .cloned())
    }

    async fn set_checkout_session(
        &self,
        id: OrderId,
        session_id: &str,
        provider: &str,
    ) -> Result<(), StoreError> {
        self.update(id, |order| {
            order.checkout_session_id = Some(session_id.to_owned());
            order.checkout_provider = Some(provider.to_owned());
        })
        .await
    }

    async fn set_draft_order_ids(
        &self,
        id: OrderId,
        draft_order_ids: &BTreeMap<String, String>,
    ) -> Result<(), StoreError> {
        self.update(id, |order| {
            order.draft_order_ids = draft_order_ids.clone();
        })
        .await
    }

    async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<(), StoreError> {
        self.update(id, |order| order.status = status).await
    }

    async fn add_tracking(&self, id: OrderId, tracking: TrackingInfo) -> Result<(), StoreError> {
        self.update(id, |order| order.tracking.push(tracking)).await
    }

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, StoreError> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.status == status)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use inkwave_core::{CurrencyCode, Email, Money, ShippingAddress, UserId};
    use rust_decimal::Decimal;

    fn order() -> Order {
        Order::new(
            UserId::new("guest"),
            Money::new(Decimal::from(20), CurrencyCode::USD),
            ShippingAddress {
                first_name: "Ada".to_owned(),
                last_name: "Lovelace".to_owned(),
                address1: "1 Analytical Way".to_owned(),
                address2: None,
                city: "London".to_owned(),
                state: "LND".to_owned(),
                postal_code: "EC1A 1BB".to_owned(),
                country: "GB".to_owned(),
                email: Email::parse("ada@example.com").unwrap(),
                phone: None,
            },
            Vec::new(),
        )
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let store = MemoryOrderStore::new();
        let order = order();
        store.insert(&order).await.unwrap();
        let fetched = store.get(order.id).await.unwrap().unwrap();
        assert_eq!(fetched, order);
    }

    #[tokio::test]
    async fn updates_to_missing_orders_fail() {
        let store = MemoryOrderStore::new();
        let err = store
            .set_status(OrderId::generate(), OrderStatus::Paid)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn find_by_checkout_session_matches() {
        let store = MemoryOrderStore::new();
        let order = order();
        store.insert(&order).await.unwrap();
        store
            .set_checkout_session(order.id, "cs_123", "stripe")
            .await
            .unwrap();

        let found = store
            .find_by_checkout_session("cs_123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, order.id);
        assert_eq!(found.checkout_provider.as_deref(), Some("stripe"));
        assert!(store.find_by_checkout_session("cs_other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_by_status_filters() {
        let store = MemoryOrderStore::new();
        let a = order();
        let b = order();
        store.insert(&a).await.unwrap();
        store.insert(&b).await.unwrap();
        store
            .set_status(b.id, OrderStatus::DraftCreated)
            .await
            .unwrap();

        let drafts = store
            .list_by_status(OrderStatus::DraftCreated)
            .await
            .unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts.first().unwrap().id, b.id);
    }
}
