//! Domain models for the storefront.
//!
//! - [`product`] - Catalog products, variants, and their fulfillment bindings
//! - [`order`] - Persisted orders and their frozen line items
//! - [`quote`] - Ephemeral shipping quotes (never persisted)

pub mod order;
pub mod product;
pub mod quote;

pub use order::{DeliveryEstimate, Order, OrderItem, TrackingInfo};
pub use product::{DesignFile, FulfillmentConfig, Product, Variant};
pub use quote::{CartItem, ProviderQuote, Quote, SelectedRate};
