//! Inkwave Core - Shared domain types.
//!
//! This crate provides common types used across all Inkwave components:
//! - `storefront` - Marketplace API service (catalog, quote, checkout, webhooks)
//! - `cli` - Command-line tools for migrations, seeding, and draft cleanup
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, addresses, and
//!   the order lifecycle

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
