//! Catalog seeding command.
//!
//! Inserts a small demo catalog spanning every fulfillment route: a locally
//! fulfilled poster, a Printful tee with sized variants, and a Gelato mug.
//! Safe to re-run; products are upserted by ID.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use inkwave_core::{CurrencyCode, Money, ProductId, VariantId};
use inkwave_storefront::db::PgCatalog;
use inkwave_storefront::models::product::{
    DesignFile, FulfillmentConfig, MANUAL_PROVIDER, Product, Variant,
};
use inkwave_storefront::store::{Catalog, StoreError};

use super::{CommandError, connect};

/// Seed the catalog with demo products.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an upsert fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;
    let catalog = PgCatalog::new(pool);

    for product in demo_products() {
        match catalog.upsert(&product).await {
            Ok(()) => tracing::info!(product = product.id.as_str(), "seeded"),
            Err(StoreError::Database(e)) => return Err(CommandError::Database(e)),
            Err(e) => {
                tracing::error!(product = product.id.as_str(), error = %e, "seed failed");
            }
        }
    }

    tracing::info!("Catalog seed complete");
    Ok(())
}

fn usd(amount: i64) -> Money {
    Money::new(Decimal::new(amount, 2), CurrencyCode::USD)
}

fn demo_products() -> Vec<Product> {
    let mut size_m = BTreeMap::new();
    size_m.insert("size".to_owned(), "M".to_owned());
    let mut size_l = BTreeMap::new();
    size_l.insert("size".to_owned(), "L".to_owned());

    vec![
        Product {
            id: ProductId::new("studio-poster"),
            title: "Studio Poster".to_owned(),
            description: Some("A3 giclee print, packed and shipped from our studio.".to_owned()),
            price: usd(1800),
            fulfillment_provider: MANUAL_PROVIDER.to_owned(),
            image_url: Some("https://cdn.inkwave.shop/studio-poster.jpg".to_owned()),
            variants: Vec::new(),
            active: true,
        },
        Product {
            id: ProductId::new("classic-tee"),
            title: "Classic Tee".to_owned(),
            description: Some("Heavyweight cotton tee with the Inkwave crest.".to_owned()),
            price: usd(2500),
            fulfillment_provider: "printful".to_owned(),
            image_url: Some("https://cdn.inkwave.shop/classic-tee.jpg".to_owned()),
            variants: vec![
                Variant {
                    id: VariantId::new("classic-tee-m"),
                    title: "M".to_owned(),
                    price: None,
                    attributes: size_m,
                    fulfillment: FulfillmentConfig {
                        external_variant_id: Some("4012".to_owned()),
                        external_product_id: None,
                        design_files: vec![DesignFile {
                            url: "https://cdn.inkwave.shop/designs/crest-front.png".to_owned(),
                            placement: Some("front".to_owned()),
                        }],
                        extra: serde_json::Value::Null,
                    },
                },
                Variant {
                    id: VariantId::new("classic-tee-l"),
                    title: "L".to_owned(),
                    price: Some(usd(2700)),
                    attributes: size_l,
                    fulfillment: FulfillmentConfig {
                        external_variant_id: Some("4013".to_owned()),
                        external_product_id: None,
                        design_files: vec![DesignFile {
                            url: "https://cdn.inkwave.shop/designs/crest-front.png".to_owned(),
                            placement: Some("front".to_owned()),
                        }],
                        extra: serde_json::Value::Null,
                    },
                },
            ],
            active: true,
        },
        Product {
            id: ProductId::new("enamel-mug"),
            title: "Enamel Mug".to_owned(),
            description: Some("330ml enamel mug, printed on demand.".to_owned()),
            price: usd(1600),
            fulfillment_provider: "gelato".to_owned(),
            image_url: Some("https://cdn.inkwave.shop/enamel-mug.jpg".to_owned()),
            variants: vec![Variant {
                id: VariantId::new("enamel-mug-std"),
                title: "Standard".to_owned(),
                price: None,
                attributes: BTreeMap::new(),
                fulfillment: FulfillmentConfig {
                    external_variant_id: None,
                    external_product_id: Some(
                        "mug_enamel_330ml_white_glossy".to_owned(),
                    ),
                    design_files: vec![DesignFile {
                        url: "https://cdn.inkwave.shop/designs/wave-wrap.png".to_owned(),
                        placement: Some("wrap".to_owned()),
                    }],
                    extra: serde_json::Value::Null,
                },
            }],
            active: true,
        },
    ]
}
