//! Cart models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use littlewear_core::{CartLineId, ProductId};

/// A cart line item as stored.
///
/// The merge key is (identity, `product_id`, size, color): adding with an
/// existing key increments the stored quantity instead of creating a row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartLine {
    pub id: CartLineId,
    #[serde(skip)]
    pub identity: String,
    pub product_id: ProductId,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cart line joined with its product's display snapshot.
///
/// `unit_price` and `line_total` reflect the product's *current* effective
/// price, not the price an eventual order will snapshot - that happens at
/// placement time.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartLineView {
    pub id: CartLineId,
    pub product_id: ProductId,
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
    pub line_total: Decimal,
}

/// Cart totals and free-shipping progress for display.
#[derive(Debug, Clone, Serialize)]
pub struct CartSummary {
    pub item_count: i64,
    pub subtotal: Decimal,
    pub free_shipping_threshold: Decimal,
    pub free_shipping_eligible: bool,
    pub remaining_for_free_shipping: Decimal,
}
