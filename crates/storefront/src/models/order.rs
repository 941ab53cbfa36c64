//! Order models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use littlewear_core::{OrderId, OrderLineId, OrderStatus, PaymentStatus, ProductId};

/// A structured postal address, snapshotted onto the order as JSONB.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// A placed order.
///
/// Immutable after creation except for `status`/`payment_status`;
/// `total_amount` is computed once at placement and never recomputed.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    /// Public order reference exposed to buyers.
    pub reference: Uuid,
    pub user_id: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: String,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping_cost: Decimal,
    pub total_amount: Decimal,
    pub coupon_code: Option<String>,
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item on a placed order.
///
/// `price` is the effective price snapshotted at order time; it never
/// changes, regardless of later catalog edits.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
    pub price: Decimal,
}

/// An order together with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderLine>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_address_serde_roundtrip() {
        let addr = Address {
            first_name: "Maya".to_string(),
            last_name: "Lindgren".to_string(),
            line1: "12 Alder Way".to_string(),
            line2: None,
            city: "Portland".to_string(),
            state: Some("OR".to_string()),
            postal_code: "97209".to_string(),
            country: "US".to_string(),
            phone: None,
        };

        let json = serde_json::to_value(&addr).unwrap();
        // Absent optionals are omitted entirely, keeping the JSONB snapshot lean
        assert!(json.get("line2").is_none());
        let back: Address = serde_json::from_value(json).unwrap();
        assert_eq!(back.city, "Portland");
        assert_eq!(back.state.as_deref(), Some("OR"));
    }
}
