//! Wire-shape tests for API payload types.
//!
//! These run without a server or database: they pin down the JSON the API
//! emits so UI consumers don't get surprised by a serialization change.

#![allow(clippy::unwrap_used)]

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;

use littlewear_core::{CartLineId, OrderStatus, ProductId};
use littlewear_storefront::models::{Address, CartLineView, CartSummary};
use littlewear_storefront::services::RejectionReason;

#[test]
fn test_money_serializes_as_string() {
    let summary = CartSummary {
        item_count: 3,
        subtotal: "1300.00".parse().unwrap(),
        free_shipping_threshold: Decimal::from(1000),
        free_shipping_eligible: true,
        remaining_for_free_shipping: Decimal::ZERO,
    };

    let value = serde_json::to_value(&summary).unwrap();
    assert_eq!(value["subtotal"], json!("1300.00"));
    assert_eq!(value["free_shipping_eligible"], json!(true));
    assert_eq!(value["item_count"], json!(3));
}

#[test]
fn test_cart_line_view_hides_nothing_needed_for_display() {
    let view = CartLineView {
        id: CartLineId::new(7),
        product_id: ProductId::new(3),
        name: "Corduroy Pinafore Dress".to_string(),
        slug: "corduroy-pinafore-dress".to_string(),
        image_url: None,
        price: "38.00".parse().unwrap(),
        sale_price: None,
        unit_price: "38.00".parse().unwrap(),
        quantity: 2,
        size: Some("3T".to_string()),
        color: Some("rust".to_string()),
        line_total: "76.00".parse().unwrap(),
    };

    let value = serde_json::to_value(&view).unwrap();
    assert_eq!(value["id"], json!(7));
    assert_eq!(value["slug"], json!("corduroy-pinafore-dress"));
    assert_eq!(value["line_total"], json!("76.00"));
    assert_eq!(value["size"], json!("3T"));
}

#[test]
fn test_address_accepts_minimal_payload() {
    // Optional fields may be omitted entirely by clients
    let addr: Address = serde_json::from_value(json!({
        "first_name": "Noa",
        "last_name": "Petit",
        "line1": "4 Rue des Lilas",
        "city": "Lyon",
        "postal_code": "69003",
        "country": "FR"
    }))
    .unwrap();

    assert_eq!(addr.city, "Lyon");
    assert!(addr.line2.is_none());
    assert!(addr.state.is_none());
    assert!(addr.phone.is_none());
}

#[test]
fn test_order_status_wire_names() {
    for (status, wire) in [
        (OrderStatus::Pending, "\"pending\""),
        (OrderStatus::Processing, "\"processing\""),
        (OrderStatus::Shipped, "\"shipped\""),
        (OrderStatus::Delivered, "\"delivered\""),
        (OrderStatus::Cancelled, "\"cancelled\""),
    ] {
        assert_eq!(serde_json::to_string(&status).unwrap(), wire);
    }
}

#[test]
fn test_rejection_reason_codes_are_stable() {
    for (reason, code) in [
        (RejectionReason::NotFound, "NOT_FOUND"),
        (RejectionReason::Expired, "EXPIRED"),
        (RejectionReason::BelowMinimum, "BELOW_MINIMUM"),
        (RejectionReason::Exhausted, "EXHAUSTED"),
        (RejectionReason::UserLimitReached, "USER_LIMIT_REACHED"),
        (RejectionReason::NotApplicable, "NOT_APPLICABLE"),
    ] {
        assert_eq!(reason.code(), code);
    }
}

#[test]
fn test_timestamps_are_rfc3339() {
    let now = Utc::now();
    let value = serde_json::to_value(now).unwrap();
    let text = value.as_str().unwrap();
    assert!(text.contains('T'), "chrono serde default is RFC 3339: {text}");
}
