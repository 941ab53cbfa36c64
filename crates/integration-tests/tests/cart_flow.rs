//! Integration tests for the cart engine over HTTP.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The storefront server running (cargo run -p littlewear-storefront)
//!
//! Run with: cargo test -p littlewear-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use littlewear_integration_tests::{TestContext, TestIdentity, decimal_field};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running storefront server and PostgreSQL"]
async fn test_add_merges_by_attributes() {
    let ctx = TestContext::new().await;
    let identity = TestIdentity::fresh_session();
    let (product_id, _) = ctx.create_product("10.00", None, 100).await;

    // Same merge key three times with quantities 1, 2, 3
    for quantity in 1..=3 {
        let resp = ctx
            .post("/api/cart", &identity)
            .json(&json!({"product_id": product_id, "quantity": quantity}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let cart: Vec<Value> = ctx
        .get("/api/cart", &identity)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(cart.len(), 1, "merge key must collapse to one line");
    assert_eq!(cart[0]["quantity"], 6);
}

#[tokio::test]
#[ignore = "Requires running storefront server and PostgreSQL"]
async fn test_different_attributes_do_not_merge() {
    let ctx = TestContext::new().await;
    let identity = TestIdentity::fresh_session();
    let (product_id, slug) = ctx.create_product("10.00", None, 100).await;

    // Give the product two sizes so size-tagged adds are valid
    sqlx::query("UPDATE products SET sizes = ARRAY['2T','3T'] WHERE slug = $1")
        .bind(&slug)
        .execute(&ctx.pool)
        .await
        .unwrap();

    for size in ["2T", "3T"] {
        let resp = ctx
            .post("/api/cart", &identity)
            .json(&json!({"product_id": product_id, "quantity": 1, "size": size}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let cart: Vec<Value> = ctx
        .get("/api/cart", &identity)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(cart.len(), 2, "different sizes are different lines");
}

#[tokio::test]
#[ignore = "Requires running storefront server and PostgreSQL"]
async fn test_invalid_size_rejected() {
    let ctx = TestContext::new().await;
    let identity = TestIdentity::fresh_session();
    let (product_id, _) = ctx.create_product("10.00", None, 100).await;

    // The fixture product declares no sizes, so any size is invalid
    let resp = ctx
        .post("/api/cart", &identity)
        .json(&json!({"product_id": product_id, "quantity": 1, "size": "2T"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running storefront server and PostgreSQL"]
async fn test_zero_quantity_update_removes_line() {
    let ctx = TestContext::new().await;
    let identity = TestIdentity::fresh_session();
    let (product_id, _) = ctx.create_product("10.00", None, 100).await;

    let line: Value = ctx
        .post("/api/cart", &identity)
        .json(&json!({"product_id": product_id, "quantity": 2}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let line_id = line["id"].as_i64().unwrap();

    let resp = ctx
        .put(&format!("/api/cart/{line_id}"), &identity)
        .json(&json!({"quantity": 0}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let cart: Vec<Value> = ctx
        .get("/api/cart", &identity)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(cart.is_empty());

    // Removing again is idempotent, not an error
    let resp = ctx
        .delete(&format!("/api/cart/{line_id}"), &identity)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "Requires running storefront server and PostgreSQL"]
async fn test_subtotal_uses_sale_price() {
    let ctx = TestContext::new().await;
    let identity = TestIdentity::fresh_session();

    // {price 500, qty 2} + {salePrice 300 (price 500), qty 1} = 1300
    let (full_price, _) = ctx.create_product("500.00", None, 10).await;
    let (on_sale, _) = ctx.create_product("500.00", Some("300.00"), 10).await;

    ctx.post("/api/cart", &identity)
        .json(&json!({"product_id": full_price, "quantity": 2}))
        .send()
        .await
        .unwrap();
    ctx.post("/api/cart", &identity)
        .json(&json!({"product_id": on_sale, "quantity": 1}))
        .send()
        .await
        .unwrap();

    let summary: Value = ctx
        .get("/api/cart/summary", &identity)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(decimal_field(&summary, "subtotal"), "1300.00".parse().unwrap());
    assert_eq!(summary["item_count"], 3);
}

#[tokio::test]
#[ignore = "Requires running storefront server and PostgreSQL"]
async fn test_free_shipping_boundary() {
    let ctx = TestContext::new().await;
    let identity = TestIdentity::fresh_session();

    // Threshold is 1000 (FREE_SHIPPING_THRESHOLD default)
    let (just_below, _) = ctx.create_product("999.00", None, 10).await;
    let (one_more, _) = ctx.create_product("1.00", None, 10).await;

    ctx.post("/api/cart", &identity)
        .json(&json!({"product_id": just_below, "quantity": 1}))
        .send()
        .await
        .unwrap();

    let summary: Value = ctx
        .get("/api/cart/summary", &identity)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(summary["free_shipping_eligible"], false);
    assert_eq!(
        decimal_field(&summary, "remaining_for_free_shipping"),
        "1.00".parse().unwrap()
    );

    ctx.post("/api/cart", &identity)
        .json(&json!({"product_id": one_more, "quantity": 1}))
        .send()
        .await
        .unwrap();

    let summary: Value = ctx
        .get("/api/cart/summary", &identity)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(summary["free_shipping_eligible"], true);
    assert_eq!(
        decimal_field(&summary, "remaining_for_free_shipping"),
        "0.00".parse().unwrap()
    );
}

#[tokio::test]
#[ignore = "Requires running storefront server and PostgreSQL"]
async fn test_cart_requires_identity() {
    let ctx = TestContext::new().await;

    // No identity headers at all
    let resp = ctx
        .client
        .get(format!("{}/api/cart", ctx.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
