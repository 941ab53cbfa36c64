//! Integration tests for coupon validation/redemption and review aggregation.
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

fn order_body(coupon_code: Option<&str>) -> Value {
    let mut body = json!({
        "shipping_address": {
            "first_name": "Noa",
            "last_name": "Petit",
            "line1": "4 Rue des Lilas",
            "city": "Lyon",
            "postal_code": "69003",
            "country": "FR"
        },
        "payment_method": "card"
    });
    if let Some(code) = coupon_code {
        body["coupon_code"] = json!(code);
    }
    body
}

async fn add_to_cart(ctx: &TestContext, identity: &TestIdentity, product_id: i32, quantity: i32) {
    let resp = ctx
        .post("/api/cart", identity)
        .json(&json!({"product_id": product_id, "quantity": quantity}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
}

// ============================================================================
// Coupon validation
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and PostgreSQL"]
async fn test_validate_percentage_coupon() {
    let ctx = TestContext::new().await;
    let identity = TestIdentity::fresh_user();
    let code = ctx.create_coupon("percentage", "10", None, None, 1).await;

    let result: Value = ctx
        .post("/api/coupons/validate", &identity)
        .json(&json!({"code": code, "order_amount": "200.00"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(result["valid"], true);
    assert_eq!(decimal_field(&result, "discount_amount"), "20.00".parse().unwrap());
}

#[tokio::test]
#[ignore = "Requires running storefront server and PostgreSQL"]
async fn test_validate_below_minimum() {
    let ctx = TestContext::new().await;
    let identity = TestIdentity::fresh_user();
    let code = ctx
        .create_coupon("fixed", "10", Some("100"), None, 1)
        .await;

    let result: Value = ctx
        .post("/api/coupons/validate", &identity)
        .json(&json!({"code": code, "order_amount": "99.99"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(result["valid"], false);
    assert_eq!(result["reason"], "BELOW_MINIMUM");
}

#[tokio::test]
#[ignore = "Requires running storefront server and PostgreSQL"]
async fn test_validate_unknown_code() {
    let ctx = TestContext::new().await;
    let identity = TestIdentity::fresh_user();

    let result: Value = ctx
        .post("/api/coupons/validate", &identity)
        .json(&json!({"code": "NO-SUCH-CODE", "order_amount": "50.00"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(result["valid"], false);
    assert_eq!(result["reason"], "NOT_FOUND");
}

#[tokio::test]
#[ignore = "Requires running storefront server and PostgreSQL"]
async fn test_validation_does_not_consume_usage() {
    let ctx = TestContext::new().await;
    let identity = TestIdentity::fresh_user();
    let code = ctx.create_coupon("fixed", "5", None, Some(1), 1).await;

    // Validate three times; the single use must remain available
    for _ in 0..3 {
        let result: Value = ctx
            .post("/api/coupons/validate", &identity)
            .json(&json!({"code": code, "order_amount": "50.00"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(result["valid"], true);
    }

    let usage_count: i32 = sqlx::query_scalar("SELECT usage_count FROM coupons WHERE code = $1")
        .bind(&code)
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(usage_count, 0);
}

// ============================================================================
// Coupon redemption bounds
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and PostgreSQL"]
async fn test_global_usage_limit_is_enforced() {
    let ctx = TestContext::new().await;
    // usage_limit 1, generous per-user limit
    let code = ctx.create_coupon("fixed", "5", None, Some(1), 10).await;
    let (product_id, _) = ctx.create_product("30.00", None, 100).await;

    let first = TestIdentity::fresh_user();
    add_to_cart(&ctx, &first, product_id, 1).await;
    let resp = ctx
        .post("/api/orders", &first)
        .json(&order_body(Some(&code)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // A different user: the single global use is spent
    let second = TestIdentity::fresh_user();
    add_to_cart(&ctx, &second, product_id, 1).await;
    let resp = ctx
        .post("/api/orders", &second)
        .json(&order_body(Some(&code)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["reason"], "EXHAUSTED");

    // The failed attempt left no side effects
    let cart: Vec<Value> = ctx
        .get("/api/cart", &second)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart.len(), 1, "failed checkout keeps the cart");
}

#[tokio::test]
#[ignore = "Requires running storefront server and PostgreSQL"]
async fn test_per_user_limit_is_enforced() {
    let ctx = TestContext::new().await;
    let code = ctx.create_coupon("fixed", "5", None, None, 1).await;
    let (product_id, _) = ctx.create_product("30.00", None, 100).await;
    let buyer = TestIdentity::fresh_user();

    add_to_cart(&ctx, &buyer, product_id, 1).await;
    let resp = ctx
        .post("/api/orders", &buyer)
        .json(&order_body(Some(&code)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Same buyer again: per-user cap of 1 is spent
    add_to_cart(&ctx, &buyer, product_id, 1).await;
    let resp = ctx
        .post("/api/orders", &buyer)
        .json(&order_body(Some(&code)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["reason"], "USER_LIMIT_REACHED");
}

#[tokio::test]
#[ignore = "Requires running storefront server and PostgreSQL"]
async fn test_free_shipping_coupon_zeroes_shipping() {
    let ctx = TestContext::new().await;
    let code = ctx.create_coupon("free_shipping", "0", None, None, 1).await;
    let (product_id, _) = ctx.create_product("30.00", None, 100).await;
    let buyer = TestIdentity::fresh_user();

    add_to_cart(&ctx, &buyer, product_id, 1).await;
    let order: Value = ctx
        .post("/api/orders", &buyer)
        .json(&order_body(Some(&code)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(decimal_field(&order, "shipping_cost"), "0.00".parse().unwrap());
    assert_eq!(decimal_field(&order, "total_amount"), "30.00".parse().unwrap());
}

// ============================================================================
// Review aggregation
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and PostgreSQL"]
async fn test_rating_aggregate_recomputes() {
    let ctx = TestContext::new().await;
    let (_, slug) = ctx.create_product("15.00", None, 10).await;
    let reviews_path = format!("/api/products/{slug}/reviews");

    for rating in [5, 3, 4] {
        let resp = ctx
            .post(&reviews_path, &TestIdentity::fresh_user())
            .json(&json!({"rating": rating, "comment": "soft and held up in the wash"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let product: Value = ctx
        .get(&format!("/api/products/{slug}"), &TestIdentity::fresh_session())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(decimal_field(&product, "rating"), "4.00".parse().unwrap());
    assert_eq!(product["review_count"], 3);

    // A fourth review shifts the mean to 3.50
    let resp = ctx
        .post(&reviews_path, &TestIdentity::fresh_user())
        .json(&json!({"rating": 2}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let product: Value = ctx
        .get(&format!("/api/products/{slug}"), &TestIdentity::fresh_session())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(decimal_field(&product, "rating"), "3.50".parse().unwrap());
    assert_eq!(product["review_count"], 4);
}

#[tokio::test]
#[ignore = "Requires running storefront server and PostgreSQL"]
async fn test_out_of_range_rating_rejected() {
    let ctx = TestContext::new().await;
    let (_, slug) = ctx.create_product("15.00", None, 10).await;

    for rating in [0, 6] {
        let resp = ctx
            .post(&format!("/api/products/{slug}/reviews"), &TestIdentity::fresh_user())
            .json(&json!({"rating": rating}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
