//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (DB ping)
//!
//! # Catalog
//! GET  /api/products                    - Product listing (filters via query)
//! GET  /api/products/{slug}             - Product detail with recent reviews
//!
//! # Reviews
//! GET  /api/products/{slug}/reviews     - Recent reviews for a product
//! POST /api/products/{slug}/reviews     - Submit review (recomputes aggregate)
//!
//! # Cart (any resolved identity)
//! GET    /api/cart                      - Cart lines with product snapshots
//! POST   /api/cart                      - Add item (merges by attributes)
//! GET    /api/cart/summary              - Subtotal + free-shipping progress
//! PUT    /api/cart/{id}                 - Update quantity (<= 0 deletes)
//! DELETE /api/cart/{id}                 - Remove line
//! DELETE /api/cart                      - Clear cart
//!
//! # Coupons
//! POST /api/coupons/validate            - Validate code against an amount
//!
//! # Orders (signed-in users)
//! POST /api/orders                      - Place order from the cart
//! GET  /api/orders                      - Caller's orders (admins: all)
//! GET  /api/orders/{id}                 - Order detail (owner or admin)
//!
//! # Admin
//! PUT  /api/admin/orders/{id}/status    - Status transition
//! ```

pub mod cart;
pub mod coupons;
pub mod orders;
pub mod products;
pub mod reviews;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the catalog and review routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{slug}", get(products::show))
        .route(
            "/{slug}/reviews",
            get(reviews::index).post(reviews::create),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::index).post(cart::add).delete(cart::clear))
        .route("/summary", get(cart::summary))
        .route("/{id}", put(cart::update).delete(cart::remove))
}

/// Create the coupon routes router.
pub fn coupon_routes() -> Router<AppState> {
    Router::new().route("/validate", post(coupons::validate))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/{id}", get(orders::show))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/orders/{id}/status", put(orders::update_status))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/products", product_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/coupons", coupon_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/admin", admin_routes())
}
