//! Order route handlers.
//!
//! Placement and history require a signed-in user; status transitions are
//! admin-gated. The placement body carries no items or prices - the order
//! is built from the caller's persisted cart server-side.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use littlewear_core::{OrderId, OrderStatus};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::{MaybeAdmin, RequireAdmin, RequireUser};
use crate::models::Address;
use crate::services::{CheckoutService, PlaceOrderInput};
use crate::state::AppState;

/// Order placement body.
#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
    pub payment_method: String,
    pub coupon_code: Option<String>,
    pub notes: Option<String>,
}

/// Status transition body.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Place an order from the caller's cart.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireUser(identity): RequireUser,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<impl IntoResponse> {
    let input = PlaceOrderInput {
        shipping_address: request.shipping_address,
        billing_address: request.billing_address,
        payment_method: request.payment_method,
        coupon_code: request.coupon_code,
        notes: request.notes,
    };

    let order = CheckoutService::new(
        state.pool(),
        state.config().shipping,
        state.catalog_cache(),
    )
    .place_order(&identity, &input)
    .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// The caller's orders, newest first. Admins see every order.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireUser(identity): RequireUser,
    MaybeAdmin(is_admin): MaybeAdmin,
) -> Result<impl IntoResponse> {
    let repo = OrderRepository::new(state.pool());

    let orders = if is_admin {
        repo.list_all().await?
    } else {
        // RequireUser guarantees the variant
        let user_id = identity.user_id().unwrap_or_default();
        repo.list_for_user(user_id).await?
    };

    Ok(Json(orders))
}

/// One order with line items; owners and admins only.
#[instrument(skip_all, fields(order_id = id))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(identity): RequireUser,
    MaybeAdmin(is_admin): MaybeAdmin,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let order_id = OrderId::new(id);
    let order = CheckoutService::new(
        state.pool(),
        state.config().shipping,
        state.catalog_cache(),
    )
    .get(order_id)
    .await?;

    if !is_admin && Some(order.order.user_id.as_str()) != identity.user_id() {
        // Don't leak which order ids exist to non-owners
        return Err(AppError::NotFound(format!("order {order_id}")));
    }

    Ok(Json(order))
}

/// Admin-triggered status transition.
#[instrument(skip_all, fields(order_id = id, status = %request.status))]
pub async fn update_status(
    State(state): State<AppState>,
    _: RequireAdmin,
    Path(id): Path<i32>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse> {
    let order = CheckoutService::new(
        state.pool(),
        state.config().shipping,
        state.catalog_cache(),
    )
    .update_status(OrderId::new(id), request.status)
    .await?;

    Ok(Json(order))
}
