//! Cart route handlers.
//!
//! All handlers operate on the caller's resolved identity; anonymous
//! sessions get a cart just like signed-in users.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use littlewear_core::{CartLineId, ProductId};

use crate::error::Result;
use crate::middleware::ResolvedIdentity;
use crate::services::CartService;
use crate::state::AppState;

/// Add to cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
}

const fn default_quantity() -> i32 {
    1
}

/// Update quantity request body.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}

/// List the cart with product display snapshots.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    ResolvedIdentity(identity): ResolvedIdentity,
) -> Result<impl IntoResponse> {
    let items = CartService::new(state.pool()).get_cart(&identity).await?;
    Ok(Json(items))
}

/// Add an item, merging into an existing line when attributes match.
#[instrument(skip_all, fields(product_id = %request.product_id))]
pub async fn add(
    State(state): State<AppState>,
    ResolvedIdentity(identity): ResolvedIdentity,
    Json(request): Json<AddToCartRequest>,
) -> Result<impl IntoResponse> {
    let line = CartService::new(state.pool())
        .add_item(
            &identity,
            request.product_id,
            request.quantity,
            request.size.as_deref(),
            request.color.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(line)))
}

/// Update a line's quantity; zero or less removes it.
#[instrument(skip_all, fields(line_id = id))]
pub async fn update(
    State(state): State<AppState>,
    ResolvedIdentity(identity): ResolvedIdentity,
    Path(id): Path<i32>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<Response> {
    let updated = CartService::new(state.pool())
        .update_quantity(&identity, CartLineId::new(id), request.quantity)
        .await?;

    Ok(match updated {
        Some(line) => Json(line).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// Remove a line. Idempotent.
#[instrument(skip_all, fields(line_id = id))]
pub async fn remove(
    State(state): State<AppState>,
    ResolvedIdentity(identity): ResolvedIdentity,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    CartService::new(state.pool())
        .remove_item(&identity, CartLineId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Clear the cart. Idempotent.
#[instrument(skip_all)]
pub async fn clear(
    State(state): State<AppState>,
    ResolvedIdentity(identity): ResolvedIdentity,
) -> Result<impl IntoResponse> {
    CartService::new(state.pool()).clear(&identity).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Subtotal and free-shipping progress.
#[instrument(skip_all)]
pub async fn summary(
    State(state): State<AppState>,
    ResolvedIdentity(identity): ResolvedIdentity,
) -> Result<impl IntoResponse> {
    let summary = CartService::new(state.pool())
        .summary(&identity, &state.config().shipping)
        .await?;
    Ok(Json(summary))
}
