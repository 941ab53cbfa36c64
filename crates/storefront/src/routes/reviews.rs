//! Review route handlers.
//!
//! Mounted under the product's slug; handlers resolve the slug to a product
//! and hand its id to the review service.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::ResolvedIdentity;
use crate::services::{CatalogService, ReviewService};
use crate::state::AppState;

/// Review submission body.
#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub rating: i32,
    pub title: Option<String>,
    pub comment: Option<String>,
}

/// Recent reviews for a product.
#[instrument(skip_all, fields(slug = %slug))]
pub async fn index(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let product = CatalogService::new(state.pool(), state.catalog_cache())
        .get_by_slug(&slug)
        .await?;
    let reviews = ReviewService::new(state.pool(), state.catalog_cache())
        .list(product.id)
        .await?;
    Ok(Json(reviews))
}

/// Submit a review; the product's aggregate is recomputed synchronously.
#[instrument(skip_all, fields(slug = %slug, rating = request.rating))]
pub async fn create(
    State(state): State<AppState>,
    ResolvedIdentity(identity): ResolvedIdentity,
    Path(slug): Path<String>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<impl IntoResponse> {
    let product = CatalogService::new(state.pool(), state.catalog_cache())
        .get_by_slug(&slug)
        .await?;

    let review = ReviewService::new(state.pool(), state.catalog_cache())
        .submit(
            &identity,
            product.id,
            request.rating,
            request.title.as_deref(),
            request.comment.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(review)))
}
