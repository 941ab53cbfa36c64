//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::products::ProductFilter;
use crate::error::Result;
use crate::models::{Product, Review};
use crate::services::{CatalogService, ReviewService};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 24;
const MAX_PAGE_SIZE: i64 = 100;

/// Catalog listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub on_sale: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<ListQuery> for ProductFilter {
    fn from(query: ListQuery) -> Self {
        Self {
            category_slug: query.category,
            min_price: query.min_price,
            max_price: query.max_price,
            on_sale: query.on_sale,
            limit: query
                .limit
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
            offset: query.offset.unwrap_or(0).max(0),
        }
    }
}

/// Product detail response: the product plus its most recent reviews.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub reviews: Vec<Review>,
}

/// List active products, newest first.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let catalog = CatalogService::new(state.pool(), state.catalog_cache());

    // An unknown category is a 404, not an empty listing
    if let Some(category) = &query.category {
        catalog.get_category_by_slug(category).await?;
    }

    let filter = ProductFilter::from(query);
    let products = catalog.list(&filter).await?;
    Ok(Json(products))
}

/// Product detail by slug, with recent reviews.
#[instrument(skip_all, fields(slug = %slug))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let product = CatalogService::new(state.pool(), state.catalog_cache())
        .get_by_slug(&slug)
        .await?;
    let reviews = ReviewService::new(state.pool(), state.catalog_cache())
        .list(product.id)
        .await?;

    Ok(Json(ProductDetail { product, reviews }))
}
