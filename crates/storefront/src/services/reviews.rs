//! Review submission and rating aggregation.
//!
//! Submitting a review recomputes the product's denormalized rating and
//! review count synchronously, inside the same transaction as the insert
//! (see [`ReviewRepository::insert_and_recompute`]). Nothing else writes
//! those two columns.

use sqlx::PgPool;

use littlewear_core::{Identity, ProductId};

use crate::db::{ProductRepository, ReviewRepository};
use crate::error::{AppError, Result};
use crate::models::Review;
use crate::services::catalog::CatalogCache;

const DEFAULT_REVIEW_LIMIT: i64 = 20;

/// Review service.
pub struct ReviewService<'a> {
    pool: &'a PgPool,
    catalog: &'a CatalogCache,
}

impl<'a> ReviewService<'a> {
    /// Create a new review service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, catalog: &'a CatalogCache) -> Self {
        Self { pool, catalog }
    }

    /// Submit a review and synchronously refresh the product's aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for a rating outside 1-5 and
    /// [`AppError::NotFound`] if the product is missing or inactive.
    pub async fn submit(
        &self,
        identity: &Identity,
        product_id: ProductId,
        rating: i32,
        title: Option<&str>,
        comment: Option<&str>,
    ) -> Result<Review> {
        if !(1..=5).contains(&rating) {
            return Err(AppError::Validation(
                "rating must be between 1 and 5".to_string(),
            ));
        }

        let product = ProductRepository::new(self.pool)
            .get_active_by_id(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

        let review = ReviewRepository::new(self.pool)
            .insert_and_recompute(product_id, identity.key(), rating, title, comment)
            .await?;

        // The cached detail snapshot now has a stale aggregate.
        self.catalog.invalidate(&product.slug).await;

        tracing::info!(
            product_id = %product_id,
            rating,
            "review submitted"
        );

        Ok(review)
    }

    /// A product's most recent reviews.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Database`] if the query fails.
    pub async fn list(&self, product_id: ProductId) -> Result<Vec<Review>> {
        let reviews = ReviewRepository::new(self.pool)
            .list_for_product(product_id, DEFAULT_REVIEW_LIMIT)
            .await?;
        Ok(reviews)
    }
}
