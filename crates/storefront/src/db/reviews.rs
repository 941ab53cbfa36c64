//! Review repository.
//!
//! The insert and the aggregate recompute run in one transaction, and the
//! aggregate is written from a single server-side statement, so two
//! concurrent submissions for the same product cannot overwrite each
//! other's average with a stale read.

use sqlx::PgPool;

use littlewear_core::ProductId;

use super::RepositoryError;
use crate::models::Review;

const REVIEW_COLUMNS: &str = "id, product_id, user_id, rating, title, comment, created_at";

/// Repository for product reviews.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a review and recompute the product's denormalized
    /// rating/review_count from the full review set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either statement fails; on
    /// failure nothing is persisted.
    pub async fn insert_and_recompute(
        &self,
        product_id: ProductId,
        user_id: &str,
        rating: i32,
        title: Option<&str>,
        comment: Option<&str>,
    ) -> Result<Review, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let review = sqlx::query_as::<_, Review>(&format!(
            "INSERT INTO reviews (product_id, user_id, rating, title, comment) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(product_id)
        .bind(user_id)
        .bind(rating)
        .bind(title)
        .bind(comment)
        .fetch_one(&mut *tx)
        .await?;

        // The aggregate is computed inside the UPDATE itself; no read-modify-write.
        sqlx::query(
            "UPDATE products \
             SET rating = agg.avg_rating, review_count = agg.cnt, updated_at = NOW() \
             FROM (SELECT ROUND(COALESCE(AVG(rating), 0), 2) AS avg_rating, \
                          COUNT(*)::int AS cnt \
                   FROM reviews WHERE product_id = $1) agg \
             WHERE id = $1",
        )
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(review)
    }

    /// List a product's most recent reviews.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
        limit: i64,
    ) -> Result<Vec<Review>, RepositoryError> {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews \
             WHERE product_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2"
        ))
        .bind(product_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(reviews)
    }
}
