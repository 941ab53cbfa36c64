//! Cart repository.
//!
//! The add path is a single atomic upsert against the merge-key index
//! (identity, product, size, color): concurrent adds with the same key
//! increment one row instead of creating duplicates.

use sqlx::{PgConnection, PgPool};

use littlewear_core::{CartLineId, CategoryId, ProductId};

use super::RepositoryError;
use crate::models::{CartLine, CartLineView};

const LINE_COLUMNS: &str = "id, identity, product_id, quantity, size, color, created_at, updated_at";

/// Repository for cart line items.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a line, or increment the quantity of the line with the same
    /// merge key. Returns the resulting line either way.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn upsert_line(
        &self,
        identity: &str,
        product_id: ProductId,
        quantity: i32,
        size: Option<&str>,
        color: Option<&str>,
    ) -> Result<CartLine, RepositoryError> {
        let line = sqlx::query_as::<_, CartLine>(&format!(
            "INSERT INTO cart_items (identity, product_id, quantity, size, color) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (identity, product_id, (COALESCE(size, '')), (COALESCE(color, ''))) \
             DO UPDATE SET \
                 quantity   = cart_items.quantity + EXCLUDED.quantity, \
                 updated_at = NOW() \
             RETURNING {LINE_COLUMNS}"
        ))
        .bind(identity)
        .bind(product_id)
        .bind(quantity)
        .bind(size)
        .bind(color)
        .fetch_one(self.pool)
        .await?;

        Ok(line)
    }

    /// Set a line's quantity. Returns `None` when the line doesn't exist or
    /// doesn't belong to `identity`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update_quantity(
        &self,
        identity: &str,
        line_id: CartLineId,
        quantity: i32,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let line = sqlx::query_as::<_, CartLine>(&format!(
            "UPDATE cart_items \
             SET quantity = $3, updated_at = NOW() \
             WHERE id = $1 AND identity = $2 \
             RETURNING {LINE_COLUMNS}"
        ))
        .bind(line_id)
        .bind(identity)
        .bind(quantity)
        .fetch_optional(self.pool)
        .await?;

        Ok(line)
    }

    /// Delete a line. Idempotent: returns `false` when nothing was there.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_line(
        &self,
        identity: &str,
        line_id: CartLineId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND identity = $2")
            .bind(line_id)
            .bind(identity)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every line for `identity`. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear(&self, identity: &str) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE identity = $1")
            .bind(identity)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Delete every line for `identity` inside an open transaction.
    ///
    /// Used by order placement so the cart clear commits or rolls back with
    /// the rest of the order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear_in(
        conn: &mut PgConnection,
        identity: &str,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE identity = $1")
            .bind(identity)
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }

    /// List the (product, category) pairs currently in the cart.
    ///
    /// Used by the coupon validator to test allow-lists without pulling the
    /// full display join.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_product_categories(
        &self,
        identity: &str,
    ) -> Result<Vec<(ProductId, Option<CategoryId>)>, RepositoryError> {
        let pairs = sqlx::query_as::<_, (ProductId, Option<CategoryId>)>(
            "SELECT ci.product_id, p.category_id \
             FROM cart_items ci \
             JOIN products p ON p.id = ci.product_id \
             WHERE ci.identity = $1",
        )
        .bind(identity)
        .fetch_all(self.pool)
        .await?;

        Ok(pairs)
    }

    /// List the cart joined with each product's display snapshot, in
    /// insertion order.
    ///
    /// `unit_price`/`line_total` are the product's current effective price,
    /// not an order snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_views(&self, identity: &str) -> Result<Vec<CartLineView>, RepositoryError> {
        let views = sqlx::query_as::<_, CartLineView>(
            "SELECT ci.id, ci.product_id, p.name, p.slug, p.image_url, \
                    p.price, p.sale_price, \
                    COALESCE(p.sale_price, p.price) AS unit_price, \
                    ci.quantity, ci.size, ci.color, \
                    COALESCE(p.sale_price, p.price) * ci.quantity AS line_total \
             FROM cart_items ci \
             JOIN products p ON p.id = ci.product_id \
             WHERE ci.identity = $1 \
             ORDER BY ci.created_at ASC, ci.id ASC",
        )
        .bind(identity)
        .fetch_all(self.pool)
        .await?;

        Ok(views)
    }
}
