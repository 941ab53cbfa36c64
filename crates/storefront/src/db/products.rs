//! Catalog repository: read-only product and category lookups.
//!
//! Stock and the denormalized rating fields are mutated elsewhere (order
//! placement and the review aggregator); everything here is a read.

use rust_decimal::Decimal;
use sqlx::PgPool;

use littlewear_core::ProductId;

use super::RepositoryError;
use crate::models::{Category, Product};

const PRODUCT_COLUMNS: &str = "id, category_id, name, slug, description, price, sale_price, \
     stock, sizes, colors, image_url, rating, review_count, is_active, created_at, updated_at";

/// Filters for the catalog listing.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Restrict to a category by slug.
    pub category_slug: Option<String>,
    /// Lower bound on the effective price.
    pub min_price: Option<Decimal>,
    /// Upper bound on the effective price.
    pub max_price: Option<Decimal>,
    /// Only products with a sale price set.
    pub on_sale: bool,
    pub limit: i64,
    pub offset: i64,
}

/// Repository for catalog reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an active product by its ID.
    ///
    /// Inactive products are treated as missing; the cart engine uses this
    /// so deactivated items cannot be added.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active_by_id(
        &self,
        id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND is_active"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Get an active product by its slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = $1 AND is_active"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// List active products matching the filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active \
               AND ($1::text IS NULL \
                    OR category_id = (SELECT id FROM categories WHERE slug = $1)) \
               AND ($2::numeric IS NULL OR COALESCE(sale_price, price) >= $2) \
               AND ($3::numeric IS NULL OR COALESCE(sale_price, price) <= $3) \
               AND (NOT $4 OR sale_price IS NOT NULL) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $5 OFFSET $6"
        ))
        .bind(filter.category_slug.as_deref())
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(filter.on_sale)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Get a category by its slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_category_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, created_at FROM categories WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(category)
    }
}
