//! Cached catalog reads.
//!
//! Product detail lookups go through a `moka` read-through cache (5 minute
//! TTL) keyed by slug. Writers that change what a detail page shows - order
//! placement (stock) and review submission (rating) - invalidate the slug
//! after their transaction commits.

use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::debug;

use crate::db::ProductRepository;
use crate::db::products::ProductFilter;
use crate::error::{AppError, Result};
use crate::models::{Category, Product};

const CACHE_CAPACITY: u64 = 1000;
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Shared cache of product detail snapshots, keyed by slug.
#[derive(Clone)]
pub struct CatalogCache {
    by_slug: Cache<String, Product>,
}

impl CatalogCache {
    /// Create the cache with default capacity and TTL.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_slug: Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(CACHE_TTL)
                .build(),
        }
    }

    /// Drop a cached product after a stock or rating change.
    pub async fn invalidate(&self, slug: &str) {
        self.by_slug.invalidate(slug).await;
    }
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only catalog service.
pub struct CatalogService<'a> {
    pool: &'a PgPool,
    cache: &'a CatalogCache,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, cache: &'a CatalogCache) -> Self {
        Self { pool, cache }
    }

    /// Get an active product by slug, via the cache.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no active product has this slug.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Product> {
        if let Some(product) = self.cache.by_slug.get(slug).await {
            debug!(slug, "catalog cache hit");
            return Ok(product);
        }

        let product = ProductRepository::new(self.pool)
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {slug}")))?;

        self.cache
            .by_slug
            .insert(slug.to_string(), product.clone())
            .await;

        Ok(product)
    }

    /// List active products matching the filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Database`] if the query fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let products = ProductRepository::new(self.pool).list(filter).await?;
        Ok(products)
    }

    /// Get a category by slug.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no category has this slug.
    pub async fn get_category_by_slug(&self, slug: &str) -> Result<Category> {
        ProductRepository::new(self.pool)
            .get_category_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("category {slug}")))
    }
}
