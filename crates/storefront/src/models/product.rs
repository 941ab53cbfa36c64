//! Catalog models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use littlewear_core::{CategoryId, ProductId, effective_price};

/// A product category.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

/// A catalog product.
///
/// `rating` and `review_count` are denormalized from the review set and are
/// written only by the review aggregator.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub stock: i32,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub image_url: Option<String>,
    pub rating: Decimal,
    pub review_count: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// The price a buyer pays right now (sale price when set).
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        effective_price(self.price, self.sale_price)
    }

    /// Whether `size` is a valid choice for this product.
    ///
    /// A product with no declared sizes accepts only "no size"; one with
    /// declared sizes accepts any member of the list (or "no size").
    #[must_use]
    pub fn allows_size(&self, size: Option<&str>) -> bool {
        match size {
            None => true,
            Some(s) => self.sizes.iter().any(|declared| declared == s),
        }
    }

    /// Whether `color` is a valid choice for this product.
    #[must_use]
    pub fn allows_color(&self, color: Option<&str>) -> bool {
        match color {
            None => true,
            Some(c) => self.colors.iter().any(|declared| declared == c),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(sizes: &[&str], colors: &[&str]) -> Product {
        Product {
            id: ProductId::new(1),
            category_id: None,
            name: "Striped Romper".to_string(),
            slug: "striped-romper".to_string(),
            description: None,
            price: "24.99".parse().unwrap(),
            sale_price: None,
            stock: 10,
            sizes: sizes.iter().map(ToString::to_string).collect(),
            colors: colors.iter().map(ToString::to_string).collect(),
            image_url: None,
            rating: Decimal::ZERO,
            review_count: 0,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_allows_size_membership() {
        let p = product(&["2T", "3T"], &[]);
        assert!(p.allows_size(Some("2T")));
        assert!(p.allows_size(None));
        assert!(!p.allows_size(Some("4T")));
    }

    #[test]
    fn test_sizeless_product_rejects_any_size() {
        let p = product(&[], &[]);
        assert!(p.allows_size(None));
        assert!(!p.allows_size(Some("2T")));
    }

    #[test]
    fn test_effective_price_prefers_sale() {
        let mut p = product(&[], &[]);
        assert_eq!(p.effective_price(), "24.99".parse().unwrap());
        p.sale_price = Some("19.99".parse().unwrap());
        assert_eq!(p.effective_price(), "19.99".parse().unwrap());
    }
}
