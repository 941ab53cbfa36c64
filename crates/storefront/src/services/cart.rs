//! Cart engine.
//!
//! Owns the mapping from a resolved identity to its set of cart lines:
//! merge-by-attributes adds, quantity updates, removal, clearing, and the
//! subtotal / free-shipping arithmetic. The merge itself is a single
//! database upsert (see [`CartRepository::upsert_line`]), so concurrent adds
//! with the same key cannot produce duplicate rows.

use rust_decimal::Decimal;
use sqlx::PgPool;

use littlewear_core::{CartLineId, Identity, ProductId};

use crate::config::ShippingConfig;
use crate::db::{CartRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::models::{CartLine, CartLineView, CartSummary};

/// Sum of each line's effective price times quantity.
///
/// Pure; works on the joined view rows where `line_total` was computed by
/// the database from the same price columns.
#[must_use]
pub fn compute_subtotal(items: &[CartLineView]) -> Decimal {
    items.iter().map(|item| item.line_total).sum()
}

/// Whether a subtotal qualifies for free shipping.
#[must_use]
pub fn free_shipping_eligible(subtotal: Decimal, threshold: Decimal) -> bool {
    subtotal >= threshold
}

/// How much more the cart needs to reach free shipping; zero once eligible.
#[must_use]
pub fn remaining_for_free_shipping(subtotal: Decimal, threshold: Decimal) -> Decimal {
    (threshold - subtotal).max(Decimal::ZERO)
}

/// The cart engine.
pub struct CartService<'a> {
    pool: &'a PgPool,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add a product to the cart, merging into an existing line when the
    /// (product, size, color) attributes match.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `quantity < 1` or the size/color
    /// is not one the product declares, and [`AppError::NotFound`] if the
    /// product is missing or inactive.
    pub async fn add_item(
        &self,
        identity: &Identity,
        product_id: ProductId,
        quantity: i32,
        size: Option<&str>,
        color: Option<&str>,
    ) -> Result<CartLine> {
        if quantity < 1 {
            return Err(AppError::Validation(
                "quantity must be at least 1".to_string(),
            ));
        }

        let product = ProductRepository::new(self.pool)
            .get_active_by_id(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

        if !product.allows_size(size) {
            return Err(AppError::Validation(format!(
                "size {:?} is not available for {}",
                size.unwrap_or(""),
                product.slug
            )));
        }
        if !product.allows_color(color) {
            return Err(AppError::Validation(format!(
                "color {:?} is not available for {}",
                color.unwrap_or(""),
                product.slug
            )));
        }

        let line = CartRepository::new(self.pool)
            .upsert_line(identity.key(), product_id, quantity, size, color)
            .await?;

        Ok(line)
    }

    /// Set a line's quantity. A quantity of zero or less removes the line
    /// and returns `None`; removal of an already-absent line is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] when a positive-quantity update targets
    /// a line that doesn't exist or doesn't belong to `identity`.
    pub async fn update_quantity(
        &self,
        identity: &Identity,
        line_id: CartLineId,
        quantity: i32,
    ) -> Result<Option<CartLine>> {
        let repo = CartRepository::new(self.pool);

        if quantity <= 0 {
            repo.delete_line(identity.key(), line_id).await?;
            return Ok(None);
        }

        let line = repo
            .update_quantity(identity.key(), line_id, quantity)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("cart line {line_id}")))?;

        Ok(Some(line))
    }

    /// Remove a line. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Database`] if the delete fails.
    pub async fn remove_item(&self, identity: &Identity, line_id: CartLineId) -> Result<()> {
        CartRepository::new(self.pool)
            .delete_line(identity.key(), line_id)
            .await?;
        Ok(())
    }

    /// Remove every line for this identity. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Database`] if the delete fails.
    pub async fn clear(&self, identity: &Identity) -> Result<()> {
        CartRepository::new(self.pool).clear(identity.key()).await?;
        Ok(())
    }

    /// The cart joined with product display snapshots, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Database`] if the query fails.
    pub async fn get_cart(&self, identity: &Identity) -> Result<Vec<CartLineView>> {
        let views = CartRepository::new(self.pool)
            .list_views(identity.key())
            .await?;
        Ok(views)
    }

    /// Cart totals and free-shipping progress.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Database`] if the query fails.
    pub async fn summary(
        &self,
        identity: &Identity,
        shipping: &ShippingConfig,
    ) -> Result<CartSummary> {
        let items = self.get_cart(identity).await?;
        let subtotal = compute_subtotal(&items);
        let threshold = shipping.free_shipping_threshold;

        Ok(CartSummary {
            item_count: items.iter().map(|item| i64::from(item.quantity)).sum(),
            subtotal,
            free_shipping_threshold: threshold,
            free_shipping_eligible: free_shipping_eligible(subtotal, threshold),
            remaining_for_free_shipping: remaining_for_free_shipping(subtotal, threshold),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use littlewear_core::{CartLineId, ProductId};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn view(price: &str, sale_price: Option<&str>, quantity: i32) -> CartLineView {
        let price = dec(price);
        let sale_price = sale_price.map(dec);
        let unit_price = sale_price.unwrap_or(price);
        CartLineView {
            id: CartLineId::new(1),
            product_id: ProductId::new(1),
            name: "Corduroy Overalls".to_string(),
            slug: "corduroy-overalls".to_string(),
            image_url: None,
            price,
            sale_price,
            unit_price,
            quantity,
            size: None,
            color: None,
            line_total: unit_price * Decimal::from(quantity),
        }
    }

    #[test]
    fn test_compute_subtotal_uses_sale_price() {
        // Two lines: {price 500, qty 2} and {salePrice 300 (price 500), qty 1}
        let items = vec![view("500", None, 2), view("500", Some("300"), 1)];
        assert_eq!(compute_subtotal(&items), dec("1300"));
    }

    #[test]
    fn test_compute_subtotal_empty_cart() {
        assert_eq!(compute_subtotal(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_free_shipping_boundary() {
        let threshold = dec("1000");

        assert!(!free_shipping_eligible(dec("999"), threshold));
        assert_eq!(remaining_for_free_shipping(dec("999"), threshold), dec("1"));

        assert!(free_shipping_eligible(dec("1000"), threshold));
        assert_eq!(
            remaining_for_free_shipping(dec("1000"), threshold),
            Decimal::ZERO
        );

        assert!(free_shipping_eligible(dec("1500"), threshold));
        assert_eq!(
            remaining_for_free_shipping(dec("1500"), threshold),
            Decimal::ZERO
        );
    }
}
