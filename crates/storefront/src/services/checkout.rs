//! Order placement pipeline and order lifecycle.
//!
//! `place_order` converts the caller's persisted cart into an order inside
//! one transaction: snapshot the cart with live price/stock, check stock,
//! re-validate any coupon with its row locked, insert the order and its
//! line items with snapshotted prices, conditionally decrement stock,
//! record the coupon redemption, and clear the cart. Any failure rolls the
//! whole unit back - no order row, no stock change, no usage charge.
//!
//! Status transitions go through `update_status`, which locks the order row
//! and enforces the state machine before writing; cancellation restocks the
//! order's line items in the same transaction.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use littlewear_core::{CouponKind, Identity, OrderId, OrderStatus, effective_price, line_total};

use crate::config::ShippingConfig;
use crate::db::{CartRepository, CouponRepository, OrderRepository, RepositoryError};
use crate::db::orders::{CartSnapshotRow, NewOrder};
use crate::error::{AppError, Result};
use crate::models::{Address, Coupon, OrderWithItems};
use crate::services::cart::free_shipping_eligible;
use crate::services::catalog::CatalogCache;
use crate::services::coupons::{RejectionReason, check_coupon, compute_discount};

/// Checkout input, as accepted by `POST /api/orders`.
///
/// Note what is absent: items and prices. The order is built entirely from
/// the caller's persisted cart and the server-held catalog; client-supplied
/// prices are never trusted.
#[derive(Debug, Clone)]
pub struct PlaceOrderInput {
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
    pub payment_method: String,
    pub coupon_code: Option<String>,
    pub notes: Option<String>,
}

/// Shipping cost for a subtotal under the configured policy.
fn shipping_cost_for(subtotal: Decimal, shipping: &ShippingConfig) -> Decimal {
    if free_shipping_eligible(subtotal, shipping.free_shipping_threshold) {
        Decimal::ZERO
    } else {
        shipping.flat_fee
    }
}

/// `subtotal - discount + shipping`, with the discounted goods amount
/// clamped at zero so a degenerate discount can't go negative.
fn compute_total(subtotal: Decimal, discount: Decimal, shipping_cost: Decimal) -> Decimal {
    (subtotal - discount).max(Decimal::ZERO) + shipping_cost
}

/// Order placement and lifecycle service.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    shipping: ShippingConfig,
    catalog: &'a CatalogCache,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        shipping: ShippingConfig,
        catalog: &'a CatalogCache,
    ) -> Self {
        Self {
            pool,
            shipping,
            catalog,
        }
    }

    /// Place an order from the caller's cart.
    ///
    /// # Errors
    ///
    /// - [`AppError::Unauthorized`] for anonymous identities
    /// - [`AppError::Validation`] for an empty cart or blank payment method
    /// - [`AppError::InsufficientStock`] when any line exceeds stock
    /// - [`AppError::InvalidCoupon`] when a supplied code fails re-validation
    ///
    /// All failures leave no persisted side effects.
    pub async fn place_order(
        &self,
        identity: &Identity,
        input: &PlaceOrderInput,
    ) -> Result<OrderWithItems> {
        let user_id = identity
            .user_id()
            .ok_or_else(|| AppError::Unauthorized("orders require a signed-in user".to_string()))?;

        if input.payment_method.trim().is_empty() {
            return Err(AppError::Validation("payment method is required".to_string()));
        }

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        // Step 1: one consistent read of the cart with live price and stock.
        // Every later number derives from this snapshot.
        let snapshot = OrderRepository::snapshot_cart(&mut tx, identity.key()).await?;
        if snapshot.is_empty() {
            return Err(AppError::Validation("cart is empty".to_string()));
        }

        // Step 2: fail the whole order on the first short line.
        for line in &snapshot {
            if line.stock < line.quantity {
                return Err(AppError::InsufficientStock {
                    product_id: line.product_id,
                    requested: line.quantity,
                    available: line.stock,
                });
            }
        }

        // Step 3: subtotal from the snapshot, not a second price fetch.
        let subtotal: Decimal = snapshot
            .iter()
            .map(|line| line_total(line.price, line.sale_price, line.quantity))
            .sum();

        // Steps 4-5: coupon re-validation under a row lock, then shipping.
        let mut discount = Decimal::ZERO;
        let mut shipping_cost = shipping_cost_for(subtotal, &self.shipping);
        let mut applied_coupon: Option<Coupon> = None;

        if let Some(code) = input.coupon_code.as_deref() {
            let coupon = CouponRepository::lock_by_code(&mut tx, code)
                .await?
                .ok_or(AppError::InvalidCoupon(RejectionReason::NotFound))?;

            let user_usages =
                CouponRepository::count_user_usages_in(&mut tx, coupon.id, user_id).await?;
            let cart_products: Vec<_> = snapshot
                .iter()
                .map(|line| (line.product_id, line.category_id))
                .collect();

            check_coupon(&coupon, Utc::now(), subtotal, user_usages, &cart_products)
                .map_err(AppError::InvalidCoupon)?;

            if coupon.kind == CouponKind::FreeShipping {
                // The benefit is the waived fee; nothing comes off the goods.
                shipping_cost = Decimal::ZERO;
            } else {
                discount = compute_discount(&coupon, subtotal, shipping_cost);
            }

            applied_coupon = Some(coupon);
        }

        // Step 6: totals, clamped.
        let total_amount = compute_total(subtotal, discount, shipping_cost);

        // Steps 7-8: order row, then line items with snapshotted prices.
        let new_order = NewOrder {
            reference: Uuid::new_v4(),
            user_id,
            payment_method: &input.payment_method,
            subtotal,
            discount,
            shipping_cost,
            total_amount,
            coupon_code: applied_coupon.as_ref().map(|c| c.code.as_str()),
            shipping_address: &input.shipping_address,
            billing_address: input.billing_address.as_ref(),
            notes: input.notes.as_deref(),
        };
        let order = OrderRepository::insert_order(&mut tx, &new_order).await?;

        let mut items = Vec::with_capacity(snapshot.len());
        for line in &snapshot {
            let price = effective_price(line.price, line.sale_price);
            let item = OrderRepository::insert_item(&mut tx, order.id, line, price).await?;
            items.push(item);
        }

        // Step 9: conditional decrement; a concurrent order may have taken
        // the units since the snapshot, so re-check via affected rows.
        // Rows are locked in product-id order so two multi-line orders
        // cannot deadlock on each other.
        let mut decrements: Vec<&CartSnapshotRow> = snapshot.iter().collect();
        decrements.sort_by_key(|line| line.product_id.as_i32());
        for line in decrements {
            let decremented =
                OrderRepository::decrement_stock(&mut tx, line.product_id, line.quantity).await?;
            if !decremented {
                let available = OrderRepository::get_stock(&mut tx, line.product_id)
                    .await?
                    .unwrap_or(0);
                return Err(AppError::InsufficientStock {
                    product_id: line.product_id,
                    requested: line.quantity,
                    available,
                });
            }
        }

        // Step 10: charge the redemption only now that the order exists.
        if let Some(coupon) = &applied_coupon {
            CouponRepository::record_usage(&mut tx, coupon.id, user_id, order.id).await?;
        }

        // Step 11: the cart clear commits or rolls back with the order.
        CartRepository::clear_in(&mut tx, identity.key()).await?;

        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(
            order_id = %order.id,
            reference = %order.reference,
            user_id = %user_id,
            total = %order.total_amount,
            "order placed"
        );

        // Stock changed; stale detail snapshots must go.
        for slug in snapshot.iter().map(|line| line.product_slug.as_str()) {
            self.catalog.invalidate(slug).await;
        }

        Ok(OrderWithItems { order, items })
    }

    /// Apply an admin-triggered status transition.
    ///
    /// The order row is locked while the transition is checked and written,
    /// so concurrent updates serialize and cannot skip a state. Cancelling
    /// restocks the order's line items in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for an unknown order and
    /// [`AppError::InvalidTransition`] when the state machine forbids the move.
    pub async fn update_status(
        &self,
        order_id: OrderId,
        new_status: OrderStatus,
    ) -> Result<OrderWithItems> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let current = OrderRepository::get_status_for_update(&mut tx, order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;

        if !current.can_transition_to(new_status) {
            return Err(AppError::InvalidTransition {
                from: current,
                to: new_status,
            });
        }

        OrderRepository::set_status(&mut tx, order_id, new_status).await?;

        let restocked_slugs = if new_status == OrderStatus::Cancelled {
            OrderRepository::restock_items(&mut tx, order_id).await?;
            OrderRepository::item_slugs(&mut tx, order_id).await?
        } else {
            Vec::new()
        };

        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(
            order_id = %order_id,
            from = %current,
            to = %new_status,
            "order status updated"
        );

        for slug in &restocked_slugs {
            self.catalog.invalidate(slug).await;
        }

        self.get(order_id).await
    }

    /// Get one order with items.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for an unknown order.
    pub async fn get(&self, order_id: OrderId) -> Result<OrderWithItems> {
        OrderRepository::new(self.pool)
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn policy() -> ShippingConfig {
        ShippingConfig {
            free_shipping_threshold: dec("1000"),
            flat_fee: dec("50"),
        }
    }

    #[test]
    fn test_shipping_cost_below_threshold() {
        assert_eq!(shipping_cost_for(dec("999"), &policy()), dec("50"));
    }

    #[test]
    fn test_shipping_cost_at_threshold() {
        assert_eq!(shipping_cost_for(dec("1000"), &policy()), Decimal::ZERO);
    }

    #[test]
    fn test_total_simple() {
        assert_eq!(compute_total(dec("1300"), dec("130"), dec("0")), dec("1170"));
        assert_eq!(compute_total(dec("500"), dec("0"), dec("50")), dec("550"));
    }

    #[test]
    fn test_total_clamps_degenerate_discount() {
        // Discount exceeds subtotal: goods clamp to zero, shipping still owed
        assert_eq!(compute_total(dec("100"), dec("250"), dec("50")), dec("50"));
        assert_eq!(compute_total(dec("100"), dec("250"), dec("0")), Decimal::ZERO);
    }
}
