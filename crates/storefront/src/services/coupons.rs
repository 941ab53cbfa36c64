//! Coupon validator.
//!
//! Validation is read-only: it never touches usage counters. Counters move
//! only inside the order placement transaction, which re-runs these same
//! checks with the coupon row locked (see [`crate::services::checkout`]),
//! so abandoned checkouts are never charged a redemption.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use littlewear_core::{CategoryId, CouponKind, Identity, ProductId, round_money};

use crate::db::{CartRepository, CouponRepository};
use crate::error::Result;
use crate::models::Coupon;

/// Why a coupon was rejected. `code()` is the machine-readable form
/// surfaced to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    /// Unknown code, or the coupon has been deactivated.
    NotFound,
    /// Outside the validity window.
    Expired,
    /// Order amount below the coupon's minimum.
    BelowMinimum,
    /// Global usage limit reached.
    Exhausted,
    /// This identity has already redeemed it `user_limit` times.
    UserLimitReached,
    /// The cart contains items outside the coupon's allow-list.
    NotApplicable,
}

impl RejectionReason {
    /// The machine-readable reason code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Expired => "EXPIRED",
            Self::BelowMinimum => "BELOW_MINIMUM",
            Self::Exhausted => "EXHAUSTED",
            Self::UserLimitReached => "USER_LIMIT_REACHED",
            Self::NotApplicable => "NOT_APPLICABLE",
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            Self::NotFound => "coupon not found",
            Self::Expired => "coupon has expired",
            Self::BelowMinimum => "order amount is below the coupon minimum",
            Self::Exhausted => "coupon usage limit reached",
            Self::UserLimitReached => "you have already used this coupon",
            Self::NotApplicable => "coupon does not apply to these items",
        };
        f.write_str(message)
    }
}

/// Result of validating a coupon against an order amount.
#[derive(Debug, Clone)]
pub enum CouponOutcome {
    Valid {
        coupon: Coupon,
        discount_amount: Decimal,
    },
    Invalid {
        reason: RejectionReason,
    },
}

/// Run the ordered checks from the coupon contract; first failure wins.
///
/// Pure so the standalone validate endpoint and the placement transaction
/// apply identical rules.
pub(crate) fn check_coupon(
    coupon: &Coupon,
    now: DateTime<Utc>,
    order_amount: Decimal,
    user_usages: i64,
    cart_products: &[(ProductId, Option<CategoryId>)],
) -> std::result::Result<(), RejectionReason> {
    if !coupon.is_active {
        return Err(RejectionReason::NotFound);
    }
    if now < coupon.starts_at || now > coupon.ends_at {
        return Err(RejectionReason::Expired);
    }
    if let Some(minimum) = coupon.minimum_amount
        && order_amount < minimum
    {
        return Err(RejectionReason::BelowMinimum);
    }
    if !coupon.has_remaining_uses() {
        return Err(RejectionReason::Exhausted);
    }
    if user_usages >= i64::from(coupon.user_limit) {
        return Err(RejectionReason::UserLimitReached);
    }
    if coupon.has_allow_list() && !cart_products.iter().all(|p| allows(coupon, *p)) {
        return Err(RejectionReason::NotApplicable);
    }

    Ok(())
}

/// Whether one cart product is inside the coupon's allow-list.
fn allows(coupon: &Coupon, (product_id, category_id): (ProductId, Option<CategoryId>)) -> bool {
    coupon.product_ids.contains(&product_id.as_i32())
        || category_id.is_some_and(|c| coupon.category_ids.contains(&c.as_i32()))
}

/// The discount a valid coupon grants on `order_amount`.
///
/// `shipping_cost` is caller-supplied; the validator doesn't know shipping
/// policy, and `free_shipping` coupons discount exactly that amount.
#[must_use]
pub fn compute_discount(coupon: &Coupon, order_amount: Decimal, shipping_cost: Decimal) -> Decimal {
    match coupon.kind {
        CouponKind::Percentage => {
            let discount = round_money(order_amount * coupon.value / Decimal::from(100));
            coupon
                .maximum_discount
                .map_or(discount, |cap| discount.min(cap))
        }
        CouponKind::Fixed => coupon.value.min(order_amount),
        CouponKind::FreeShipping => shipping_cost,
    }
}

/// The coupon validator service.
pub struct CouponService<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponService<'a> {
    /// Create a new coupon service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Validate `code` for this identity at `order_amount`.
    ///
    /// Never mutates usage counters.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::AppError::Database`] if a lookup fails; a
    /// coupon that merely fails its checks comes back as
    /// [`CouponOutcome::Invalid`], not an error.
    pub async fn validate(
        &self,
        code: &str,
        identity: &Identity,
        order_amount: Decimal,
        shipping_cost: Decimal,
    ) -> Result<CouponOutcome> {
        let repo = CouponRepository::new(self.pool);

        let Some(coupon) = repo.get_by_code(code).await? else {
            return Ok(CouponOutcome::Invalid {
                reason: RejectionReason::NotFound,
            });
        };

        let user_usages = repo.count_user_usages(coupon.id, identity.key()).await?;

        let cart_products = if coupon.has_allow_list() {
            CartRepository::new(self.pool)
                .list_product_categories(identity.key())
                .await?
        } else {
            Vec::new()
        };

        match check_coupon(&coupon, Utc::now(), order_amount, user_usages, &cart_products) {
            Ok(()) => {
                let discount_amount = compute_discount(&coupon, order_amount, shipping_cost);
                Ok(CouponOutcome::Valid {
                    coupon,
                    discount_amount,
                })
            }
            Err(reason) => Ok(CouponOutcome::Invalid { reason }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use littlewear_core::CouponId;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn coupon(kind: CouponKind, value: &str) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: CouponId::new(1),
            code: "WELCOME10".to_string(),
            kind,
            value: dec(value),
            minimum_amount: None,
            maximum_discount: None,
            usage_limit: None,
            usage_count: 0,
            user_limit: 1,
            starts_at: now - Duration::days(1),
            ends_at: now + Duration::days(1),
            is_active: true,
            category_ids: vec![],
            product_ids: vec![],
            created_at: now,
        }
    }

    #[test]
    fn test_percentage_discount() {
        let c = coupon(CouponKind::Percentage, "10");
        assert_eq!(compute_discount(&c, dec("1300"), Decimal::ZERO), dec("130.00"));
    }

    #[test]
    fn test_percentage_discount_capped() {
        let mut c = coupon(CouponKind::Percentage, "10");
        c.maximum_discount = Some(dec("100"));
        assert_eq!(compute_discount(&c, dec("1300"), Decimal::ZERO), dec("100"));
    }

    #[test]
    fn test_fixed_discount_clamped_to_order() {
        let c = coupon(CouponKind::Fixed, "200");
        assert_eq!(compute_discount(&c, dec("150"), Decimal::ZERO), dec("150"));
        assert_eq!(compute_discount(&c, dec("500"), Decimal::ZERO), dec("200"));
    }

    #[test]
    fn test_free_shipping_discount_is_shipping_cost() {
        let c = coupon(CouponKind::FreeShipping, "0");
        assert_eq!(compute_discount(&c, dec("500"), dec("50")), dec("50"));
    }

    #[test]
    fn test_check_inactive_reads_as_not_found() {
        let mut c = coupon(CouponKind::Fixed, "10");
        c.is_active = false;
        assert_eq!(
            check_coupon(&c, Utc::now(), dec("100"), 0, &[]),
            Err(RejectionReason::NotFound)
        );
    }

    #[test]
    fn test_check_window() {
        let mut c = coupon(CouponKind::Fixed, "10");
        c.ends_at = Utc::now() - Duration::hours(1);
        assert_eq!(
            check_coupon(&c, Utc::now(), dec("100"), 0, &[]),
            Err(RejectionReason::Expired)
        );
    }

    #[test]
    fn test_check_minimum_boundary() {
        let mut c = coupon(CouponKind::Fixed, "10");
        c.minimum_amount = Some(dec("100"));
        assert_eq!(
            check_coupon(&c, Utc::now(), dec("99.99"), 0, &[]),
            Err(RejectionReason::BelowMinimum)
        );
        assert_eq!(check_coupon(&c, Utc::now(), dec("100"), 0, &[]), Ok(()));
    }

    #[test]
    fn test_check_exhausted() {
        let mut c = coupon(CouponKind::Fixed, "10");
        c.usage_limit = Some(5);
        c.usage_count = 5;
        assert_eq!(
            check_coupon(&c, Utc::now(), dec("100"), 0, &[]),
            Err(RejectionReason::Exhausted)
        );
    }

    #[test]
    fn test_check_user_limit() {
        let c = coupon(CouponKind::Fixed, "10");
        assert_eq!(
            check_coupon(&c, Utc::now(), dec("100"), 1, &[]),
            Err(RejectionReason::UserLimitReached)
        );
    }

    #[test]
    fn test_check_order_is_short_circuit() {
        // Expired AND below minimum: the window check fires first
        let mut c = coupon(CouponKind::Fixed, "10");
        c.ends_at = Utc::now() - Duration::hours(1);
        c.minimum_amount = Some(dec("1000"));
        assert_eq!(
            check_coupon(&c, Utc::now(), dec("1"), 0, &[]),
            Err(RejectionReason::Expired)
        );
    }

    #[test]
    fn test_check_allow_list() {
        let mut c = coupon(CouponKind::Fixed, "10");
        c.product_ids = vec![7];
        c.category_ids = vec![3];

        let in_list = (ProductId::new(7), None);
        let in_category = (ProductId::new(8), Some(CategoryId::new(3)));
        let outside = (ProductId::new(9), Some(CategoryId::new(4)));

        assert_eq!(
            check_coupon(&c, Utc::now(), dec("100"), 0, &[in_list, in_category]),
            Ok(())
        );
        assert_eq!(
            check_coupon(&c, Utc::now(), dec("100"), 0, &[in_list, outside]),
            Err(RejectionReason::NotApplicable)
        );
    }
}
