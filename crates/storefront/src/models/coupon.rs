//! Coupon model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use littlewear_core::{CouponId, CouponKind};

/// A discount coupon.
///
/// `usage_count` is maintained alongside `coupon_usages` rows; the usages
/// table is the source of truth for per-user counts.
#[derive(Debug, Clone, Serialize)]
pub struct Coupon {
    pub id: CouponId,
    pub code: String,
    pub kind: CouponKind,
    pub value: Decimal,
    pub minimum_amount: Option<Decimal>,
    pub maximum_discount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub usage_count: i32,
    pub user_limit: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
    /// Category allow-list; empty applies to all.
    pub category_ids: Vec<i32>,
    /// Product allow-list; empty applies to all.
    pub product_ids: Vec<i32>,
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    /// Whether the coupon is live at `now` (active flag and validity window).
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now >= self.starts_at && now <= self.ends_at
    }

    /// Whether global usage has room for one more redemption.
    #[must_use]
    pub fn has_remaining_uses(&self) -> bool {
        self.usage_limit.is_none_or(|limit| self.usage_count < limit)
    }

    /// Whether the coupon is restricted to specific products/categories.
    #[must_use]
    pub fn has_allow_list(&self) -> bool {
        !self.category_ids.is_empty() || !self.product_ids.is_empty()
    }
}
