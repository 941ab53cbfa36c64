//! Coupon repository.
//!
//! Validation-time reads go through the pool; redemption-time reads and
//! writes take an open transaction and lock the coupon row, so the
//! usage-limit checks and the usage insert can't interleave with a
//! concurrent checkout.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use littlewear_core::{CouponId, CouponKind, OrderId};

use super::RepositoryError;
use crate::models::Coupon;

const COUPON_COLUMNS: &str = "id, code, kind, value, minimum_amount, maximum_discount, \
     usage_limit, usage_count, user_limit, starts_at, ends_at, is_active, \
     category_ids, product_ids, created_at";

/// A row from the `coupons` table; `kind` is parsed into [`CouponKind`]
/// when mapping to the model.
#[derive(Debug, Clone, sqlx::FromRow)]
struct CouponRow {
    id: CouponId,
    code: String,
    kind: String,
    value: Decimal,
    minimum_amount: Option<Decimal>,
    maximum_discount: Option<Decimal>,
    usage_limit: Option<i32>,
    usage_count: i32,
    user_limit: i32,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    is_active: bool,
    category_ids: Vec<i32>,
    product_ids: Vec<i32>,
    created_at: DateTime<Utc>,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = RepositoryError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        let kind = CouponKind::from_str(&row.kind)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid coupon kind: {e}")))?;

        Ok(Self {
            id: row.id,
            code: row.code,
            kind,
            value: row.value,
            minimum_amount: row.minimum_amount,
            maximum_discount: row.maximum_discount,
            usage_limit: row.usage_limit,
            usage_count: row.usage_count,
            user_limit: row.user_limit,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            is_active: row.is_active,
            category_ids: row.category_ids,
            product_ids: row.product_ids,
            created_at: row.created_at,
        })
    }
}

/// Repository for coupons and their redemptions.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new coupon repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a coupon by its code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored kind is invalid.
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        row.map(Coupon::try_from).transpose()
    }

    /// Count this user's prior redemptions of a coupon.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_user_usages(
        &self,
        coupon_id: CouponId,
        user_id: &str,
    ) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM coupon_usages WHERE coupon_id = $1 AND user_id = $2",
        )
        .bind(coupon_id)
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Get a coupon by code with its row locked for the rest of the
    /// transaction. Concurrent redemptions of the same code serialize here.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored kind is invalid.
    pub async fn lock_by_code(
        conn: &mut PgConnection,
        code: &str,
    ) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons WHERE code = $1 FOR UPDATE"
        ))
        .bind(code)
        .fetch_optional(conn)
        .await?;

        row.map(Coupon::try_from).transpose()
    }

    /// Count this user's prior redemptions inside an open transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_user_usages_in(
        conn: &mut PgConnection,
        coupon_id: CouponId,
        user_id: &str,
    ) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM coupon_usages WHERE coupon_id = $1 AND user_id = $2",
        )
        .bind(coupon_id)
        .bind(user_id)
        .fetch_one(conn)
        .await?;

        Ok(count)
    }

    /// Record a redemption: insert the usage row and bump `usage_count`.
    ///
    /// Must run inside the placement transaction, after [`Self::lock_by_code`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either write fails.
    pub async fn record_usage(
        conn: &mut PgConnection,
        coupon_id: CouponId,
        user_id: &str,
        order_id: OrderId,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO coupon_usages (coupon_id, user_id, order_id) VALUES ($1, $2, $3)",
        )
        .bind(coupon_id)
        .bind(user_id)
        .bind(order_id)
        .execute(&mut *conn)
        .await?;

        sqlx::query("UPDATE coupons SET usage_count = usage_count + 1 WHERE id = $1")
            .bind(coupon_id)
            .execute(conn)
            .await?;

        Ok(())
    }
}
