//! Review model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use littlewear_core::{ProductId, ReviewId};

/// A product review.
///
/// A user may review the same product more than once; there is no
/// uniqueness constraint on (`user_id`, `product_id`).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: String,
    pub rating: i32,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
