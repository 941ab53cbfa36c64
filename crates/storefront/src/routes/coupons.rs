//! Coupon route handlers.

use axum::{Json, extract::State, response::IntoResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::ResolvedIdentity;
use crate::services::cart::free_shipping_eligible;
use crate::services::{CouponOutcome, CouponService};
use crate::state::AppState;

/// Coupon validation body.
#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub code: String,
    pub order_amount: Decimal,
}

/// Validate a coupon code against an order amount.
///
/// Always responds 200; an inapplicable coupon is a `valid: false` payload
/// with a machine-readable reason, not an error. Usage counters are never
/// touched here.
#[instrument(skip_all, fields(code = %request.code))]
pub async fn validate(
    State(state): State<AppState>,
    ResolvedIdentity(identity): ResolvedIdentity,
    Json(request): Json<ValidateRequest>,
) -> Result<impl IntoResponse> {
    // The validator doesn't know shipping; feed it the cost this order
    // would pay under the configured policy.
    let shipping = &state.config().shipping;
    let shipping_cost = if free_shipping_eligible(request.order_amount, shipping.free_shipping_threshold)
    {
        Decimal::ZERO
    } else {
        shipping.flat_fee
    };

    let outcome = CouponService::new(state.pool())
        .validate(&request.code, &identity, request.order_amount, shipping_cost)
        .await?;

    let body = match outcome {
        CouponOutcome::Valid {
            discount_amount, ..
        } => json!({
            "valid": true,
            "discount_amount": discount_amount,
        }),
        CouponOutcome::Invalid { reason } => json!({
            "valid": false,
            "reason": reason.code(),
            "message": reason.to_string(),
        }),
    };

    Ok(Json(body))
}
