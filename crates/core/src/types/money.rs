//! Money helpers built on decimal arithmetic.
//!
//! All monetary values in Littlewear are [`rust_decimal::Decimal`] with two
//! decimal places of precision. These helpers centralize the rounding rule
//! and the sale-price selection so repositories and services never reimplement
//! either.

use rust_decimal::Decimal;

/// Round a monetary value to two decimal places (banker's rounding off;
/// midpoints round away from zero, matching how receipts are printed).
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// The price a buyer actually pays: the sale price when one is set,
/// otherwise the list price.
#[must_use]
pub fn effective_price(price: Decimal, sale_price: Option<Decimal>) -> Decimal {
    sale_price.unwrap_or(price)
}

/// Line total for a quantity of items at an effective price.
#[must_use]
pub fn line_total(price: Decimal, sale_price: Option<Decimal>, quantity: i32) -> Decimal {
    effective_price(price, sale_price) * Decimal::from(quantity)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_effective_price_prefers_sale() {
        assert_eq!(effective_price(dec("500.00"), Some(dec("300.00"))), dec("300.00"));
        assert_eq!(effective_price(dec("500.00"), None), dec("500.00"));
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(dec("500.00"), None, 2), dec("1000.00"));
        assert_eq!(line_total(dec("500.00"), Some(dec("300.00")), 1), dec("300.00"));
    }

    #[test]
    fn test_round_money_midpoint() {
        assert_eq!(round_money(dec("3.455")), dec("3.46"));
        assert_eq!(round_money(dec("3.4549")), dec("3.45"));
    }
}
