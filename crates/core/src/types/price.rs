//! Decimal money arithmetic for order totals.
//!
//! Prices are `rust_decimal::Decimal` values in the shop currency's standard
//! unit (dollars, not cents) and persist as `NUMERIC(12, 2)`. A price with more
//! fractional digits than the column keeps would be rounded by the database,
//! leaving the stored amount out of step with its line items, so such prices
//! are rejected up front instead.

use rust_decimal::Decimal;
use thiserror::Error;

/// Maximum number of fractional digits a stored price keeps.
pub const MAX_PRICE_SCALE: u32 = 2;

/// Largest value a `NUMERIC(12, 2)` column holds: `9999999999.99`.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, MAX_PRICE_SCALE);

/// Reasons a price or quantity cannot take part in an order total.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("price must not be negative (got {0})")]
    Negative(Decimal),
    #[error("price must have at most {MAX_PRICE_SCALE} decimal places (got {0})")]
    TooPrecise(Decimal),
    #[error("quantity must be at least 1 (got {0})")]
    NonPositiveQuantity(i32),
    #[error("amount must not exceed {MAX_AMOUNT}")]
    OutOfRange,
}

/// Check that a unit price is non-negative and fits the stored column.
///
/// Trailing zeros do not count against the scale, so `10.000` is accepted.
///
/// # Errors
///
/// Returns `PriceError::Negative`, `PriceError::TooPrecise` or
/// `PriceError::OutOfRange`.
pub fn validate_unit_price(price: Decimal) -> Result<(), PriceError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(PriceError::Negative(price));
    }
    if price.normalize().scale() > MAX_PRICE_SCALE {
        return Err(PriceError::TooPrecise(price));
    }
    if price > MAX_AMOUNT {
        return Err(PriceError::OutOfRange);
    }
    Ok(())
}

/// Compute `price * quantity` for one line.
///
/// # Errors
///
/// Returns `PriceError::NonPositiveQuantity` for a quantity below 1, a price
/// validation error, or `PriceError::OutOfRange` when the product does not
/// fit the stored column.
pub fn line_total(price: Decimal, quantity: i32) -> Result<Decimal, PriceError> {
    if quantity < 1 {
        return Err(PriceError::NonPositiveQuantity(quantity));
    }
    validate_unit_price(price)?;
    price
        .checked_mul(Decimal::from(quantity))
        .filter(|total| *total <= MAX_AMOUNT)
        .ok_or(PriceError::OutOfRange)
}

/// Sum the line totals of `(price, quantity)` pairs.
///
/// An empty iterator sums to zero.
///
/// # Errors
///
/// Returns the first line error encountered, or `PriceError::OutOfRange` once
/// the running total exceeds [`MAX_AMOUNT`].
pub fn order_total<I>(lines: I) -> Result<Decimal, PriceError>
where
    I: IntoIterator<Item = (Decimal, i32)>,
{
    lines.into_iter().try_fold(Decimal::ZERO, |total, (price, quantity)| {
        total
            .checked_add(line_total(price, quantity)?)
            .filter(|total| *total <= MAX_AMOUNT)
            .ok_or(PriceError::OutOfRange)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dollars(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(dollars(1000), 2).unwrap(), dollars(2000));
    }

    #[test]
    fn test_order_total_sums_lines() {
        let total = order_total([(dollars(1000), 2), (dollars(250), 3), (dollars(1), 1)]).unwrap();
        assert_eq!(total, dollars(2751));
    }

    #[test]
    fn test_order_total_empty_is_zero() {
        assert_eq!(order_total(Vec::new()).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_zero_and_negative_quantities_rejected() {
        assert_eq!(
            line_total(dollars(100), 0),
            Err(PriceError::NonPositiveQuantity(0))
        );
        assert_eq!(
            line_total(dollars(100), -3),
            Err(PriceError::NonPositiveQuantity(-3))
        );
    }

    #[test]
    fn test_negative_price_rejected() {
        assert_eq!(
            validate_unit_price(dollars(-1)),
            Err(PriceError::Negative(dollars(-1)))
        );
    }

    #[test]
    fn test_free_item_allowed() {
        assert!(validate_unit_price(Decimal::ZERO).is_ok());
        assert_eq!(line_total(Decimal::ZERO, 5).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_scale() {
        assert!(validate_unit_price(Decimal::new(10_000, 3)).is_ok());
        assert!(matches!(
            validate_unit_price(Decimal::new(10_001, 3)),
            Err(PriceError::TooPrecise(_))
        ));
    }

    #[test]
    fn test_max_amount_matches_column() {
        assert_eq!(MAX_AMOUNT, "9999999999.99".parse::<Decimal>().unwrap());
        assert_eq!(MAX_AMOUNT.to_string(), "9999999999.99");
    }

    #[test]
    fn test_unit_price_bounded_by_column() {
        assert!(validate_unit_price(MAX_AMOUNT).is_ok());
        assert_eq!(
            validate_unit_price(MAX_AMOUNT + dollars(1)),
            Err(PriceError::OutOfRange)
        );
        assert_eq!(
            validate_unit_price(Decimal::MAX),
            Err(PriceError::OutOfRange)
        );
    }

    #[test]
    fn test_line_total_bounded_by_column() {
        assert_eq!(
            line_total(Decimal::new(100_000_000, 0), 100),
            Err(PriceError::OutOfRange)
        );
        assert_eq!(line_total(MAX_AMOUNT, 2), Err(PriceError::OutOfRange));
        assert_eq!(line_total(MAX_AMOUNT, 1).unwrap(), MAX_AMOUNT);
    }

    #[test]
    fn test_running_total_bounded_by_column() {
        assert_eq!(
            order_total([(MAX_AMOUNT, 1), (dollars(1), 1)]),
            Err(PriceError::OutOfRange)
        );
        assert_eq!(
            order_total([(MAX_AMOUNT - dollars(1), 1), (dollars(1), 1)]).unwrap(),
            MAX_AMOUNT
        );
    }
}
