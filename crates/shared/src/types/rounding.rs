//! Decimal rounding rules for cost figures.
//!
//! CRITICAL: Never use floating-point for cost calculations.
//! All amounts are `rust_decimal::Decimal`; these helpers pin the scale
//! used throughout the engine.

use rust_decimal::Decimal;

/// Fractional digits kept on total prices and other money amounts.
pub const MONEY_DP: u32 = 2;

/// Fractional digits kept on unit prices.
///
/// Unit prices carry extra precision so that `unit_price * quantity`
/// stays close to the total it was derived from.
pub const UNIT_PRICE_DP: u32 = 4;

/// Rounds a money amount to 2 decimal places (banker's rounding).
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp(MONEY_DP)
}

/// Rounds a unit price to 4 decimal places (banker's rounding).
#[must_use]
pub fn round_unit_price(value: Decimal) -> Decimal {
    value.round_dp(UNIT_PRICE_DP)
}
