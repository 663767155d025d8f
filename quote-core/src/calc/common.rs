//! Shared arithmetic helpers for the totals pipeline.

use rust_decimal::Decimal;

/// Rounds a monetary value to two decimal places, half-up (away from zero
/// at the midpoint). Applied to every derived stage of the totals pipeline
/// so exported figures never show sub-cent noise.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use quote_core::calc::common::round_money;
///
/// assert_eq!(round_money(dec!(1234.455)), dec!(1234.46));
/// assert_eq!(round_money(dec!(1234.454)), dec!(1234.45));
/// assert_eq!(round_money(dec!(-10.005)), dec!(-10.01));
/// ```
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Converts a percentage (e.g. `7.5`) into its multiplier (`0.075`).
pub fn percent(value: Decimal) -> Decimal {
    value / Decimal::ONE_HUNDRED
}
