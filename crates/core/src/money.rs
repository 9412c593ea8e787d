//! Monetary amounts and rounding.
//!
//! All monetary values in the domain are `rust_decimal::Decimal`, rounded to
//! two decimal places whenever they are derived (line totals, subtotals,
//! grand totals). Quantities are also `Decimal` since fractional quantities
//! are allowed.

use rust_decimal::Decimal;

/// Number of decimal places monetary amounts are rounded to.
pub const MONEY_SCALE: u32 = 2;

/// Round a monetary amount to [`MONEY_SCALE`] decimal places.
///
/// Uses the default midpoint strategy (banker's rounding).
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp(MONEY_SCALE)
}
