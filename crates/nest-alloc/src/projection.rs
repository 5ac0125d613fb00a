//! nest-alloc: compound-growth projections
//!
//! Rates are fractions (0.12 = 12%). Contributions are made at period end.

/// Future value of `payment` per period for `periods` periods at `rate`.
///
/// Degenerates to `payment × periods` when either the rate or the payment is
/// not positive.
pub fn fv_annuity(payment: f64, rate: f64, periods: u32) -> f64 {
    if rate > 0.0 && payment > 0.0 {
        payment * ((1.0 + rate).powi(exponent(periods)) - 1.0) / rate
    } else {
        payment * periods as f64
    }
}

/// Future value of a single amount compounded annually.
pub fn fv_lump_sum(principal: f64, annual_rate: f64, years: u32) -> f64 {
    principal * (1.0 + annual_rate).powi(exponent(years))
}

fn exponent(n: u32) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// Monthly contributions compounded monthly plus a lump sum compounded
/// yearly, both at `annual_rate`, over `years`.
pub fn projected_value(monthly: f64, lump_sum: f64, annual_rate: f64, years: u32) -> f64 {
    fv_annuity(monthly, annual_rate / 12.0, years.saturating_mul(12))
        + fv_lump_sum(lump_sum, annual_rate, years)
}
