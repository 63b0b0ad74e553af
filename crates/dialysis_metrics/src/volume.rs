//! Fixed-point volume arithmetic.
//!
//! Totals and means are computed over integer microliters so that the result
//! does not depend on the order the volumes are added in.

/// Microliters per milliliter; volumes are resolved to 0.001 mL.
pub const MICROLITERS_PER_ML: i64 = 1000;

pub fn ml_to_microliters(ml: f64) -> i64 {
    (ml * MICROLITERS_PER_ML as f64).round() as i64
}

pub fn microliters_to_ml(microliters: i64) -> f64 {
    microliters as f64 / MICROLITERS_PER_ML as f64
}

/// Mean of `total_microliters` over `count` items, in whole mL, halves away
/// from zero. Zero when `count` is zero.
pub fn rounded_mean_ml(total_microliters: i64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let total = i128::from(total_microliters);
    let denom = count as i128 * i128::from(MICROLITERS_PER_ML);
    let whole = (2 * total.abs() + denom) / (2 * denom);
    let signed = if total < 0 { -whole } else { whole };
    // no "-0" in output
    if signed == 0 { 0.0 } else { signed as f64 }
}
