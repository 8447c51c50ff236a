// Null-safe arithmetic shared by every rating formula.
//
// "Not enough data yet" is represented as `None` and flows through the
// formulas instead of surfacing as an infinity, a NaN, or a misleading zero.

/// Divide `numerator` by `denominator`, returning `None` when the denominator
/// is zero.
pub fn divide(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    Some(numerator / denominator)
}

/// Raise `base` to `exponent`, passing a missing base through as `None`.
pub fn power(base: Option<f64>, exponent: f64) -> Option<f64> {
    base.map(|b| b.powf(exponent))
}

/// Round `value` to `places` decimal places (half away from zero).
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}
