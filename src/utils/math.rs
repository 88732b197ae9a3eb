/// Round to the nearest integer, ties away from zero (`2.5 -> 3`, `-2.5 -> -3`).
pub fn round_half_away_from_zero(value: f64) -> i64 {
    value.round() as i64
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Weighted arithmetic mean of `(value, weight)` pairs.
///
/// Returns `None` for an empty input. Weights are relative importance and do
/// not need to sum to one; when they sum to zero the divisor is one.
pub fn weighted_mean(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.is_empty() {
        return None;
    }

    let weighted_sum: f64 = pairs.iter().map(|(value, weight)| value * weight).sum();
    let total_weight: f64 = pairs.iter().map(|(_, weight)| weight).sum();
    let divisor = if total_weight == 0.0 { 1.0 } else { total_weight };

    Some(weighted_sum / divisor)
}
