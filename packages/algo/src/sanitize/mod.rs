//! Data Sanitization
//!
//! Numerical stability utilities for probabilities coming from stored or
//! client-supplied skill records.

use crate::types::{BktParams, EPSILON};

/// Whether any value is NaN or infinite
pub fn has_invalid_values(arr: &[f64]) -> bool {
    arr.iter().any(|&x| x.is_nan() || x.is_infinite())
}

/// Clamp into [0, 1]; NaN becomes 0
pub fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() {
        return 0.0;
    }
    p.clamp(0.0, 1.0)
}

/// Clamp every BKT parameter into [0, 1]
pub fn sanitize_bkt_params(params: BktParams) -> BktParams {
    BktParams {
        p_learn: clamp_probability(params.p_learn),
        p_guess: clamp_probability(params.p_guess),
        p_slip: clamp_probability(params.p_slip),
    }
}

/// Divide, falling back to `fallback` when the denominator vanishes
pub fn safe_ratio(numerator: f64, denominator: f64, fallback: f64) -> f64 {
    if denominator.abs() < EPSILON || has_invalid_values(&[numerator, denominator]) {
        fallback
    } else {
        numerator / denominator
    }
}
