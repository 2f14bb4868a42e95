//! Progressive Difficulty
//!
//! Maps completed practice sets to the multiplier problem generators use to
//! scale their numeric ranges. Computed in whole hundredths so equal inputs
//! give bit-identical outputs.

use crate::error::AlgoError;

/// Multiplier increase per completed set, in hundredths
pub const STEP_HUNDREDTHS: i64 = 15;

/// Multiplier ceiling, in hundredths
pub const CAP_HUNDREDTHS: i64 = 250;

pub const BASE_MULTIPLIER: f64 = 1.0;
pub const MAX_MULTIPLIER: f64 = CAP_HUNDREDTHS as f64 / 100.0;

/// `min(1.0 + sets_completed * 0.15, 2.5)`
pub fn difficulty_multiplier(sets_completed: i64) -> Result<f64, AlgoError> {
    if sets_completed < 0 {
        return Err(AlgoError::InvalidArgument(format!(
            "setsCompleted must be non-negative, got {sets_completed}"
        )));
    }
    let hundredths = sets_completed
        .saturating_mul(STEP_HUNDREDTHS)
        .saturating_add(100)
        .min(CAP_HUNDREDTHS);
    Ok(hundredths as f64 / 100.0)
}
