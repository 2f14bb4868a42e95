//! Level Formula
//!
//! `level = floor(xp / LEVEL_XP_UNIT) + 1`, applied identically by every
//! operation that touches XP.

use serde::{Deserialize, Serialize};

use crate::types::LEVEL_XP_UNIT;

/// Position of the learner inside their current level
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
    pub current: u64,
    pub required: u64,
    pub percentage: f64,
}

pub fn level_for_xp(xp: u64) -> u32 {
    let level = xp / LEVEL_XP_UNIT + 1;
    u32::try_from(level).unwrap_or(u32::MAX)
}

pub fn xp_to_next_level(xp: u64) -> LevelProgress {
    let current = xp % LEVEL_XP_UNIT;
    LevelProgress {
        current,
        required: LEVEL_XP_UNIT,
        percentage: current as f64 / LEVEL_XP_UNIT as f64 * 100.0,
    }
}
