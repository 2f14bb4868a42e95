//! Onboarding
//!
//! Sets the grade, seeds skill estimates from the placement quiz and grants
//! the welcome bonus. Happens once per profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AlgoError;
use crate::types::{LearnerProfile, SkillMastery, MAX_GRADE_LEVEL, WELCOME_BONUS_XP};

/// The skill the placement quiz measures
pub const PLACEMENT_SKILL: &str = "addition";

/// Grade from which multiplication and division are seeded
pub const MULTIPLICATION_GRADE: u8 = 2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlacementResult {
    pub correct: u32,
    pub total: u32,
}

impl PlacementResult {
    /// Fraction answered correctly, 0 for an empty quiz
    pub fn estimate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.correct.min(self.total)) / f64::from(self.total)
        }
    }
}

/// Skills a new learner starts with: the placement skill at its estimate,
/// every other skill untested at zero
pub fn initial_skills(
    grade_level: u8,
    placement: PlacementResult,
    now: DateTime<Utc>,
) -> Vec<SkillMastery> {
    let mut skills = vec![
        SkillMastery::seeded(PLACEMENT_SKILL, placement.estimate(), placement.total, now),
        SkillMastery::seeded("subtraction", 0.0, 0, now),
    ];
    if grade_level >= MULTIPLICATION_GRADE {
        skills.push(SkillMastery::seeded("multiplication", 0.0, 0, now));
        skills.push(SkillMastery::seeded("division", 0.0, 0, now));
    }
    skills
}

pub fn complete_onboarding(
    profile: &LearnerProfile,
    grade_level: u8,
    placement: PlacementResult,
    now: DateTime<Utc>,
) -> Result<LearnerProfile, AlgoError> {
    if profile.onboarding_completed {
        return Err(AlgoError::AlreadyOnboarded);
    }
    if grade_level > MAX_GRADE_LEVEL {
        return Err(AlgoError::InvalidArgument(format!(
            "gradeLevel must be between 0 and {MAX_GRADE_LEVEL}, got {grade_level}"
        )));
    }
    if placement.correct > placement.total {
        return Err(AlgoError::InvalidArgument(
            "placement correct count exceeds total".to_string(),
        ));
    }

    let mut next = profile.clone();
    next.grade_level = grade_level;
    for skill in initial_skills(grade_level, placement, now) {
        // Skills practiced before onboarding keep their history.
        next.skills.entry(skill.skill_id.clone()).or_insert(skill);
    }
    next.xp = next.xp.saturating_add(WELCOME_BONUS_XP);
    next.refresh_level();
    next.onboarding_completed = true;
    Ok(next)
}

/// Explicit learner/parent grade change; progress is untouched
pub fn change_grade_level(profile: &LearnerProfile, grade_level: u8) -> Result<LearnerProfile, AlgoError> {
    if grade_level > MAX_GRADE_LEVEL {
        return Err(AlgoError::InvalidArgument(format!(
            "gradeLevel must be between 0 and {MAX_GRADE_LEVEL}, got {grade_level}"
        )));
    }
    let mut next = profile.clone();
    next.grade_level = grade_level;
    Ok(next)
}
