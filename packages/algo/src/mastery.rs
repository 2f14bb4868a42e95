//! Skill Mastery (Bayesian Knowledge Tracing)
//!
//! Each skill carries fixed guess/slip/learn parameters. After an observation
//! the mastery estimate moves to the posterior given that observation; the
//! learning transition is applied only after a correct answer, so a wrong
//! answer holds or lowers the estimate and never raises it.

use chrono::{DateTime, Utc};

use crate::sanitize::{clamp_probability, safe_ratio, sanitize_bkt_params};
use crate::types::{BktParams, SkillMastery};

/// Mastery at or above which a skill counts as mastered for achievements
pub const MASTERED_THRESHOLD: f64 = 0.9;

impl SkillMastery {
    /// A skill seen for the first time, with no evidence of mastery
    pub fn new(skill_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        let skill_id = skill_id.into();
        Self {
            skill_name: display_name_for(&skill_id),
            skill_id,
            mastery_level: 0.0,
            params: BktParams::default(),
            practice_count: 0,
            last_practiced: Some(now),
        }
    }

    /// A skill seeded from an external estimate such as a placement quiz
    pub fn seeded(
        skill_id: impl Into<String>,
        estimate: f64,
        practice_count: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            mastery_level: clamp_probability(estimate),
            practice_count,
            ..Self::new(skill_id, now)
        }
    }

    pub fn is_mastered(&self) -> bool {
        self.mastery_level >= MASTERED_THRESHOLD
    }

    /// Record one attempt on this skill
    pub fn observe(&mut self, correct: bool, now: DateTime<Utc>) {
        self.mastery_level = bkt_update(self.mastery_level, self.params, correct);
        self.practice_count = self.practice_count.saturating_add(1);
        self.last_practiced = Some(now);
    }
}

/// One BKT step from prior `p_known`
pub fn bkt_update(p_known: f64, params: BktParams, correct: bool) -> f64 {
    let prior = clamp_probability(p_known);
    let BktParams {
        p_learn,
        p_guess,
        p_slip,
    } = sanitize_bkt_params(params);

    if correct {
        let evidence = prior * (1.0 - p_slip);
        let posterior = safe_ratio(evidence, evidence + (1.0 - prior) * p_guess, prior);
        clamp_probability(posterior + (1.0 - posterior) * p_learn)
    } else {
        let evidence = prior * p_slip;
        let posterior = safe_ratio(evidence, evidence + (1.0 - prior) * (1.0 - p_guess), prior);
        clamp_probability(posterior.min(prior))
    }
}

/// "long_division" -> "Long Division"
fn display_name_for(skill_id: &str) -> String {
    skill_id
        .split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
