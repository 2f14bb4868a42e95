//! Common Types and Constants
//!
//! The learner profile aggregate and the records it owns, plus the shapes
//! exchanged with content providers.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AlgoError;
use crate::leveling::level_for_xp;

// ==================== Constants ====================

/// XP required per level
pub const LEVEL_XP_UNIT: u64 = 1000;

/// XP deducted from a problem reward for each hint used
pub const HINT_PENALTY: i64 = 5;

/// Highest supported grade (0 = kindergarten)
pub const MAX_GRADE_LEVEL: u8 = 12;

/// XP granted for finishing a lesson
pub const LESSON_XP: u64 = 100;

/// XP granted once when onboarding completes
pub const WELCOME_BONUS_XP: u64 = 100;

/// Default BKT probability of learning per opportunity
pub const DEFAULT_P_LEARN: f64 = 0.3;

/// Default BKT probability of a lucky guess
pub const DEFAULT_P_GUESS: f64 = 0.25;

/// Default BKT probability of a slip despite mastery
pub const DEFAULT_P_SLIP: f64 = 0.1;

/// Numerical stability epsilon
pub const EPSILON: f64 = 1e-10;

// ==================== Skill Mastery ====================

/// Fixed Bayesian Knowledge Tracing parameters for one skill
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BktParams {
    pub p_learn: f64,
    pub p_guess: f64,
    pub p_slip: f64,
}

impl Default for BktParams {
    fn default() -> Self {
        Self {
            p_learn: DEFAULT_P_LEARN,
            p_guess: DEFAULT_P_GUESS,
            p_slip: DEFAULT_P_SLIP,
        }
    }
}

/// Estimated proficiency of one learner on one skill
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillMastery {
    pub skill_id: String,
    pub skill_name: String,
    /// p_known: probability the skill is mastered, in [0, 1]
    pub mastery_level: f64,
    #[serde(flatten)]
    pub params: BktParams,
    pub practice_count: u32,
    pub last_practiced: Option<DateTime<Utc>>,
}

// ==================== Achievements ====================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    #[default]
    Practice,
    Mastery,
    Social,
    Special,
}

/// An unlocked achievement instance
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: AchievementCategory,
    pub xp_reward: u64,
    pub unlocked_at: DateTime<Utc>,
}

// ==================== Lessons ====================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletedLesson {
    pub lesson_id: String,
    pub completed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<u32>,
}

// ==================== Learner Profile ====================

/// Lifecycle stage of a profile
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileStage {
    Unconfigured,
    Onboarding,
    Active,
}

/// The aggregate learner state
///
/// Every field has a zero-value default so partially populated JSON from a
/// client or an older stored row still deserializes. Derived fields (`level`,
/// `accuracy_rate`) are recomputed by [`LearnerProfile::normalize`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LearnerProfile {
    pub id: String,
    pub display_name: String,
    pub grade_level: u8,
    pub xp: u64,
    pub level: u32,
    pub streak: u32,
    pub last_practice_date: Option<NaiveDate>,
    pub total_problems_completed: u64,
    pub correct_answers: u64,
    pub accuracy_rate: u32,
    pub achievements: Vec<Achievement>,
    #[serde(deserialize_with = "deserialize_skills")]
    pub skills: BTreeMap<String, SkillMastery>,
    pub completed_lessons: Vec<CompletedLesson>,
    pub completed_problems: Vec<String>,
    pub onboarding_completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Default for LearnerProfile {
    fn default() -> Self {
        Self {
            id: String::new(),
            display_name: String::new(),
            grade_level: 0,
            xp: 0,
            level: 1,
            streak: 0,
            last_practice_date: None,
            total_problems_completed: 0,
            correct_answers: 0,
            accuracy_rate: 0,
            achievements: Vec::new(),
            skills: BTreeMap::new(),
            completed_lessons: Vec::new(),
            completed_problems: Vec::new(),
            onboarding_completed: false,
            created_at: Utc::now(),
        }
    }
}

impl LearnerProfile {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            created_at: now,
            ..Self::default()
        }
    }

    pub fn has_achievement(&self, achievement_id: &str) -> bool {
        self.achievements.iter().any(|a| a.id == achievement_id)
    }

    pub fn has_completed_lesson(&self, lesson_id: &str) -> bool {
        self.completed_lessons.iter().any(|l| l.lesson_id == lesson_id)
    }

    /// Number of skills at or above `threshold` mastery
    pub fn mastered_skill_count(&self, threshold: f64) -> usize {
        self.skills
            .values()
            .filter(|s| s.mastery_level >= threshold)
            .count()
    }

    pub fn stage(&self) -> ProfileStage {
        if self.onboarding_completed {
            ProfileStage::Active
        } else if self.xp == 0 && self.total_problems_completed == 0 && self.skills.is_empty() {
            ProfileStage::Unconfigured
        } else {
            ProfileStage::Onboarding
        }
    }

    /// Recompute `level` from `xp`
    pub fn refresh_level(&mut self) {
        self.level = level_for_xp(self.xp);
    }

    /// Recompute `accuracy_rate` from the attempt counters
    pub fn refresh_accuracy(&mut self) {
        self.accuracy_rate = accuracy_rate(self.correct_answers, self.total_problems_completed);
    }

    /// Restore every derived invariant
    ///
    /// Clamps `correct_answers` to `total_problems_completed`, recomputes the
    /// derived fields, and drops repeated achievement/lesson/problem ids
    /// keeping the first occurrence.
    pub fn normalize(&mut self) {
        self.correct_answers = self.correct_answers.min(self.total_problems_completed);
        self.refresh_level();
        self.refresh_accuracy();

        let mut seen = std::collections::HashSet::new();
        self.achievements.retain(|a| seen.insert(a.id.clone()));

        let mut seen = std::collections::HashSet::new();
        self.completed_lessons
            .retain(|l| seen.insert(l.lesson_id.clone()));

        let mut seen = std::collections::HashSet::new();
        self.completed_problems.retain(|p| seen.insert(p.clone()));

        for (skill_id, skill) in self.skills.iter_mut() {
            if skill.skill_id.is_empty() {
                skill.skill_id = skill_id.clone();
            }
            skill.mastery_level = crate::sanitize::clamp_probability(skill.mastery_level);
        }
    }

    pub fn validate(&self) -> Result<(), AlgoError> {
        if self.grade_level > MAX_GRADE_LEVEL {
            return Err(AlgoError::InvalidProfile(format!(
                "gradeLevel must be between 0 and {MAX_GRADE_LEVEL}, got {}",
                self.grade_level
            )));
        }
        Ok(())
    }
}

/// `round(correct / total * 100)`, or 0 when nothing has been attempted
pub fn accuracy_rate(correct: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    ((correct.min(total) as f64 / total as f64) * 100.0).round() as u32
}

/// Skills arrive either keyed by id or as the legacy list of records.
pub fn deserialize_skills<'de, D>(deserializer: D) -> Result<BTreeMap<String, SkillMastery>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SkillsRepr {
        Map(BTreeMap<String, SkillMastery>),
        List(Vec<SkillMastery>),
    }

    let skills = match Option::<SkillsRepr>::deserialize(deserializer)? {
        None => BTreeMap::new(),
        Some(SkillsRepr::Map(map)) => map
            .into_iter()
            .map(|(id, mut skill)| {
                skill.skill_id = id.clone();
                (id, skill)
            })
            .collect(),
        Some(SkillsRepr::List(list)) => {
            let mut map = BTreeMap::new();
            for skill in list {
                map.entry(skill.skill_id.clone()).or_insert(skill);
            }
            map
        }
    };
    Ok(skills)
}

// ==================== Attempts & Content ====================

/// Outcome of one graded attempt
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttemptOutcome {
    pub skill_ids: Vec<String>,
    /// Deterministic correctness verdict, never an advisory LLM judgment
    pub correct: bool,
    pub hints_used: u32,
    pub base_xp_reward: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Hint {
    pub order: u32,
    pub content: String,
    pub cost: u32,
}

/// Problem record as produced by a content provider
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Problem {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub difficulty: u8,
    pub category: String,
    pub grade_level: u8,
    pub skills: Vec<String>,
    pub hints: Vec<Hint>,
    pub xp_reward: i64,
}

impl Problem {
    /// Build the attempt outcome for this problem; only `skills`, `id` and
    /// `xp_reward` are read.
    pub fn attempt(&self, correct: bool, hints_used: u32) -> AttemptOutcome {
        AttemptOutcome {
            skill_ids: self.skills.clone(),
            correct,
            hints_used,
            base_xp_reward: self.xp_reward,
            problem_id: Some(self.id.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_rate_rounds_and_guards_zero() {
        assert_eq!(accuracy_rate(0, 0), 0);
        assert_eq!(accuracy_rate(1, 1), 100);
        assert_eq!(accuracy_rate(2, 3), 67);
        assert_eq!(accuracy_rate(1, 3), 33);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let profile: LearnerProfile =
            serde_json::from_value(serde_json::json!({ "id": "miles", "xp": 1500 })).unwrap();
        assert_eq!(profile.id, "miles");
        assert_eq!(profile.total_problems_completed, 0);
        assert!(profile.achievements.is_empty());
        assert!(!profile.onboarding_completed);
    }

    #[test]
    fn skills_accept_legacy_list() {
        let profile: LearnerProfile = serde_json::from_value(serde_json::json!({
            "skills": [
                { "skillId": "addition", "masteryLevel": 0.5, "pLearn": 0.2 },
                { "skillId": "addition", "masteryLevel": 0.9 },
                { "skillId": "subtraction" }
            ]
        }))
        .unwrap();
        assert_eq!(profile.skills.len(), 2);
        let addition = &profile.skills["addition"];
        assert_eq!(addition.mastery_level, 0.5);
        assert_eq!(addition.params.p_learn, 0.2);
        assert_eq!(addition.params.p_slip, DEFAULT_P_SLIP);
    }

    #[test]
    fn skills_map_keys_become_ids() {
        let profile: LearnerProfile = serde_json::from_value(serde_json::json!({
            "skills": { "fractions": { "masteryLevel": 0.4 } }
        }))
        .unwrap();
        assert_eq!(profile.skills["fractions"].skill_id, "fractions");
    }

    #[test]
    fn normalize_restores_derived_fields() {
        let mut profile = LearnerProfile {
            xp: 2500,
            level: 7,
            total_problems_completed: 4,
            correct_answers: 9,
            accuracy_rate: 3,
            completed_problems: vec!["p1".into(), "p1".into(), "p2".into()],
            ..LearnerProfile::default()
        };
        profile.achievements.push(Achievement {
            id: "first_problem".into(),
            ..Achievement::default()
        });
        profile.achievements.push(Achievement {
            id: "first_problem".into(),
            xp_reward: 999,
            ..Achievement::default()
        });

        profile.normalize();

        assert_eq!(profile.level, 3);
        assert_eq!(profile.correct_answers, 4);
        assert_eq!(profile.accuracy_rate, 100);
        assert_eq!(profile.achievements.len(), 1);
        assert_eq!(profile.achievements[0].xp_reward, 0);
        assert_eq!(profile.completed_problems, vec!["p1", "p2"]);
    }

    #[test]
    fn validate_rejects_out_of_range_grade() {
        let profile = LearnerProfile {
            grade_level: 13,
            ..LearnerProfile::default()
        };
        assert!(matches!(profile.validate(), Err(AlgoError::InvalidProfile(_))));
    }

    #[test]
    fn stage_follows_activity() {
        let mut profile = LearnerProfile::default();
        assert_eq!(profile.stage(), ProfileStage::Unconfigured);
        profile.total_problems_completed = 1;
        assert_eq!(profile.stage(), ProfileStage::Onboarding);
        profile.onboarding_completed = true;
        assert_eq!(profile.stage(), ProfileStage::Active);
    }

    #[test]
    fn problem_attempt_carries_reward_and_skills() {
        let problem = Problem {
            id: "add_1".into(),
            skills: vec!["addition".into()],
            xp_reward: 25,
            ..Problem::default()
        };
        let attempt = problem.attempt(true, 1);
        assert_eq!(attempt.base_xp_reward, 25);
        assert_eq!(attempt.skill_ids, vec!["addition"]);
        assert_eq!(attempt.problem_id.as_deref(), Some("add_1"));
    }
}
