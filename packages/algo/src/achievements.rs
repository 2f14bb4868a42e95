//! Achievement Catalogue and Unlock Detection
//!
//! Definitions are static configuration. Each carries an [`AchievementRule`]
//! evaluated against a profile snapshot; evaluation is pure and never fails,
//! missing profile data reads as its zero-value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::apply_achievements;
use crate::leveling::level_for_xp;
use crate::types::{Achievement, AchievementCategory, LearnerProfile};

/// Unlock condition of one achievement
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AchievementRule {
    ProblemsCompleted { min: u64 },
    Streak { min_days: u32 },
    Accuracy { min_rate: u32, min_problems: u64 },
    Level { min: u32 },
    SkillsMastered { count: usize, threshold: f64 },
    AllSkillsMastered { min_skills: usize, threshold: f64 },
    FirstWeek { days: i64, min_problems: u64 },
    GradeLessons,
    /// Tracked during a session, outside the profile; never met by a snapshot
    Session,
}

/// Lessons a grade must complete for `grade_complete`
pub fn required_lessons_for_grade(grade_level: u8) -> usize {
    match grade_level {
        0 => 4,
        1..=5 => 5,
        6..=10 => 6,
        11 | 12 => 7,
        _ => 5,
    }
}

impl AchievementRule {
    pub fn is_met(&self, profile: &LearnerProfile, now: DateTime<Utc>) -> bool {
        match *self {
            Self::ProblemsCompleted { min } => profile.total_problems_completed >= min,
            Self::Streak { min_days } => profile.streak >= min_days,
            Self::Accuracy {
                min_rate,
                min_problems,
            } => profile.accuracy_rate >= min_rate && profile.total_problems_completed >= min_problems,
            Self::Level { min } => level_for_xp(profile.xp) >= min,
            Self::SkillsMastered { count, threshold } => {
                profile.mastered_skill_count(threshold) >= count
            }
            Self::AllSkillsMastered {
                min_skills,
                threshold,
            } => {
                profile.skills.len() >= min_skills
                    && profile.skills.values().all(|s| s.mastery_level >= threshold)
            }
            Self::FirstWeek { days, min_problems } => {
                (now - profile.created_at).num_days() >= days
                    && profile.total_problems_completed >= min_problems
            }
            Self::GradeLessons => {
                profile.completed_lessons.len() >= required_lessons_for_grade(profile.grade_level)
            }
            Self::Session => false,
        }
    }

    /// Partial progress, for rules that count toward a multi-step target
    pub fn progress(&self, profile: &LearnerProfile) -> Option<Progress> {
        match *self {
            Self::ProblemsCompleted { min } if min > 1 => Some(Progress {
                current: profile.total_problems_completed,
                max: min,
            }),
            Self::Streak { min_days } if min_days > 1 => Some(Progress {
                current: u64::from(profile.streak),
                max: u64::from(min_days),
            }),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub current: u64,
    pub max: u64,
}

impl Progress {
    pub fn percentage(&self) -> u32 {
        if self.max == 0 {
            return 100;
        }
        ((self.current as f64 / self.max as f64) * 100.0)
            .round()
            .min(100.0) as u32
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub category: AchievementCategory,
    pub xp_reward: u64,
    pub rule: AchievementRule,
}

impl AchievementDefinition {
    pub fn unlock(&self, now: DateTime<Utc>) -> Achievement {
        Achievement {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
            icon: self.icon.to_string(),
            category: self.category,
            xp_reward: self.xp_reward,
            unlocked_at: now,
        }
    }
}

macro_rules! achievement {
    ($id:literal, $name:literal, $desc:literal, $icon:literal, $cat:ident, $xp:literal, $rule:expr) => {
        AchievementDefinition {
            id: $id,
            name: $name,
            description: $desc,
            icon: $icon,
            category: AchievementCategory::$cat,
            xp_reward: $xp,
            rule: $rule,
        }
    };
}

/// The catalogue, in evaluation order
pub static ACHIEVEMENTS: &[AchievementDefinition] = &[
    // Practice volume
    achievement!("first_problem", "First Spell Cast", "Complete your very first problem!", "✨", Practice, 50,
        AchievementRule::ProblemsCompleted { min: 1 }),
    achievement!("problem_10", "Apprentice Wizard", "Solve 10 problems", "🧙", Practice, 100,
        AchievementRule::ProblemsCompleted { min: 10 }),
    achievement!("problem_50", "Skilled Sorcerer", "Solve 50 problems", "🔮", Practice, 250,
        AchievementRule::ProblemsCompleted { min: 50 }),
    achievement!("problem_100", "Master Mathematician", "Solve 100 problems", "🌟", Practice, 500,
        AchievementRule::ProblemsCompleted { min: 100 }),
    achievement!("problem_500", "Grand Wizard", "Solve 500 problems - legendary!", "👑", Practice, 1000,
        AchievementRule::ProblemsCompleted { min: 500 }),
    // Streaks
    achievement!("streak_3", "On Fire!", "Practice 3 days in a row", "🔥", Practice, 100,
        AchievementRule::Streak { min_days: 3 }),
    achievement!("streak_7", "Weekly Warrior", "Practice 7 days in a row", "⚡", Practice, 200,
        AchievementRule::Streak { min_days: 7 }),
    achievement!("streak_30", "Unstoppable Force", "Practice 30 days in a row", "💪", Practice, 500,
        AchievementRule::Streak { min_days: 30 }),
    // Accuracy
    achievement!("accuracy_80", "Sharp Mind", "Maintain 80% accuracy", "🎯", Mastery, 150,
        AchievementRule::Accuracy { min_rate: 80, min_problems: 10 }),
    achievement!("accuracy_90", "Precision Master", "Maintain 90% accuracy", "🏆", Mastery, 300,
        AchievementRule::Accuracy { min_rate: 90, min_problems: 20 }),
    achievement!("accuracy_95", "Perfectionist", "Maintain 95% accuracy", "💎", Mastery, 500,
        AchievementRule::Accuracy { min_rate: 95, min_problems: 50 }),
    // Levels
    achievement!("level_5", "Rising Star", "Reach Level 5", "⭐", Mastery, 100,
        AchievementRule::Level { min: 5 }),
    achievement!("level_10", "Magic Prodigy", "Reach Level 10", "🌠", Mastery, 250,
        AchievementRule::Level { min: 10 }),
    achievement!("level_20", "Legendary Wizard", "Reach Level 20", "🔱", Mastery, 500,
        AchievementRule::Level { min: 20 }),
    // Skills
    achievement!("skill_master_1", "Skill Specialist", "Master your first skill (90%+)", "📖", Mastery, 200,
        AchievementRule::SkillsMastered { count: 1, threshold: 0.9 }),
    achievement!("skill_master_3", "Triple Threat", "Master 3 different skills", "🎓", Mastery, 400,
        AchievementRule::SkillsMastered { count: 3, threshold: 0.9 }),
    achievement!("skill_master_all", "Omniscient", "Master all skills in your grade", "🧠", Mastery, 1000,
        AchievementRule::AllSkillsMastered { min_skills: 5, threshold: 0.85 }),
    // Awarded by session tracking
    achievement!("perfect_session", "Flawless Victory", "Complete a 10-problem session with 100% accuracy", "💯", Special, 300,
        AchievementRule::Session),
    achievement!("speed_demon", "Lightning Fast", "Solve 10 problems in under 5 minutes", "⚡", Special, 250,
        AchievementRule::Session),
    achievement!("night_owl", "Midnight Scholar", "Practice after 10 PM", "🦉", Special, 100,
        AchievementRule::Session),
    achievement!("early_bird", "Dawn Wizard", "Practice before 6 AM", "🌅", Special, 100,
        AchievementRule::Session),
    achievement!("homework_hero", "Homework Hero", "Use homework help 10 times", "📚", Social, 150,
        AchievementRule::Session),
    // Milestones
    achievement!("first_week", "Welcome Wizard", "Complete your first week!", "🎉", Special, 200,
        AchievementRule::FirstWeek { days: 7, min_problems: 10 }),
    achievement!("grade_complete", "Grade Champion", "Complete all lessons for your grade", "🏅", Mastery, 750,
        AchievementRule::GradeLessons),
];

pub fn find_definition(id: &str) -> Option<&'static AchievementDefinition> {
    ACHIEVEMENTS.iter().find(|def| def.id == id)
}

/// Newly unlocked achievements from the full catalogue at the current time
pub fn check_achievements(profile: &LearnerProfile) -> Vec<Achievement> {
    check_achievements_at(profile, Utc::now())
}

pub fn check_achievements_at(profile: &LearnerProfile, now: DateTime<Utc>) -> Vec<Achievement> {
    check_achievements_with(ACHIEVEMENTS, profile, now)
}

/// Evaluate `definitions`, skipping ids the profile already holds
///
/// Unlock rewards can carry the profile over a level threshold, so the
/// evaluation repeats against the credited view until nothing new unlocks.
/// Applying the result therefore leaves nothing further to unlock. The
/// returned list is in definition order.
pub fn check_achievements_with(
    definitions: &[AchievementDefinition],
    profile: &LearnerProfile,
    now: DateTime<Utc>,
) -> Vec<Achievement> {
    let mut unlocked_idx: Vec<usize> = Vec::new();
    let mut view = profile.clone();

    loop {
        let round: Vec<usize> = definitions
            .iter()
            .enumerate()
            .filter(|(idx, def)| !unlocked_idx.contains(idx) && !view.has_achievement(def.id))
            .filter(|(_, def)| def.rule.is_met(&view, now))
            .map(|(idx, _)| idx)
            .collect();

        if round.is_empty() {
            break;
        }

        let credited: Vec<Achievement> = round.iter().map(|&idx| definitions[idx].unlock(now)).collect();
        view = apply_achievements(&view, &credited);
        unlocked_idx.extend(round);
    }

    unlocked_idx.sort_unstable();
    unlocked_idx
        .into_iter()
        .map(|idx| definitions[idx].unlock(now))
        .collect()
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementProgress {
    pub achievement: &'static AchievementDefinition,
    pub progress: Progress,
    pub percentage: u32,
}

/// Progress toward every locked achievement that tracks progress, closest first
pub fn achievement_progress(profile: &LearnerProfile) -> Vec<AchievementProgress> {
    let mut entries: Vec<AchievementProgress> = ACHIEVEMENTS
        .iter()
        .filter(|def| !profile.has_achievement(def.id))
        .filter_map(|def| {
            def.rule.progress(profile).map(|progress| AchievementProgress {
                achievement: def,
                percentage: progress.percentage(),
                progress,
            })
        })
        .collect();

    entries.sort_by(|a, b| b.percentage.cmp(&a.percentage));
    entries
}

pub fn next_achievement(profile: &LearnerProfile) -> Option<AchievementProgress> {
    achievement_progress(profile).into_iter().next()
}
