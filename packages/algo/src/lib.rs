//! # mathwiz-algo - learner progress model
//!
//! Pure Rust rules behind a learner's progress record:
//!
//! - **Engine** - graded attempts, accuracy, XP and levels
//! - **Mastery** - Bayesian Knowledge Tracing per skill
//! - **Achievements** - static catalogue, idempotent unlock detection
//! - **Difficulty** - progressive multiplier for problem generators
//! - **Lessons / Onboarding / Streak** - one-shot bonuses and daily streaks
//!
//! Nothing here performs I/O. Every operation takes a profile snapshot and
//! returns a new one; persistence belongs to the caller.
//!
//! ## Module structure
//!
//! - [`types`] - profile aggregate, skill and achievement records, constants
//! - [`engine`] - `record_attempt`, `apply_achievements`
//! - [`achievements`] - catalogue, `check_achievements`, progress
//! - [`mastery`] - BKT update
//! - [`difficulty`] - `difficulty_multiplier`
//! - [`leveling`] - level formula
//! - [`lessons`], [`onboarding`], [`streak`]
//! - [`sanitize`] - probability clamping
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use mathwiz_algo::{apply_achievements, check_achievements, record_attempt, AttemptOutcome, LearnerProfile};
//!
//! let now = Utc::now();
//! let profile = LearnerProfile::new("miles", "Miles", now);
//! let attempt = AttemptOutcome {
//!     skill_ids: vec!["addition".to_string()],
//!     correct: true,
//!     hints_used: 0,
//!     base_xp_reward: 50,
//!     problem_id: None,
//! };
//! let result = record_attempt(&profile, &attempt, now).unwrap();
//! let unlocked = check_achievements(&result.profile);
//! let profile = apply_achievements(&result.profile, &unlocked);
//! assert!(check_achievements(&profile).is_empty());
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod achievements;
pub mod difficulty;
pub mod engine;
pub mod error;
pub mod lessons;
pub mod leveling;
pub mod mastery;
pub mod onboarding;
pub mod sanitize;
pub mod streak;
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use types::*;

pub use achievements::{
    achievement_progress, check_achievements, check_achievements_at, check_achievements_with,
    next_achievement, AchievementDefinition, AchievementProgress, AchievementRule, ACHIEVEMENTS,
};
pub use difficulty::difficulty_multiplier;
pub use engine::{apply_achievements, record_attempt, total_xp, AttemptResult};
pub use error::AlgoError;
pub use lessons::{complete_lesson, is_lesson_unlocked, LessonCompletion};
pub use leveling::{level_for_xp, xp_to_next_level, LevelProgress};
pub use onboarding::{change_grade_level, complete_onboarding, PlacementResult};
pub use streak::register_practice_day;
