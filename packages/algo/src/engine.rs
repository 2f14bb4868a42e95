//! Progress Engine
//!
//! Pure state transitions over [`LearnerProfile`]: graded attempts and
//! achievement crediting. Inputs are validated before the working copy is
//! touched, so a rejected call leaves nothing half-applied.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AlgoError;
use crate::types::{Achievement, AttemptOutcome, LearnerProfile, SkillMastery, HINT_PENALTY};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptResult {
    pub profile: LearnerProfile,
    pub xp_earned: u64,
}

/// XP for a correct answer after hint deductions, never negative
pub fn attempt_xp(base_xp_reward: i64, hints_used: u32) -> u64 {
    let penalty = i64::from(hints_used).saturating_mul(HINT_PENALTY);
    base_xp_reward.saturating_sub(penalty).max(0) as u64
}

fn validate_attempt(attempt: &AttemptOutcome) -> Result<(), AlgoError> {
    if attempt.base_xp_reward < 0 {
        return Err(AlgoError::InvalidAttempt(format!(
            "baseXpReward must be non-negative, got {}",
            attempt.base_xp_reward
        )));
    }
    if attempt.skill_ids.is_empty() {
        return Err(AlgoError::InvalidAttempt(
            "skillIds must name at least one skill".to_string(),
        ));
    }
    if attempt.skill_ids.iter().any(|id| id.trim().is_empty()) {
        return Err(AlgoError::InvalidAttempt(
            "skillIds must not contain blank ids".to_string(),
        ));
    }
    Ok(())
}

/// Apply one graded attempt
///
/// Counters and accuracy always move; XP and level only on a correct answer.
/// Each distinct skill id is practiced once per attempt. Achievement XP is
/// never granted here, see [`apply_achievements`].
pub fn record_attempt(
    profile: &LearnerProfile,
    attempt: &AttemptOutcome,
    now: DateTime<Utc>,
) -> Result<AttemptResult, AlgoError> {
    validate_attempt(attempt)?;

    let mut next = profile.clone();
    next.total_problems_completed = next.total_problems_completed.saturating_add(1);
    if attempt.correct {
        next.correct_answers = next.correct_answers.saturating_add(1);
    }
    next.correct_answers = next.correct_answers.min(next.total_problems_completed);
    next.refresh_accuracy();

    let xp_earned = if attempt.correct {
        attempt_xp(attempt.base_xp_reward, attempt.hints_used)
    } else {
        0
    };
    next.xp = next.xp.saturating_add(xp_earned);
    next.refresh_level();

    let mut practiced = HashSet::new();
    for skill_id in &attempt.skill_ids {
        if !practiced.insert(skill_id.as_str()) {
            continue;
        }
        next.skills
            .entry(skill_id.clone())
            .or_insert_with(|| SkillMastery::new(skill_id.clone(), now))
            .observe(attempt.correct, now);
    }

    if attempt.correct {
        if let Some(problem_id) = attempt.problem_id.as_deref() {
            if !next.completed_problems.iter().any(|p| p == problem_id) {
                next.completed_problems.push(problem_id.to_string());
            }
        }
    }

    Ok(AttemptResult {
        profile: next,
        xp_earned,
    })
}

/// Append unlocked achievements and credit their XP
///
/// Ids the profile already holds, and repeats within `achievements`, are
/// dropped silently and earn nothing.
pub fn apply_achievements(profile: &LearnerProfile, achievements: &[Achievement]) -> LearnerProfile {
    let mut next = profile.clone();
    let mut held: HashSet<String> = next.achievements.iter().map(|a| a.id.clone()).collect();

    let mut earned: u64 = 0;
    for achievement in achievements {
        if held.insert(achievement.id.clone()) {
            earned = earned.saturating_add(achievement.xp_reward);
            next.achievements.push(achievement.clone());
        }
    }

    next.xp = next.xp.saturating_add(earned);
    next.refresh_level();
    next
}

/// Sum of rewards, as reported back to clients
pub fn total_xp(achievements: &[Achievement]) -> u64 {
    achievements
        .iter()
        .fold(0u64, |sum, a| sum.saturating_add(a.xp_reward))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievements::{check_achievements_at, check_achievements_with, find_definition};
    use crate::types::LEVEL_XP_UNIT;

    fn attempt(correct: bool, base: i64, hints: u32) -> AttemptOutcome {
        AttemptOutcome {
            skill_ids: vec!["addition".to_string()],
            correct,
            hints_used: hints,
            base_xp_reward: base,
            problem_id: None,
        }
    }

    #[test]
    fn fresh_profile_first_correct_attempt() {
        let now = Utc::now();
        let profile = LearnerProfile::new("miles", "Miles", now);
        let result = record_attempt(&profile, &attempt(true, 50, 0), now).unwrap();
        let p = result.profile;
        assert_eq!(result.xp_earned, 50);
        assert_eq!(p.xp, 50);
        assert_eq!(p.total_problems_completed, 1);
        assert_eq!(p.correct_answers, 1);
        assert_eq!(p.accuracy_rate, 100);
        assert_eq!(p.level, (50 / LEVEL_XP_UNIT + 1) as u32);
        assert_eq!(p.skills["addition"].practice_count, 1);
        assert_eq!(p.skills["addition"].last_practiced, Some(now));
    }

    #[test]
    fn incorrect_attempt_moves_counters_only() {
        let now = Utc::now();
        let mut profile = LearnerProfile::new("miles", "Miles", now);
        profile.xp = 900;
        profile.total_problems_completed = 1;
        profile.correct_answers = 1;
        profile.normalize();

        let p = record_attempt(&profile, &attempt(false, 500, 0), now)
            .unwrap()
            .profile;
        assert_eq!(p.xp, 900);
        assert_eq!(p.level, 1);
        assert_eq!(p.total_problems_completed, 2);
        assert_eq!(p.correct_answers, 1);
        assert_eq!(p.accuracy_rate, 50);
    }

    #[test]
    fn hints_reduce_reward_to_floor_zero() {
        assert_eq!(attempt_xp(30, 2), 20);
        assert_eq!(attempt_xp(10, 5), 0);
        assert_eq!(attempt_xp(0, 0), 0);
    }

    #[test]
    fn level_recomputed_on_crossing() {
        let now = Utc::now();
        let mut profile = LearnerProfile::new("robert", "Robert", now);
        profile.xp = 980;
        profile.refresh_level();
        let p = record_attempt(&profile, &attempt(true, 40, 0), now)
            .unwrap()
            .profile;
        assert_eq!(p.xp, 1020);
        assert_eq!(p.level, 2);
    }

    #[test]
    fn rejects_negative_reward_and_missing_skills() {
        let now = Utc::now();
        let profile = LearnerProfile::new("miles", "Miles", now);
        assert!(matches!(
            record_attempt(&profile, &attempt(true, -1, 0), now),
            Err(AlgoError::InvalidAttempt(_))
        ));
        let mut empty = attempt(true, 10, 0);
        empty.skill_ids.clear();
        assert!(matches!(
            record_attempt(&profile, &empty, now),
            Err(AlgoError::InvalidAttempt(_))
        ));
    }

    #[test]
    fn repeated_skill_practiced_once() {
        let now = Utc::now();
        let profile = LearnerProfile::new("miles", "Miles", now);
        let mut a = attempt(true, 10, 0);
        a.skill_ids = vec!["addition".into(), "addition".into(), "counting".into()];
        let p = record_attempt(&profile, &a, now).unwrap().profile;
        assert_eq!(p.skills["addition"].practice_count, 1);
        assert_eq!(p.skills["counting"].practice_count, 1);
    }

    #[test]
    fn correct_problem_recorded_once() {
        let now = Utc::now();
        let profile = LearnerProfile::new("miles", "Miles", now);
        let mut a = attempt(true, 10, 0);
        a.problem_id = Some("add_7".into());
        let p = record_attempt(&profile, &a, now).unwrap().profile;
        let p = record_attempt(&p, &a, now).unwrap().profile;
        assert_eq!(p.completed_problems, vec!["add_7"]);
        assert_eq!(p.total_problems_completed, 2);
    }

    #[test]
    fn apply_credits_reward_and_drops_duplicates() {
        let now = Utc::now();
        let mut profile = LearnerProfile::new("miles", "Miles", now);
        profile.xp = 950;
        let first = find_definition("first_problem").unwrap().unlock(now);
        let tenth = find_definition("problem_10").unwrap().unlock(now);

        let p = apply_achievements(&profile, &[first.clone(), first.clone()]);
        assert_eq!(p.achievements.len(), 1);
        assert_eq!(p.xp, 1000);
        assert_eq!(p.level, 2);

        let p = apply_achievements(&p, &[first, tenth]);
        assert_eq!(p.achievements.len(), 2);
        assert_eq!(p.xp, 1100);
    }

    #[test]
    fn tenth_problem_unlocks_problem_10_once() {
        let now = Utc::now();
        let definitions = [*find_definition("problem_10").unwrap()];
        let mut profile = LearnerProfile::new("miles", "Miles", now);
        profile.total_problems_completed = 9;
        profile.correct_answers = 9;

        let p = record_attempt(&profile, &attempt(true, 20, 0), now)
            .unwrap()
            .profile;
        let unlocked = check_achievements_with(&definitions, &p, now);
        assert_eq!(unlocked.len(), 1);
        assert_eq!(unlocked[0].id, "problem_10");

        let p = apply_achievements(&p, &unlocked);
        assert!(check_achievements_with(&definitions, &p, now).is_empty());
    }

    #[test]
    fn check_apply_check_is_empty() {
        let now = Utc::now();
        let mut profile = LearnerProfile::new("miles", "Miles", now);
        profile.total_problems_completed = 120;
        profile.correct_answers = 118;
        profile.streak = 8;
        profile.xp = 9_500;
        profile.normalize();

        let unlocked = check_achievements_at(&profile, now);
        assert!(!unlocked.is_empty());
        let p = apply_achievements(&profile, &unlocked);
        assert!(check_achievements_at(&p, now).is_empty());
        assert_eq!(total_xp(&unlocked), p.xp - profile.xp);
    }
}
