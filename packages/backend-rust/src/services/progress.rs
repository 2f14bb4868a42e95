//! Server-side progress updates: attempts, lessons, onboarding and grade
//! changes. Each one runs under the learner's lock against a fresh read of
//! the persisted profile and writes at most once.

use chrono::{DateTime, Utc};
use mathwiz_algo::{
    apply_achievements, change_grade_level, check_achievements_at, complete_lesson,
    complete_onboarding, record_attempt, register_practice_day, total_xp, Achievement, AlgoError,
    AttemptOutcome, LearnerProfile, PlacementResult,
};
use serde::{Deserialize, Serialize};

use crate::db::{ProfileLocks, ProfileStore, StoreError};
use crate::roster::Roster;
use crate::services::achievement_check::persist_or_local;

#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    #[error("unknown learner: {0}")]
    UnknownLearner(String),
    #[error("profile store unavailable: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Algo(#[from] AlgoError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub profile: LearnerProfile,
    /// XP from the action itself, excluding achievement rewards
    pub xp_earned: u64,
    pub new_achievements: Vec<Achievement>,
    #[serde(rename = "achievementXP")]
    pub achievement_xp: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LessonSubmission {
    pub lesson_id: String,
    pub score: Option<u32>,
    pub time_spent: Option<u32>,
}

/// Persisted profile, or the roster default for a learner never saved
///
/// Unlike the achievement check, a read failure is an error here: applying
/// an attempt to a default profile would overwrite real progress.
pub async fn load_profile<S: ProfileStore>(
    store: &S,
    roster: &Roster,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<LearnerProfile, ProgressError> {
    if let Some(profile) = store.get(user_id).await? {
        return Ok(profile);
    }
    roster
        .fresh_profile(user_id, now)
        .ok_or_else(|| ProgressError::UnknownLearner(user_id.to_string()))
}

/// Credit any achievements the updated profile now qualifies for and persist
async fn settle<S: ProfileStore>(
    store: &S,
    user_id: &str,
    updated: LearnerProfile,
    xp_earned: u64,
    now: DateTime<Utc>,
) -> ProgressUpdate {
    let new_achievements = check_achievements_at(&updated, now);
    let achievement_xp = total_xp(&new_achievements);
    let credited = apply_achievements(&updated, &new_achievements);
    if !new_achievements.is_empty() {
        tracing::info!(
            user_id,
            unlocked = new_achievements.len(),
            achievement_xp,
            "achievements unlocked"
        );
    }

    let profile = persist_or_local(store, user_id, credited).await;
    ProgressUpdate {
        profile,
        xp_earned,
        new_achievements,
        achievement_xp,
    }
}

pub async fn record_attempt_for<S: ProfileStore>(
    store: &S,
    locks: &ProfileLocks,
    roster: &Roster,
    user_id: &str,
    attempt: &AttemptOutcome,
    now: DateTime<Utc>,
) -> Result<ProgressUpdate, ProgressError> {
    let _guard = locks.acquire(user_id).await;

    let mut profile = load_profile(store, roster, user_id, now).await?;
    register_practice_day(&mut profile, now.date_naive());
    let result = record_attempt(&profile, attempt, now)?;

    tracing::debug!(
        user_id,
        correct = attempt.correct,
        xp_earned = result.xp_earned,
        "attempt recorded"
    );
    Ok(settle(store, user_id, result.profile, result.xp_earned, now).await)
}

/// Repeat completions return the profile unchanged and write nothing
pub async fn complete_lesson_for<S: ProfileStore>(
    store: &S,
    locks: &ProfileLocks,
    roster: &Roster,
    user_id: &str,
    lesson: &LessonSubmission,
    now: DateTime<Utc>,
) -> Result<ProgressUpdate, ProgressError> {
    let _guard = locks.acquire(user_id).await;

    let profile = load_profile(store, roster, user_id, now).await?;
    let completion = complete_lesson(&profile, &lesson.lesson_id, lesson.score, lesson.time_spent, now)?;
    if !completion.newly_completed {
        return Ok(ProgressUpdate {
            profile: completion.profile,
            xp_earned: 0,
            new_achievements: Vec::new(),
            achievement_xp: 0,
        });
    }

    tracing::info!(user_id, lesson_id = %lesson.lesson_id, "lesson completed");
    Ok(settle(store, user_id, completion.profile, completion.xp_earned, now).await)
}

pub async fn complete_onboarding_for<S: ProfileStore>(
    store: &S,
    locks: &ProfileLocks,
    roster: &Roster,
    user_id: &str,
    grade_level: u8,
    placement: PlacementResult,
    now: DateTime<Utc>,
) -> Result<ProgressUpdate, ProgressError> {
    let _guard = locks.acquire(user_id).await;

    let profile = load_profile(store, roster, user_id, now).await?;
    let before = profile.xp;
    let onboarded = complete_onboarding(&profile, grade_level, placement, now)?;
    let xp_earned = onboarded.xp - before;

    tracing::info!(user_id, grade_level, "onboarding completed");
    Ok(settle(store, user_id, onboarded, xp_earned, now).await)
}

pub async fn update_grade_level<S: ProfileStore>(
    store: &S,
    locks: &ProfileLocks,
    roster: &Roster,
    user_id: &str,
    grade_level: u8,
    now: DateTime<Utc>,
) -> Result<ProgressUpdate, ProgressError> {
    let _guard = locks.acquire(user_id).await;

    let profile = load_profile(store, roster, user_id, now).await?;
    let updated = change_grade_level(&profile, grade_level)?;
    Ok(settle(store, user_id, updated, 0, now).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_roster;
    use crate::db::MemoryProfileStore;

    fn attempt(correct: bool) -> AttemptOutcome {
        AttemptOutcome {
            skill_ids: vec!["addition".to_string()],
            correct,
            hints_used: 0,
            base_xp_reward: 20,
            problem_id: None,
        }
    }

    fn fixture() -> (MemoryProfileStore, ProfileLocks, Roster) {
        (
            MemoryProfileStore::new(),
            ProfileLocks::new(),
            parse_roster("miles:Miles,robert:Robert"),
        )
    }

    #[tokio::test]
    async fn first_attempt_unlocks_first_problem() {
        let (store, locks, roster) = fixture();
        let now = Utc::now();
        let update = record_attempt_for(&store, &locks, &roster, "miles", &attempt(true), now)
            .await
            .unwrap();

        assert_eq!(update.xp_earned, 20);
        assert_eq!(update.new_achievements[0].id, "first_problem");
        assert_eq!(update.profile.xp, 20 + update.achievement_xp);
        assert_eq!(update.profile.streak, 1);
        assert_eq!(update.profile.display_name, "Miles");
        assert_eq!(store.get("miles").await.unwrap().unwrap(), update.profile);
    }

    #[tokio::test]
    async fn unknown_learner_rejected() {
        let (store, locks, roster) = fixture();
        let err = record_attempt_for(&store, &locks, &roster, "ghost", &attempt(true), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressError::UnknownLearner(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn invalid_attempt_writes_nothing() {
        let (store, locks, roster) = fixture();
        let mut bad = attempt(true);
        bad.base_xp_reward = -5;
        let err = record_attempt_for(&store, &locks, &roster, "miles", &bad, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressError::Algo(AlgoError::InvalidAttempt(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn lesson_xp_awarded_once() {
        let (store, locks, roster) = fixture();
        let now = Utc::now();
        let mut lesson = LessonSubmission {
            lesson_id: "add-1".into(),
            score: Some(90),
            time_spent: None,
        };
        let first = complete_lesson_for(&store, &locks, &roster, "robert", &lesson, now)
            .await
            .unwrap();
        assert_eq!(first.xp_earned, 100);

        lesson.score = Some(100);
        let again = complete_lesson_for(&store, &locks, &roster, "robert", &lesson, now)
            .await
            .unwrap();
        assert_eq!(again.xp_earned, 0);
        assert_eq!(again.profile.xp, first.profile.xp);
        assert_eq!(again.profile.completed_lessons.len(), 1);
    }

    #[tokio::test]
    async fn onboarding_once_then_conflict() {
        let (store, locks, roster) = fixture();
        let now = Utc::now();
        let placement = PlacementResult { correct: 2, total: 4 };
        let update = complete_onboarding_for(&store, &locks, &roster, "miles", 3, placement, now)
            .await
            .unwrap();
        assert_eq!(update.xp_earned, 100);
        assert!(update.profile.onboarding_completed);
        assert_eq!(update.profile.skills["addition"].mastery_level, 0.5);

        let err = complete_onboarding_for(&store, &locks, &roster, "miles", 3, placement, now)
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressError::Algo(AlgoError::AlreadyOnboarded)));
    }

    #[tokio::test]
    async fn grade_change_keeps_progress() {
        let (store, locks, roster) = fixture();
        let now = Utc::now();
        record_attempt_for(&store, &locks, &roster, "miles", &attempt(true), now)
            .await
            .unwrap();
        let update = update_grade_level(&store, &locks, &roster, "miles", 5, now)
            .await
            .unwrap();
        assert_eq!(update.profile.grade_level, 5);
        assert_eq!(update.profile.total_problems_completed, 1);
        assert!(update_grade_level(&store, &locks, &roster, "miles", 13, now)
            .await
            .is_err());
    }
}
