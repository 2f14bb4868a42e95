//! Reconciles a client-submitted profile against the persisted record before
//! granting achievements.
//!
//! The persisted achievement list is authoritative: anything the client
//! claims beyond it is discarded and must be earned again through the rules.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use mathwiz_algo::{apply_achievements, check_achievements_at, total_xp, Achievement, LearnerProfile};

use crate::db::{ProfileLocks, ProfileStore};

#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    pub new_achievements: Vec<Achievement>,
    pub total_xp: u64,
    /// `None` when nothing unlocked and nothing was written
    pub final_profile: Option<LearnerProfile>,
}

impl ReconcileOutcome {
    fn nothing_new() -> Self {
        Self {
            new_achievements: Vec::new(),
            total_xp: 0,
            final_profile: None,
        }
    }
}

/// Persisted profile, or `None` when absent or unreadable
pub(crate) async fn load_persisted<S: ProfileStore>(store: &S, user_id: &str) -> Option<LearnerProfile> {
    match store.get(user_id).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!(user_id, error = %e, "profile read failed, treating as first-time");
            None
        }
    }
}

/// Write `profile`, falling back to the local copy when the store rejects it
pub(crate) async fn persist_or_local<S: ProfileStore>(
    store: &S,
    user_id: &str,
    profile: LearnerProfile,
) -> LearnerProfile {
    match store.upsert(user_id, &profile).await {
        Ok(stored) => stored,
        Err(e) => {
            tracing::warn!(user_id, error = %e, "profile write failed, returning local result");
            profile
        }
    }
}

fn dedup_achievements(achievements: &[Achievement]) -> Vec<Achievement> {
    let mut seen = HashSet::new();
    achievements
        .iter()
        .filter(|a| seen.insert(a.id.clone()))
        .cloned()
        .collect()
}

/// The profile achievements are evaluated against
///
/// Without a persisted record this is the submitted profile. Otherwise the
/// persisted record is the base and the submission can only move it forward:
/// counters and XP take the higher value, lesson and problem lists gain the
/// ids they lack, onboarding never reverts, and a skill is replaced only by a
/// copy with more practice behind it. The persisted achievement list is
/// authoritative whenever it is non-empty.
pub fn reconciled_view(
    user_id: &str,
    submitted: &LearnerProfile,
    persisted: Option<&LearnerProfile>,
) -> LearnerProfile {
    let Some(persisted) = persisted else {
        let mut view = submitted.clone();
        view.id = user_id.to_string();
        view.achievements = dedup_achievements(&submitted.achievements);
        view.normalize();
        return view;
    };

    let mut view = persisted.clone();
    view.id = user_id.to_string();
    if view.achievements.is_empty() {
        view.achievements = dedup_achievements(&submitted.achievements);
    }

    view.xp = view.xp.max(submitted.xp);
    view.total_problems_completed = view.total_problems_completed.max(submitted.total_problems_completed);
    view.correct_answers = view.correct_answers.max(submitted.correct_answers);
    view.streak = view.streak.max(submitted.streak);
    view.last_practice_date = view.last_practice_date.max(submitted.last_practice_date);
    view.onboarding_completed |= submitted.onboarding_completed;

    for lesson in &submitted.completed_lessons {
        if !view.has_completed_lesson(&lesson.lesson_id) {
            view.completed_lessons.push(lesson.clone());
        }
    }
    for problem_id in &submitted.completed_problems {
        if !view.completed_problems.contains(problem_id) {
            view.completed_problems.push(problem_id.clone());
        }
    }
    for (skill_id, skill) in &submitted.skills {
        match view.skills.get(skill_id) {
            Some(held) if held.practice_count >= skill.practice_count => {}
            _ => {
                view.skills.insert(skill_id.clone(), skill.clone());
            }
        }
    }

    view.normalize();
    view
}

pub async fn reconcile_and_check<S: ProfileStore>(
    store: &S,
    locks: &ProfileLocks,
    user_id: &str,
    submitted: &LearnerProfile,
    now: DateTime<Utc>,
) -> ReconcileOutcome {
    let _guard = locks.acquire(user_id).await;

    let persisted = load_persisted(store, user_id).await;
    let view = reconciled_view(user_id, submitted, persisted.as_ref());

    let newly_unlocked = check_achievements_at(&view, now);
    if newly_unlocked.is_empty() {
        return ReconcileOutcome::nothing_new();
    }

    let final_profile = apply_achievements(&view, &newly_unlocked);
    let total = total_xp(&newly_unlocked);
    tracing::info!(
        user_id,
        unlocked = newly_unlocked.len(),
        total_xp = total,
        "achievements unlocked"
    );

    let final_profile = persist_or_local(store, user_id, final_profile).await;

    ReconcileOutcome {
        new_achievements: newly_unlocked,
        total_xp: total,
        final_profile: Some(final_profile),
    }
}
