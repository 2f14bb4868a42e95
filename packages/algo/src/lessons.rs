//! Lesson Completion
//!
//! Lessons award a fixed XP bonus once; repeat completions of the same lesson
//! id change nothing.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AlgoError;
use crate::types::{CompletedLesson, LearnerProfile, LESSON_XP};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonCompletion {
    pub profile: LearnerProfile,
    pub xp_earned: u64,
    pub newly_completed: bool,
}

pub fn is_lesson_unlocked(profile: &LearnerProfile, prerequisite: Option<&str>) -> bool {
    prerequisite.map_or(true, |lesson_id| profile.has_completed_lesson(lesson_id))
}

pub fn complete_lesson(
    profile: &LearnerProfile,
    lesson_id: &str,
    score: Option<u32>,
    time_spent: Option<u32>,
    now: DateTime<Utc>,
) -> Result<LessonCompletion, AlgoError> {
    let lesson_id = lesson_id.trim();
    if lesson_id.is_empty() {
        return Err(AlgoError::InvalidArgument("lessonId must not be blank".to_string()));
    }
    if score.is_some_and(|s| s > 100) {
        return Err(AlgoError::InvalidArgument("score must be between 0 and 100".to_string()));
    }

    if profile.has_completed_lesson(lesson_id) {
        return Ok(LessonCompletion {
            profile: profile.clone(),
            xp_earned: 0,
            newly_completed: false,
        });
    }

    let mut next = profile.clone();
    next.completed_lessons.push(CompletedLesson {
        lesson_id: lesson_id.to_string(),
        completed_at: now,
        score,
        time_spent,
    });
    next.xp = next.xp.saturating_add(LESSON_XP);
    next.refresh_level();

    Ok(LessonCompletion {
        profile: next,
        xp_earned: LESSON_XP,
        newly_completed: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lesson_awards_once() {
        let now = Utc::now();
        let profile = LearnerProfile::new("miles", "Miles", now);
        let first = complete_lesson(&profile, "counting_1", Some(100), Some(12), now).unwrap();
        assert!(first.newly_completed);
        assert_eq!(first.profile.xp, LESSON_XP);

        let again = complete_lesson(&first.profile, "counting_1", Some(90), None, now).unwrap();
        assert!(!again.newly_completed);
        assert_eq!(again.xp_earned, 0);
        assert_eq!(again.profile, first.profile);
    }

    #[test]
    fn prerequisites_gate_unlock() {
        let now = Utc::now();
        let profile = LearnerProfile::new("miles", "Miles", now);
        assert!(is_lesson_unlocked(&profile, None));
        assert!(!is_lesson_unlocked(&profile, Some("counting_1")));
        let done = complete_lesson(&profile, "counting_1", None, None, now).unwrap();
        assert!(is_lesson_unlocked(&done.profile, Some("counting_1")));
    }

    #[test]
    fn rejects_blank_id_and_bad_score() {
        let now = Utc::now();
        let profile = LearnerProfile::new("miles", "Miles", now);
        assert!(complete_lesson(&profile, "  ", None, None, now).is_err());
        assert!(complete_lesson(&profile, "l1", Some(101), None, now).is_err());
    }
}
