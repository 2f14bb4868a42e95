//! Daily Practice Streak
//!
//! Maintained per calendar day of practice, independent of the attempt
//! counters: the engine only reads `streak` for achievement rules.

use chrono::NaiveDate;

use crate::types::LearnerProfile;

/// Register practice on `today`
///
/// The same day leaves the streak unchanged, the day after the last practice
/// extends it, anything else restarts it at 1. A date earlier than the last
/// practice (clock skew) is ignored.
pub fn register_practice_day(profile: &mut LearnerProfile, today: NaiveDate) {
    match profile.last_practice_date {
        Some(last) if last >= today => {
            if profile.streak == 0 {
                profile.streak = 1;
            }
            return;
        }
        Some(last) if last.succ_opt() == Some(today) => {
            profile.streak = profile.streak.saturating_add(1);
        }
        _ => profile.streak = 1,
    }
    profile.last_practice_date = Some(today);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn consecutive_days_extend() {
        let mut p = LearnerProfile::default();
        register_practice_day(&mut p, day(1));
        register_practice_day(&mut p, day(2));
        register_practice_day(&mut p, day(3));
        assert_eq!(p.streak, 3);
        assert_eq!(p.last_practice_date, Some(day(3)));
    }

    #[test]
    fn same_day_is_idempotent() {
        let mut p = LearnerProfile::default();
        register_practice_day(&mut p, day(5));
        register_practice_day(&mut p, day(5));
        assert_eq!(p.streak, 1);
    }

    #[test]
    fn gap_resets() {
        let mut p = LearnerProfile::default();
        register_practice_day(&mut p, day(1));
        register_practice_day(&mut p, day(2));
        register_practice_day(&mut p, day(9));
        assert_eq!(p.streak, 1);
    }

    #[test]
    fn earlier_date_ignored() {
        let mut p = LearnerProfile::default();
        register_practice_day(&mut p, day(4));
        register_practice_day(&mut p, day(5));
        register_practice_day(&mut p, day(2));
        assert_eq!(p.streak, 2);
        assert_eq!(p.last_practice_date, Some(day(5)));
    }
}
