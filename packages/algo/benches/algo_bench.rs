//! Benchmark suite for mathwiz-algo
//!
//! Run with: cargo bench

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mathwiz_algo::{check_achievements_at, record_attempt, AttemptOutcome, LearnerProfile};

fn busy_profile() -> LearnerProfile {
    let mut profile = LearnerProfile::new("bench", "Bench", Utc::now());
    profile.total_problems_completed = 480;
    profile.correct_answers = 450;
    profile.xp = 18_700;
    profile.streak = 12;
    profile.normalize();
    profile
}

fn bench_record_attempt(c: &mut Criterion) {
    let profile = busy_profile();
    let attempt = AttemptOutcome {
        skill_ids: vec!["addition".to_string(), "carrying".to_string()],
        correct: true,
        hints_used: 1,
        base_xp_reward: 40,
        problem_id: None,
    };
    let now = Utc::now();
    c.bench_function("record_attempt", |b| {
        b.iter(|| record_attempt(black_box(&profile), black_box(&attempt), now))
    });
}

fn bench_check_achievements(c: &mut Criterion) {
    let profile = busy_profile();
    let now = Utc::now();
    c.bench_function("check_achievements_at", |b| {
        b.iter(|| check_achievements_at(black_box(&profile), now))
    });
}

criterion_group!(benches, bench_record_attempt, bench_check_achievements);
criterion_main!(benches);
