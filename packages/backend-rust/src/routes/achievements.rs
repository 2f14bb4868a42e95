use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use mathwiz_algo::{
    achievement_progress, next_achievement, xp_to_next_level, Achievement, AchievementDefinition,
    AchievementProgress, LearnerProfile, LevelProgress, ACHIEVEMENTS,
};
use serde::{Deserialize, Serialize};

use super::{bad_json, require_user_id, SuccessResponse};
use crate::response::AppError;
use crate::services::achievement_check::reconcile_and_check;
use crate::services::progress::load_profile;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CheckRequest {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    user_profile: Option<LearnerProfile>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckResponse {
    success: bool,
    new_achievements: Vec<Achievement>,
    #[serde(rename = "totalXP")]
    total_xp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_profile: Option<LearnerProfile>,
}

pub(super) async fn check(
    State(state): State<AppState>,
    payload: Result<Json<CheckRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload.map_err(bad_json)?;
    let user_id = require_user_id(payload.user_id)?;
    let submitted = payload
        .user_profile
        .ok_or_else(|| AppError::validation("userProfile is required"))?;
    submitted.validate()?;

    let outcome = reconcile_and_check(
        state.store(),
        state.locks(),
        &user_id,
        &submitted,
        Utc::now(),
    )
    .await;

    Ok(Json(CheckResponse {
        success: true,
        new_achievements: outcome.new_achievements,
        total_xp: outcome.total_xp,
        updated_profile: outcome.final_profile,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CatalogueData {
    achievements: &'static [AchievementDefinition],
    total_count: usize,
}

pub(super) async fn catalogue() -> impl IntoResponse {
    Json(SuccessResponse::new(CatalogueData {
        achievements: ACHIEVEMENTS,
        total_count: ACHIEVEMENTS.len(),
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgressData {
    unlocked: Vec<Achievement>,
    in_progress: Vec<AchievementProgress>,
    next: Option<AchievementProgress>,
    level: LevelProgress,
}

pub(super) async fn progress(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let profile = load_profile(state.store(), state.roster(), &user_id, Utc::now()).await?;

    Ok(Json(SuccessResponse::new(ProgressData {
        in_progress: achievement_progress(&profile),
        next: next_achievement(&profile),
        level: xp_to_next_level(profile.xp),
        unlocked: profile.achievements,
    })))
}
