use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use mathwiz_algo::{xp_to_next_level, LearnerProfile, LevelProgress, ProfileStage};
use serde::{Deserialize, Serialize};

use super::{bad_json, SuccessResponse};
use crate::response::AppError;
use crate::roster::RosterEntry;
use crate::services::progress::{load_profile, update_grade_level};
use crate::state::AppState;

pub(super) async fn list(State(state): State<AppState>) -> impl IntoResponse {
    let profiles: Vec<RosterEntry> = state.roster().entries().to_vec();
    Json(SuccessResponse::new(profiles))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileData {
    profile: LearnerProfile,
    stage: ProfileStage,
    level_progress: LevelProgress,
}

impl From<LearnerProfile> for ProfileData {
    fn from(profile: LearnerProfile) -> Self {
        Self {
            stage: profile.stage(),
            level_progress: xp_to_next_level(profile.xp),
            profile,
        }
    }
}

pub(super) async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let profile = load_profile(state.store(), state.roster(), &user_id, Utc::now()).await?;
    Ok(Json(SuccessResponse::new(ProfileData::from(profile))))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GradeBody {
    grade_level: u8,
}

pub(super) async fn update_grade(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Result<Json<GradeBody>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload.map_err(bad_json)?;

    let update = update_grade_level(
        state.store(),
        state.locks(),
        state.roster(),
        &user_id,
        payload.grade_level,
        Utc::now(),
    )
    .await?;

    Ok(Json(SuccessResponse::new(ProfileData::from(update.profile))))
}
