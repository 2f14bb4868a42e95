use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use mathwiz_algo::{AttemptOutcome, PlacementResult, Problem};
use serde::Deserialize;

use super::{bad_json, require_user_id, SuccessResponse};
use crate::response::AppError;
use crate::services::progress::{
    complete_lesson_for, complete_onboarding_for, record_attempt_for, LessonSubmission,
};
use crate::state::AppState;

/// Either a ready attempt, or a problem record plus the verdict
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AttemptBody {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    attempt: Option<AttemptOutcome>,
    #[serde(default)]
    problem: Option<Problem>,
    #[serde(default)]
    correct: bool,
    #[serde(default)]
    hints_used: u32,
}

impl AttemptBody {
    fn into_attempt(self) -> Result<AttemptOutcome, AppError> {
        match (self.attempt, self.problem) {
            (Some(attempt), _) => Ok(attempt),
            (None, Some(problem)) => Ok(problem.attempt(self.correct, self.hints_used)),
            (None, None) => Err(AppError::validation("attempt or problem is required")),
        }
    }
}

pub(super) async fn attempt(
    State(state): State<AppState>,
    payload: Result<Json<AttemptBody>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(mut payload) = payload.map_err(bad_json)?;
    let user_id = require_user_id(payload.user_id.take())?;
    let attempt = payload.into_attempt()?;

    let update = record_attempt_for(
        state.store(),
        state.locks(),
        state.roster(),
        &user_id,
        &attempt,
        Utc::now(),
    )
    .await?;

    Ok(Json(SuccessResponse::new(update)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LessonBody {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(flatten)]
    lesson: LessonSubmission,
}

pub(super) async fn lesson(
    State(state): State<AppState>,
    payload: Result<Json<LessonBody>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload.map_err(bad_json)?;
    let user_id = require_user_id(payload.user_id)?;

    let update = complete_lesson_for(
        state.store(),
        state.locks(),
        state.roster(),
        &user_id,
        &payload.lesson,
        Utc::now(),
    )
    .await?;

    Ok(Json(SuccessResponse::new(update)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OnboardingBody {
    #[serde(default)]
    user_id: Option<String>,
    grade_level: u8,
    #[serde(default)]
    placement: PlacementResult,
}

pub(super) async fn onboarding(
    State(state): State<AppState>,
    payload: Result<Json<OnboardingBody>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload.map_err(bad_json)?;
    let user_id = require_user_id(payload.user_id)?;

    let update = complete_onboarding_for(
        state.store(),
        state.locks(),
        state.roster(),
        &user_id,
        payload.grade_level,
        payload.placement,
        Utc::now(),
    )
    .await?;

    Ok(Json(SuccessResponse::new(update)))
}
