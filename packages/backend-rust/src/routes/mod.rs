mod achievements;
mod difficulty;
mod health;
mod profiles;
mod progress;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::Router;
use serde::Serialize;

use crate::response::{json_error, AppError};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .route("/api/achievements", get(achievements::catalogue))
        .route("/api/achievements/check", post(achievements::check))
        .route("/api/achievements/progress/:user_id", get(achievements::progress))
        .route("/api/profiles", get(profiles::list))
        .route("/api/profiles/:user_id", get(profiles::get_profile))
        .route("/api/profiles/:user_id/grade", put(profiles::update_grade))
        .route("/api/progress/attempt", post(progress::attempt))
        .route("/api/progress/lesson", post(progress::lesson))
        .route("/api/progress/onboarding", post(progress::onboarding))
        .route("/api/difficulty", get(difficulty::multiplier))
        .fallback(fallback_handler)
        .with_state(state)
}

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

impl<T> SuccessResponse<T> {
    fn new(data: T) -> Self {
        Self { success: true, data }
    }
}

/// Malformed or mistyped JSON bodies are a client error
fn bad_json(rejection: JsonRejection) -> AppError {
    AppError::bad_request(format!("invalid JSON body: {}", rejection.body_text()))
}

/// Required string field, present and not blank
fn require_user_id(user_id: Option<String>) -> Result<String, AppError> {
    user_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::validation("userId is required"))
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "route not found").into_response()
}
