use axum::extract::Query;
use axum::response::IntoResponse;
use axum::Json;
use mathwiz_algo::difficulty_multiplier;
use serde::{Deserialize, Serialize};

use crate::response::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DifficultyQuery {
    #[serde(default)]
    sets_completed: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DifficultyResponse {
    success: bool,
    sets_completed: i64,
    multiplier: f64,
}

pub(super) async fn multiplier(Query(query): Query<DifficultyQuery>) -> Result<impl IntoResponse, AppError> {
    let sets_completed = match query.sets_completed.as_deref().map(str::trim) {
        None | Some("") => 0,
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| AppError::validation("setsCompleted must be an integer"))?,
    };
    let multiplier = difficulty_multiplier(sets_completed)?;

    Ok(Json(DifficultyResponse {
        success: true,
        sets_completed,
        multiplier,
    }))
}
