pub mod config;
pub mod db;
pub mod logging;
pub mod response;
pub mod roster;
pub mod routes;
pub mod services;
pub mod state;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::db::{SqliteInitError, Store};
use crate::state::AppState;

/// Application wired to the store selected by `config`
pub async fn create_app(config: &Config) -> Result<axum::Router, SqliteInitError> {
    let store = Store::from_database_url(config.database_url.as_deref()).await?;
    tracing::info!(store = store.kind(), learners = config.roster.len(), "profile store selected");
    Ok(create_app_with(AppState::new(store, config.roster.clone())))
}

pub fn create_app_with(state: AppState) -> axum::Router {
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
