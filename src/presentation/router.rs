// Route table and middleware
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    current_mode, get_prices, get_schedule, get_settings, health_check, refresh_prices,
    save_schedule, save_settings,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/current-mode", get(current_mode))
        .route("/api/schedule", get(get_schedule).post(save_schedule))
        .route("/api/prices", get(get_prices))
        .route("/api/refresh-prices", post(refresh_prices))
        .route("/api/settings", get(get_settings).post(save_settings))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
