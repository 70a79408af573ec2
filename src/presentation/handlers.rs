// HTTP request handlers
use crate::application::price_service::{default_range, PriceSeries, MAX_PRICE_RANGE};
use crate::domain::schedule::{ModeQueryResult, ScheduleBreakpoint, StoredBreakpoint};
use crate::presentation::app_state::AppState;
use crate::presentation::error::ApiError;
use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    Json,
};
use chrono::{DateTime, Local, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct ModeQuery {
    pub at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

fn bad_request(e: impl std::fmt::Display) -> ApiError {
    ApiError::BadRequest(e.to_string())
}

/// Health check endpoint
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Mode in force at `at`, or now
pub async fn current_mode(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ModeQuery>, QueryRejection>,
) -> Result<Json<ModeQueryResult>, ApiError> {
    let Query(query) = query.map_err(bad_request)?;
    let at = query.at.unwrap_or_else(Utc::now);
    Ok(Json(state.schedule_service.current_mode(at)?))
}

pub async fn get_schedule(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StoredBreakpoint>>, ApiError> {
    Ok(Json(state.schedule_service.stored_schedule().await?))
}

pub async fn save_schedule(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Vec<ScheduleBreakpoint>>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(breakpoints) = body.map_err(bad_request)?;
    let count = breakpoints.len();
    state.schedule_service.submit(breakpoints).await?;
    Ok(Json(json!({ "message": "Schedule saved", "count": count })))
}

pub async fn get_prices(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Json<PriceSeries>, ApiError> {
    let Query(query) = query.map_err(bad_request)?;
    let (default_from, default_to) = default_range(Local::now());
    let from = query.from.unwrap_or(default_from);
    let to = query.to.unwrap_or(default_to);
    if from >= to {
        return Err(ApiError::BadRequest(format!("empty range: {from} is not before {to}")));
    }
    if to - from > MAX_PRICE_RANGE {
        return Err(ApiError::BadRequest(format!(
            "range too long: at most {} days per request",
            MAX_PRICE_RANGE.num_days()
        )));
    }

    Ok(Json(state.price_service.prices(from, to).await?))
}

pub async fn refresh_prices(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let (from, to) = default_range(Local::now());
    let outcome = state.price_service.refresh(from, to).await?;
    Ok(Json(json!({
        "message": "Prices refreshed",
        "prices": outcome.count,
        "source": outcome.source,
    })))
}

pub async fn get_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HashMap<String, String>>, ApiError> {
    Ok(Json(state.settings_service.all().await?))
}

pub async fn save_settings(
    State(state): State<Arc<AppState>>,
    body: Result<Json<HashMap<String, String>>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(settings) = body.map_err(bad_request)?;
    state.settings_service.save(settings).await?;
    Ok(Json(json!({ "message": "Settings saved" })))
}
