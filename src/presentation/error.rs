// API error type and its JSON rendering
use crate::application::schedule_service::ScheduleError;
use crate::domain::validation::ScheduleConflict;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Conflict(#[from] ScheduleConflict),

    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl From<ScheduleError> for ApiError {
    fn from(e: ScheduleError) -> Self {
        match e {
            ScheduleError::Conflict(conflict) => ApiError::Conflict(conflict),
            ScheduleError::Storage(e) => ApiError::Internal(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            ApiError::Conflict(conflict) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": self.to_string(), "conflict_at": conflict.at }),
            ),
            ApiError::Internal(e) => {
                tracing::error!(error = %format!("{e:#}"), "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": self.to_string() }))
            }
        };
        (status, Json(body)).into_response()
    }
}
