use crate::error::AppError;
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    pub status: u16,
    pub code: &'static str,
}

pub fn map_error(err: &AppError) -> (StatusCode, ErrorBody) {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let (error, code) = match err {
        AppError::Validation(_) => ("validation_error", "INVALID_REQUEST"),
        AppError::Unauthorized => ("authentication_error", "UNAUTHORIZED"),
        AppError::Forbidden => ("authorization_error", "NOT_A_PARTICIPANT"),
        AppError::NotFound => ("not_found_error", "NOT_FOUND"),
        AppError::Transient(_) => ("transient_error", "UPSTREAM_UNAVAILABLE"),
        AppError::Database(_) => ("server_error", "DATABASE_ERROR"),
        AppError::Config(_) | AppError::StartServer(_) | AppError::Internal => {
            ("server_error", "INTERNAL_SERVER_ERROR")
        }
    };

    // Internal detail stays in the logs, not in the response body.
    let message = match err {
        AppError::Database(_) | AppError::Internal | AppError::Config(_)
        | AppError::StartServer(_) => {
            tracing::error!(error = %err, "request failed");
            "internal server error".to_string()
        }
        other => other.to_string(),
    };

    (status, ErrorBody { error, message, status: status.as_u16(), code })
}

pub fn into_response(err: AppError) -> impl IntoResponse {
    let (status, body) = map_error(&err);
    (status, Json(body))
}
