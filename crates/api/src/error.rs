//! API error taxonomy
//!
//! Every handler returns `ApiResult<T>`; domain failures are translated here
//! into a status code and a `{success: false, message}` body. Internal details
//! go to the log, never to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mr_abdallah_shared::StoreError;
use serde_json::json;
use thiserror::Error;
use time::{macros::format_description, OffsetDateTime};

pub type ApiResult<T> = Result<T, ApiError>;

/// Message shared by unknown-email and wrong-password responses
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or missing input
    #[error("{0}")]
    Validation(String),

    /// Unknown email or wrong password; both render identically
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is locked")]
    Locked { until: OffsetDateTime },

    /// Missing or unverifiable token on a gated route
    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("Not found")]
    NotFound,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Locked { .. } => StatusCode::LOCKED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> String {
        match self {
            ApiError::Locked { until } => format!(
                "Account is locked due to too many failed login attempts. Locked until {}",
                format_unlock_time(*until)
            ),
            ApiError::Store(_) | ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let mut body = json!({
            "success": false,
            "message": self.client_message(),
        });
        if let ApiError::Locked { until } = &self {
            if let Ok(ts) = until.format(&time::format_description::well_known::Rfc3339) {
                body["lockUntil"] = json!(ts);
            }
        }

        (status, Json(body)).into_response()
    }
}

/// Human-readable unlock time, e.g. `2026-10-19 14:03:00 UTC`
pub fn format_unlock_time(until: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC");
    until
        .to_offset(time::UtcOffset::UTC)
        .format(&format)
        .unwrap_or_else(|_| until.to_string())
}
