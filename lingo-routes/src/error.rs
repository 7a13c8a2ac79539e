use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use lingo_utils::stages::GateError;

/// Failure surfaced to the client as a status plus a notification message.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Please sign in to continue.")]
    Unauthorized,

    #[error("{0}")]
    InvalidCredentials(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    StageLocked(#[from] GateError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Your session is still loading. Please try again.")]
    SessionPending,

    #[error("Choose the languages you speak and want to learn first.")]
    SetupRequired,

    #[error("Something went wrong. Please try again.")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized | ApiError::InvalidCredentials(_) => StatusCode::UNAUTHORIZED,
            ApiError::StageLocked(GateError::InvalidLevel(_)) | ApiError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Forbidden(_) | ApiError::StageLocked(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) | ApiError::SetupRequired => StatusCode::CONFLICT,
            ApiError::SessionPending => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "unauthorized",
            ApiError::InvalidCredentials(_) => "invalid_credentials",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::StageLocked(_) => "stage_locked",
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Conflict(_) => "conflict",
            ApiError::SetupRequired => "setup_required",
            ApiError::SessionPending => "session_pending",
            ApiError::Internal(_) => "internal",
        }
    }

    pub fn not_found(what: &str) -> Self {
        ApiError::NotFound(format!("{} not found.", what))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(err) = &self {
            error!(?err, "request failed");
        }

        let status = self.status();
        let body = Json(json!({
            "error": self.code(),
            "notification": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::ApiError;
    use lingo_utils::stages::GateError;

    #[test]
    fn locked_stages_are_forbidden_with_notification() {
        let err = ApiError::from(GateError::Locked {
            level: 3,
            requires: 2,
        });
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.code(), "stage_locked");
        assert_eq!(err.to_string(), "Stage 3 is locked. Complete stage 2 first.");
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = ApiError::from(anyhow::anyhow!("connection refused"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.to_string().contains("connection refused"));
    }

    #[test]
    fn invalid_levels_are_not_found() {
        let err = ApiError::from(GateError::InvalidLevel(0));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn setup_required_is_conflict() {
        assert_eq!(ApiError::SetupRequired.status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::not_found("Stage").to_string(), "Stage not found.");
    }
}
