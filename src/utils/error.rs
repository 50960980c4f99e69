use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::checkin::{CheckInError, WindowState};
use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Event is not open for check-in")]
    EventNotActive(WindowState),

    #[error("Invalid check-in token")]
    InvalidToken,

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::EventNotActive(_) => StatusCode::CONFLICT,
            AppError::InvalidToken => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::EventNotActive(_) => "EVENT_NOT_ACTIVE",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
        }
    }

    fn log(&self) {
        match self {
            // A rejected token is user-correctable (rescan), not a
            // security incident; keep it out of the error log.
            AppError::InvalidToken | AppError::EventNotActive(_) => {
                tracing::debug!(error = ?self, "Check-in refused");
            }
            AppError::DatabaseError(e) => {
                error!(error = ?e, "Database error");
            }
            AppError::ValidationError(msg) | AppError::AuthError(msg) | AppError::NotFound(msg) => {
                error!(error = ?self, message = %msg, "Application error");
            }
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::NotFound(msg) => msg.clone(),
            AppError::EventNotActive(WindowState::Upcoming) => {
                "Check-in has not opened yet for this event".to_string()
            }
            AppError::EventNotActive(_) => {
                "Check-in has already closed for this event".to_string()
            }
            AppError::InvalidToken => {
                "Token was not valid; refresh the code and rescan".to_string()
            }
            AppError::DatabaseError(_) => "A database error occurred".to_string(),
        }
    }
}

impl From<CheckInError> for AppError {
    fn from(err: CheckInError) -> Self {
        match err {
            CheckInError::EventNotFound => AppError::NotFound("Event not found".to_string()),
            CheckInError::EventNotActive { state } => AppError::EventNotActive(state),
            CheckInError::InvalidToken => AppError::InvalidToken,
            CheckInError::MemberNotFound => {
                AppError::NotFound("Member profile not found".to_string())
            }
            CheckInError::Store(e) => AppError::DatabaseError(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log internal details; expose only the public message.
        self.log();
        error_response(self.code(), self.public_message(), None, self.status_code())
    }
}
