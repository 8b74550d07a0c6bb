use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

/// Service error taxonomy. Persistence faults are classified internally
/// (duplicate vs storage) even though the intake handlers surface a single
/// generic message to the user.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Record already exists")]
    DuplicateRecord,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Notification delivery failed: {0}")]
    Notification(String),
}

impl AppError {
    /// Maps a sqlx error, pulling unique-constraint violations out into
    /// their own variant so logs can tell them apart from storage faults.
    pub fn from_sqlx(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::DuplicateRecord,
            _ => AppError::Database(e),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateRecord => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Notification(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "error": self.to_string() }))
    }
}
