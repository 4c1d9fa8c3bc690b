use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::services::booking::{BookingError, CancelError};
use crate::services::reviews::ReviewError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] anyhow::Error),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "request failed on persistence");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    // Nothing was committed; the caller may retry.
                    "internal error, please try again".to_string(),
                )
            }
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            AppError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::RoomNotFound => AppError::NotFound("room".to_string()),
            BookingError::CheckInPast
            | BookingError::InvalidRange
            | BookingError::Overcapacity { .. } => AppError::Validation(err.to_string()),
            BookingError::Unavailable => AppError::Conflict(err.to_string()),
            BookingError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<CancelError> for AppError {
    fn from(err: CancelError) -> Self {
        match err {
            CancelError::NotFound => AppError::NotFound("booking".to_string()),
            CancelError::NotPermitted => AppError::Forbidden,
            CancelError::AlreadyCancelled | CancelError::CheckInStarted => {
                AppError::Conflict(err.to_string())
            }
            CancelError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::BookingNotFound => AppError::NotFound("booking".to_string()),
            ReviewError::NotYourBooking => AppError::Forbidden,
            ReviewError::StayNotCompleted | ReviewError::AlreadyReviewed => {
                AppError::Conflict(err.to_string())
            }
            ReviewError::InvalidRating => AppError::Validation(err.to_string()),
            ReviewError::Database(e) => AppError::Database(e),
        }
    }
}
