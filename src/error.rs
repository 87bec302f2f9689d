use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use validator::ValidationErrors;

use crate::dice::DiceError;

pub type Result<T> = std::result::Result<T, RandomError>;

#[derive(Debug, Error)]
pub enum RandomError {
    #[error("min {min} should be less than max {max}")]
    IntRange { min: i64, max: i64 },

    #[error("min {min:.6} should be less than max {max:.6}")]
    FloatRange { min: f64, max: f64 },

    #[error("min and max must be finite and their difference must fit in a float")]
    FloatBounds,

    #[error("Invalid category, must be one of {}", .valid.join(", "))]
    UnknownCategory { valid: Vec<String> },

    #[error("Invalid size, must be between 1 and 200")]
    InvalidSize,

    #[error("Invalid UUID version, must be 4 or 7")]
    InvalidUuidVersion,

    #[error(transparent)]
    Dice(#[from] DiceError),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidQuery(String),

    #[error("Too many requests")]
    RateLimitExceeded,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RandomError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RandomError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            RandomError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<ValidationErrors> for RandomError {
    fn from(errors: ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .values()
            .flat_map(|list| list.iter())
            .find_map(|error| error.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| errors.to_string());

        RandomError::Validation(message)
    }
}

impl IntoResponse for RandomError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            RandomError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error while handling request");
                "Internal Server Error".to_string()
            }
            other => {
                tracing::debug!(status = %status, error = %other, "Rejecting request");
                other.to_string()
            }
        };

        (status, body).into_response()
    }
}
