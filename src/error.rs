use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::error::Error;
use std::fmt;

use crate::naming::NamingError;

/// The primary error type for the application.
///
/// This enum consolidates all possible errors that can occur within the application,
/// providing a unified way to handle and respond to failures.
#[derive(Debug)]
pub enum AppError {
    /// For internal server errors that are not expected to be handled by the client.
    Internal(anyhow::Error),
    /// For client errors due to invalid requests.
    BadRequest(String),
    /// For when a requested resource is not found.
    NotFound(String),
    /// For when a request conflicts with the current state of the server.
    Conflict(String),
    /// For when a service is temporarily unavailable.
    ServiceUnavailable(String),
    /// For errors related to database operations.
    Database(String),
    /// For when user input is invalid.
    InvalidInput(String),
    /// For when a client has sent too many requests in a given amount of time.
    RateLimited {
        /// The number of seconds to wait before retrying the request.
        retry_after_seconds: u64,
    },
    /// For when a specific field in a request fails validation.
    ValidationError {
        /// The name of the field that failed validation.
        field: String,
        /// A message describing the validation error.
        message: String,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(e) => write!(f, "Internal error: {}", e),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            AppError::Database(msg) => write!(f, "Database error: {}", msg),
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::RateLimited { retry_after_seconds } => {
                write!(f, "Rate limited. Retry after {} seconds", retry_after_seconds)
            }
            AppError::ValidationError { field, message } => {
                write!(f, "Validation error on field '{}': {}", field, message)
            }
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Internal(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, error_message, details) = match self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                let error_id = uuid::Uuid::new_v4();
                tracing::error!("Error ID: {}", error_id);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    Some(json!({ "error_id": error_id.to_string() })),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg, None),
            AppError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", msg, None)
            }
            AppError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                    Some(json!({ "details": msg })),
                )
            }
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "INVALID_INPUT", msg, None),
            AppError::RateLimited { retry_after_seconds } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                format!("Too many requests. Please retry after {} seconds", retry_after_seconds),
                Some(json!({ "retry_after_seconds": retry_after_seconds })),
            ),
            AppError::ValidationError { field, message } => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                format!("Validation failed for field '{}'", field),
                Some(json!({ "field": field, "message": message })),
            ),
        };

        let mut body = json!({
            "error": {
                "code": error_code,
                "message": error_message,
            },
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        if let Some(details) = details {
            body["error"]["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    AppError::Conflict(format!("Duplicate value: {}", db_err.message()))
                } else if db_err.is_foreign_key_violation() {
                    AppError::BadRequest(format!("Referenced record does not exist: {}", db_err.message()))
                } else {
                    AppError::Database(db_err.message().to_string())
                }
            }
            sqlx::Error::PoolTimedOut => {
                AppError::ServiceUnavailable("Database connection pool timed out".to_string())
            }
            _ => AppError::Database(err.to_string()),
        }
    }
}

impl From<NamingError> for AppError {
    fn from(err: NamingError) -> Self {
        AppError::ValidationError { field: "filename".to_string(), message: err.to_string() }
    }
}

/// A type alias for `Result<T, AppError>`, used throughout the application.
pub type AppResult<T> = Result<T, AppError>;

/// An extension trait for `Option` that provides a convenient way to convert
/// an `Option` to a `Result` with a `NotFound` error.
pub trait OptionExt<T> {
    /// Converts an `Option<T>` to a `Result<T, AppError>`.
    ///
    /// # Arguments
    ///
    /// * `entity` - A string describing the entity that was not found.
    fn ok_or_not_found(self, entity: &str) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, entity: &str) -> AppResult<T> {
        self.ok_or_else(|| AppError::NotFound(format!("{} not found", entity)))
    }
}

/// Field validation shared by the store and the configuration loader.
pub mod validation {
    use super::*;

    pub const MAX_USERNAME_LEN: usize = 150;
    pub const MAX_FAVORITE_NAME_LEN: usize = 32;
    pub const MAX_TITLE_LEN: usize = 128;
    pub const MAX_REMARK_LEN: usize = 1024;
    pub const MAX_TAG_NAME_LEN: usize = 16;

    fn invalid(field: &str, message: impl Into<String>) -> AppError {
        AppError::ValidationError { field: field.to_string(), message: message.into() }
    }

    /// Checks that a trimmed text field is non-empty and at most `max` characters long.
    pub fn validate_required_text(value: &str, field: &str, max: usize) -> AppResult<()> {
        if value.trim().is_empty() {
            return Err(invalid(field, format!("{} cannot be empty", field)));
        }
        validate_max_len(value, field, max)
    }

    pub fn validate_max_len(value: &str, field: &str, max: usize) -> AppResult<()> {
        let len = value.chars().count();
        if len > max {
            return Err(invalid(field, format!("Must be at most {} characters, got {}", max, len)));
        }
        if value.contains('\0') {
            return Err(invalid(field, "Contains null characters"));
        }
        Ok(())
    }

    /// Usernames follow the usual account rules: letters, digits and `@.+-_` only.
    pub fn validate_username(username: &str) -> AppResult<()> {
        validate_required_text(username, "username", MAX_USERNAME_LEN)?;
        if !username.chars().all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')) {
            return Err(invalid("username", "Only letters, digits and @/./+/-/_ are allowed"));
        }
        if username.chars().all(|c| c == '.') {
            return Err(invalid("username", "Username cannot consist of dots only"));
        }
        Ok(())
    }

    /// Bookmark URLs must be absolute http(s) URLs with a host.
    pub fn validate_url(value: &str) -> AppResult<()> {
        let parsed = url::Url::parse(value.trim())
            .map_err(|e| invalid("url", format!("Invalid URL: {}", e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("url", format!("Unsupported URL scheme: {}", parsed.scheme())));
        }
        if parsed.host_str().map(str::is_empty).unwrap_or(true) {
            return Err(invalid("url", "URL must contain a host"));
        }
        Ok(())
    }

    /// Validates that a paging value is positive.
    pub fn validate_positive_number(value: Option<i64>, field: &str) -> AppResult<()> {
        if let Some(v) = value {
            if v <= 0 {
                return Err(invalid(field, format!("Value must be positive, got {}", v)));
            }
        }
        Ok(())
    }
}
