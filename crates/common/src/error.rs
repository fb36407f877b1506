//! Error types for informes.

use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field name as it appears on the wire.
    pub field: String,
    /// Human readable reason.
    pub message: String,
}

/// Field-level validation failures collected before a write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    /// Create an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Record a rejected field.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Whether no field was rejected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the given field was rejected.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for e in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
            first = false;
        }
        Ok(())
    }
}

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    /// A directory entry or other record is missing.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No report with this ID.
    #[error("Report not found: {0}")]
    ReportNotFound(String),

    /// No authenticated identity.
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated, but not on the allow-list.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Allow-listed, but not an administrator.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Well-formed but refused, e.g. an admin removing themselves.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// One or more fields were rejected.
    #[error("Validation error: {0}")]
    Validation(FieldErrors),

    /// The email is already on the allow-list.
    #[error("Email already allowed: {0}")]
    DuplicateEmail(String),

    /// The rating for this report was already saved and can no longer change.
    #[error("Rating locked for report {0}")]
    RatingLocked(String),

    /// A uniqueness rule was hit while writing.
    #[error("Conflict: {0}")]
    Conflict(String),

    // === Server Errors ===
    /// The store failed or timed out. Retrying may succeed.
    #[error("Database error: {0}")]
    Database(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::NotFound(_) | Self::ReportNotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::AccessDenied(_) | Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::DuplicateEmail(_) | Self::RatingLocked(_) | Self::Conflict(_) => {
                StatusCode::CONFLICT
            }

            // 5xx Server Errors
            Self::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::ReportNotFound(_) => "REPORT_NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::AccessDenied(_) => "ACCESS_DENIED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::DuplicateEmail(_) => "DUPLICATE_EMAIL",
            Self::RatingLocked(_) => "RATING_LOCKED",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "TRANSIENT_STORE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Where the client should navigate after an access failure.
    ///
    /// Missing or rejected identities go back to the login page; a valid
    /// user lacking admin rights goes to the default authorized area.
    #[must_use]
    pub const fn redirect(&self) -> Option<&'static str> {
        match self {
            Self::Unauthorized | Self::AccessDenied(_) => Some("/login"),
            Self::Forbidden(_) => Some("/"),
            _ => None,
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Message safe to show to the client.
    fn public_message(&self) -> String {
        match self {
            Self::Database(_) => "The service is temporarily unavailable".to_string(),
            Self::Config(_) => "Internal server error".to_string(),
            Self::RatingLocked(_) => "Esta calificación ya no puede ser modificada.".to_string(),
            Self::AccessDenied(msg) | Self::Forbidden(msg) => msg.clone(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Log server errors
        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let mut error = json!({
            "code": code,
            "message": self.public_message(),
        });
        if let Self::Validation(fields) = &self {
            error["fields"] = json!(fields);
        }
        if let Some(redirect) = self.redirect() {
            error["redirect"] = json!(redirect);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, errors) in err.field_errors() {
            for e in errors {
                let message = e
                    .message
                    .as_ref()
                    .map_or_else(|| e.code.to_string(), ToString::to_string);
                fields.push(field.to_string(), message);
            }
        }
        Self::Validation(fields)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
