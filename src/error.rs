use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

/// Why a registration was turned away. Every variant ends in a redirect back
/// to the form; none of them is fatal.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("All fields are required")]
    MissingFields,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Invalid birthday format")]
    InvalidDateFormat,
    #[error("Email already exists")]
    DuplicateEmail,
    #[error("Database error")]
    Persistence(#[source] anyhow::Error),
}

impl RegistrationError {
    /// Stable identifier carried in the flash cookie.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingFields => "missing_fields",
            Self::PasswordMismatch => "password_mismatch",
            Self::InvalidDateFormat => "invalid_date_format",
            Self::DuplicateEmail => "duplicate_email",
            Self::Persistence(_) => "persistence_error",
        }
    }

    /// Human-readable text for a flash code, `None` for anything unknown.
    pub fn message_for_code(code: &str) -> Option<&'static str> {
        Some(match code {
            "missing_fields" => "All fields are required",
            "password_mismatch" => "Passwords do not match",
            "invalid_date_format" => "Invalid birthday format",
            "duplicate_email" => "Email already exists",
            "persistence_error" => "Database error",
            _ => return None,
        })
    }
}

/// Errors for the read-only pages.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Storage(e) => {
                tracing::error!(error = %format!("{e:#}"), "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html("<h1>Internal server error</h1>"),
                )
                    .into_response()
            }
        }
    }
}
