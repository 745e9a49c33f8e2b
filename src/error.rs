//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Services return `AppError` values and the HTTP boundary performs a single match from
//! variant to status code, rendering every failure through the same JSON envelope:
//!
//! ```json
//! { "error": { "code": "NOT_FOUND", "message": "Project not found" } }
//! ```
//!
//! Validation failures additionally carry a `details` array of `{ path, message }` entries.
//! Internal failures are logged server-side and answered with a generic message.

use actix_web::{
    error::{JsonPayloadError, PathError, QueryPayloadError, ResponseError},
    http::StatusCode,
    HttpRequest, HttpResponse,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::ValidationErrors;

/// A single invalid input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted path of the offending field, empty for struct-level rules.
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Body of the uniform error envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// `{ "error": { ... } }`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Malformed or missing input (HTTP 400), with per-field details.
    Validation(Vec<FieldError>),
    /// Missing or malformed credential on a protected route (HTTP 401).
    Unauthorized(String),
    /// Unknown email or wrong password. Both cases render identically (HTTP 401).
    InvalidCredentials,
    /// Bad signature, malformed or expired token. Never distinguishes the cause (HTTP 401).
    InvalidToken,
    /// A verified refresh token whose account no longer exists (HTTP 401).
    UserNotFound,
    /// Request `Origin` outside the configured allow-list (HTTP 403).
    CorsForbidden,
    /// Resource absent or not owned by the caller (HTTP 404).
    NotFound(String),
    /// Registration with an email that is already taken (HTTP 409).
    EmailAlreadyInUse,
    /// Unexpected server-side failure (HTTP 500).
    InternalServerError(String),
    /// Failure reported by the database driver (HTTP 500).
    DatabaseError(String),
}

impl AppError {
    /// Stable machine-readable code placed in the envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Unauthorized(_)
            | AppError::InvalidCredentials
            | AppError::InvalidToken
            | AppError::UserNotFound => "UNAUTHORIZED",
            AppError::CorsForbidden => "CORS_FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::EmailAlreadyInUse => "EMAIL_ALREADY_IN_USE",
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                "INTERNAL_SERVER_ERROR"
            }
        }
    }

    /// Client-facing message. Internal details never leave the process.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(_) => "Validation failed".into(),
            AppError::Unauthorized(msg) | AppError::NotFound(msg) => msg.clone(),
            AppError::InvalidCredentials => "Invalid credentials".into(),
            AppError::InvalidToken => "Invalid or expired token".into(),
            AppError::UserNotFound => "User not found".into(),
            AppError::CorsForbidden => "CORS forbidden for this origin".into(),
            AppError::EmailAlreadyInUse => "Email already in use".into(),
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                "Internal server error".into()
            }
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        let details = match self {
            AppError::Validation(details) => Some(details.clone()),
            _ => None,
        };
        ErrorEnvelope {
            error: ErrorBody {
                code: self.code().to_string(),
                message: self.public_message(),
                details,
            },
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Validation(details) => {
                write!(f, "Validation Error: {} invalid field(s)", details.len())
            }
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::InvalidCredentials => write!(f, "Unauthorized: invalid credentials"),
            AppError::InvalidToken => write!(f, "Unauthorized: invalid or expired token"),
            AppError::UserNotFound => write!(f, "Unauthorized: user not found"),
            AppError::CorsForbidden => write!(f, "Forbidden: origin not allowed"),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::EmailAlreadyInUse => write!(f, "Conflict: email already in use"),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts `AppError` variants into enveloped JSON responses.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_)
            | AppError::InvalidCredentials
            | AppError::InvalidToken
            | AppError::UserNotFound => StatusCode::UNAUTHORIZED,
            AppError::CorsForbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmailAlreadyInUse => StatusCode::CONFLICT,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
        }
        HttpResponse::build(status).json(self.envelope())
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` becomes `NotFound`; everything else is a database failure.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

/// Converts `validator::ValidationErrors` into per-field details.
///
/// Paths use the JSON key (`pageSize`, not `page_size`). Struct-level rules (reported by
/// `validator` under `__all__`) get an empty path.
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> AppError {
        let mut details: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                let path = if field == "__all__" {
                    String::new()
                } else {
                    wire_name(field)
                };
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", e.code));
                    FieldError::new(path.clone(), message)
                })
            })
            .collect();
        details.sort_by(|a, b| a.path.cmp(&b.path));
        AppError::Validation(details)
    }
}

/// Request DTOs are `rename_all = "camelCase"`, so a Rust field maps to its JSON key this way.
fn wire_name(field: &str) -> String {
    let mut name = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = !name.is_empty();
        } else if upper {
            name.extend(c.to_uppercase());
            upper = false;
        } else {
            name.push(c);
        }
    }
    name
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(_: jsonwebtoken::errors::Error) -> AppError {
        AppError::InvalidToken
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

/// `JsonConfig` error handler: unparseable or unexpected body fields.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(vec![FieldError::new("body", err.to_string())]).into()
}

/// `QueryConfig` error handler.
pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(vec![FieldError::new("query", err.to_string())]).into()
}

/// `PathConfig` error handler. All path parameters in this API are UUIDs.
pub fn path_error_handler(_err: PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(vec![FieldError::new("id", "Invalid id (uuid expected)")]).into()
}
