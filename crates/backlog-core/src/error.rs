//! Error types module
//!
//! All domain failures are unified under the `AppError` enum. Every variant carries a
//! machine-readable code and an HTTP status through [`ErrorMetadata`], so the HTTP
//! boundary can render any of them as a problem response without matching on variants.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

use std::borrow::Cow;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for misuse such as failed authentication
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "not_found"), appended to the problem type URI
    fn error_code(&self) -> Cow<'_, str>;

    /// Explicit problem title; `None` derives the title from the code
    fn title(&self) -> Option<&str> {
        None
    }

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether the internal message must never reach the client
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Authentication not configured: {0}")]
    AuthNotConfigured(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upload rejected ({code}): {detail}")]
    UploadRejected {
        code: &'static str,
        status: u16,
        detail: String,
    },

    /// Explicit application-level failure with its own code and status.
    #[error("{code}: {detail}")]
    Api {
        code: Cow<'static, str>,
        detail: String,
        status: u16,
        title: Option<String>,
    },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// Build an explicit domain error; the title defaults to the title-cased code.
    pub fn api(code: impl Into<Cow<'static, str>>, detail: impl Into<String>, status: u16) -> Self {
        AppError::Api {
            code: code.into(),
            detail: detail.into(),
            status,
            title: None,
        }
    }

    /// Override the problem title of an [`AppError::Api`]; other variants are unchanged.
    pub fn with_title(self, new_title: impl Into<String>) -> Self {
        match self {
            AppError::Api {
                code,
                detail,
                status,
                ..
            } => AppError::Api {
                code,
                detail,
                status,
                title: Some(new_title.into()),
            },
            other => other,
        }
    }

    /// Get the error type name for logs
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Database(_) => "Database",
            AppError::NotFound(_) => "NotFound",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::AuthNotConfigured(_) => "AuthNotConfigured",
            AppError::Validation(_) => "Validation",
            AppError::UploadRejected { .. } => "UploadRejected",
            AppError::Api { .. } => "Api",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

/// Static metadata for each variant: (http_status, error_code, sensitive, log_level).
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        AppError::Database(_) => (500, "database_error", true, LogLevel::Error),
        AppError::NotFound(_) => (404, "not_found", false, LogLevel::Debug),
        AppError::Unauthorized(_) => (401, "not_authorized", false, LogLevel::Warn),
        AppError::AuthNotConfigured(_) => (500, "auth_not_configured", false, LogLevel::Error),
        AppError::Validation(_) => (422, "validation_error", false, LogLevel::Debug),
        AppError::UploadRejected { code, status, .. } => {
            let level = if *status >= 500 {
                LogLevel::Error
            } else {
                LogLevel::Debug
            };
            (*status, *code, false, level)
        }
        AppError::Api { status, .. } => {
            let level = if *status >= 500 {
                LogLevel::Error
            } else {
                LogLevel::Debug
            };
            (*status, "api_error", false, level)
        }
        AppError::Internal(_) => (500, "internal_error", true, LogLevel::Error),
        AppError::InternalWithSource { .. } => (500, "internal_error", true, LogLevel::Error),
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> Cow<'_, str> {
        match self {
            AppError::Api { code, .. } => Cow::Borrowed(code.as_ref()),
            other => Cow::Borrowed(app_error_static_metadata(other).1),
        }
    }

    fn title(&self) -> Option<&str> {
        match self {
            AppError::Api { title, .. } => title.as_deref(),
            _ => None,
        }
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::AuthNotConfigured(ref msg) => msg.clone(),
            AppError::Validation(ref msg) => msg.clone(),
            AppError::UploadRejected { ref detail, .. } => detail.clone(),
            AppError::Api { ref detail, .. } => detail.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }
}

/// Turn a machine code into a problem title: `not_found` becomes `Not Found`.
pub fn title_from_code(code: &str) -> String {
    code.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_database() {
        #[cfg(feature = "sqlx")]
        let err = AppError::from(sqlx::Error::PoolClosed);
        #[cfg(not(feature = "sqlx"))]
        let err = AppError::Database("pool closed".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "database_error");
        assert_eq!(err.client_message(), "Failed to access database");
        assert!(err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_error_metadata_not_found() {
        let err = AppError::NotFound("item not found".to_string());
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_code(), "not_found");
        assert_eq!(err.client_message(), "item not found");
        assert!(!err.is_sensitive());
        assert_eq!(err.title(), None);
    }

    #[test]
    fn test_explicit_api_error_keeps_code_and_title() {
        let err = AppError::api("quota_exceeded", "too many items", 429).with_title("Slow Down");
        assert_eq!(err.http_status_code(), 429);
        assert_eq!(err.error_code(), "quota_exceeded");
        assert_eq!(err.title(), Some("Slow Down"));
        assert_eq!(err.client_message(), "too many items");
    }

    #[test]
    fn test_internal_errors_hide_their_message() {
        let err = AppError::Internal("disk /var/lib/backlog exploded".to_string());
        assert_eq!(err.client_message(), "Internal server error");
        assert!(err.is_sensitive());
    }

    #[test]
    fn test_title_from_code() {
        assert_eq!(title_from_code("not_found"), "Not Found");
        assert_eq!(title_from_code("http_error"), "Http Error");
        assert_eq!(title_from_code("auth_not_configured"), "Auth Not Configured");
        assert_eq!(title_from_code("validation_error"), "Validation Error");
        assert_eq!(title_from_code("TOO_big"), "Too Big");
    }
}
