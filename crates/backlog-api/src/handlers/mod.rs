pub mod health;
pub mod items;
pub mod uploads;

use axum::http::StatusCode;

use crate::error::HttpAppError;

/// Router fallback for unknown paths
pub async fn not_found() -> HttpAppError {
    HttpAppError::protocol(StatusCode::NOT_FOUND, None)
}
