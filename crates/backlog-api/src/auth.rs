//! Shared-secret authentication for mutating endpoints

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use backlog_core::AppError;
use subtle::ConstantTimeEq;

use crate::error::HttpAppError;
use crate::state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Constant-time string comparison
fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Extractor that admits a request only when `X-API-Key` matches the configured token.
#[derive(Debug, Clone, Copy)]
pub struct ApiTokenGuard;

impl FromRequestParts<Arc<AppState>> for ApiTokenGuard {
    type Rejection = HttpAppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let expected = state.security.api_token.as_deref().ok_or_else(|| {
            AppError::AuthNotConfigured("API token not configured".to_string())
        })?;

        let provided = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok());

        match provided {
            Some(token) if secure_compare(token, expected) => Ok(ApiTokenGuard),
            _ => Err(AppError::Unauthorized("missing or invalid API token".to_string()).into()),
        }
    }
}
