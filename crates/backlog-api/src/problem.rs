//! RFC 7807 problem responses
//!
//! Every error leaving the service is rendered through [`build_problem`], which stamps a
//! fresh correlation id and scrubs echoed user input out of the extension members.

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

pub const PROBLEM_BASE_URI: &str = "https://problems.secdev.local/";
pub const PROBLEM_JSON: &str = "application/problem+json";
pub static CORRELATION_ID_HEADER: HeaderName = HeaderName::from_static("x-correlation-id");

/// Correlation id of a rendered problem, stored in the response extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(pub Uuid);

/// Removes denied mapping keys at any depth of a JSON value.
#[derive(Debug, Clone)]
pub struct KeyScrubber {
    denied: Vec<String>,
}

impl Default for KeyScrubber {
    fn default() -> Self {
        Self::new(["input"])
    }
}

impl KeyScrubber {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            denied: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn scrub(&self, value: Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(self.scrub_map(map)),
            Value::Array(items) => Value::Array(items.into_iter().map(|v| self.scrub(v)).collect()),
            scalar => scalar,
        }
    }

    pub fn scrub_map(&self, map: Map<String, Value>) -> Map<String, Value> {
        map.into_iter()
            .filter(|(key, _)| !self.denied.iter().any(|d| d == key))
            .map(|(key, value)| (key, self.scrub(value)))
            .collect()
    }
}

/// RFC 7807 body with a correlation id and optional extension members
#[derive(Debug, Clone, Serialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub correlation_id: Uuid,
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

/// Build a problem with the default scrubber.
pub fn build_problem(
    status: StatusCode,
    title: impl Into<String>,
    detail: impl Into<String>,
    problem_type: impl Into<String>,
    extras: Option<Map<String, Value>>,
) -> ProblemDetails {
    build_problem_with(&KeyScrubber::default(), status, title, detail, problem_type, extras)
}

pub fn build_problem_with(
    scrubber: &KeyScrubber,
    status: StatusCode,
    title: impl Into<String>,
    detail: impl Into<String>,
    problem_type: impl Into<String>,
    extras: Option<Map<String, Value>>,
) -> ProblemDetails {
    ProblemDetails {
        problem_type: problem_type.into(),
        title: title.into(),
        status: status.as_u16(),
        detail: detail.into(),
        correlation_id: Uuid::new_v4(),
        extras: extras.map(|m| scrubber.scrub_map(m)).unwrap_or_default(),
    }
}

/// `https://problems.secdev.local/{code}`
pub fn problem_type_uri(code: &str) -> String {
    format!("{}{}", PROBLEM_BASE_URI, code)
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let correlation_id = self.correlation_id;

        let mut response = match serde_json::to_vec(&self) {
            Ok(body) => (
                status,
                [(header::CONTENT_TYPE, HeaderValue::from_static(PROBLEM_JSON))],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize problem details");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        };

        if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
            response
                .headers_mut()
                .entry(CORRELATION_ID_HEADER.clone())
                .or_insert(value);
        }
        response
            .extensions_mut()
            .insert(CorrelationId(correlation_id));
        response
    }
}
