//! HTTP error dispatch
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Domain failures arrive as
//! [`AppError`] through `?`; extractor rejections are turned into protocol or validation
//! errors by the wrappers below. Each kind is converted exactly once, into a
//! [`ProblemDetails`] response.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::path::ErrorKind as PathErrorKind;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use backlog_core::validation::{violations_from, FieldViolation};
use backlog_core::{title_from_code, AppError, ErrorMetadata, FieldOrder, LogLevel};
use backlog_storage::{RejectReason, StorageError};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use validator::Validate;

use crate::problem::{build_problem, problem_type_uri};

/// Response header that overrides the title of a protocol problem.
pub static ERROR_TITLE_HEADER: HeaderName = HeaderName::from_static("x-error-title");

const HTTP_ERROR_CODE: &str = "http_error";
const VALIDATION_ERROR_CODE: &str = "validation_error";
/// Detail for errors whose message must stay in the logs.
const SENSITIVE_DETAIL: &str = "Internal server error";

/// Transport-level failure: unknown route, wrong method, oversized body, timeout.
#[derive(Debug, Clone)]
pub struct ProtocolError {
    pub status: StatusCode,
    pub detail: Option<String>,
    /// Extra response headers; `X-Error-Title` is consumed as the problem title.
    pub headers: HeaderMap,
}

impl ProtocolError {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            detail: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Request body or parameters did not match the expected shape.
#[derive(Debug, Clone, Default)]
pub struct RequestValidationError {
    pub errors: Vec<FieldViolation>,
}

#[derive(Debug)]
pub enum HttpAppError {
    Domain(AppError),
    Protocol(ProtocolError),
    Validation(RequestValidationError),
}

impl HttpAppError {
    pub fn protocol(status: StatusCode, detail: Option<String>) -> Self {
        HttpAppError::Protocol(ProtocolError {
            status,
            detail,
            headers: HeaderMap::new(),
        })
    }

    pub fn validation(errors: Vec<FieldViolation>) -> Self {
        HttpAppError::Validation(RequestValidationError { errors })
    }
}

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError::Domain(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError::Domain(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        HttpAppError::Domain(AppError::Internal(err.to_string()))
    }
}

impl From<ProtocolError> for HttpAppError {
    fn from(err: ProtocolError) -> Self {
        HttpAppError::Protocol(err)
    }
}

/// Map an upload policy rejection onto a domain error with its HTTP status.
pub fn upload_rejection(reason: RejectReason) -> AppError {
    let (status, detail) = match reason {
        RejectReason::TooBig => (413, "upload exceeds the maximum allowed size"),
        RejectReason::BadType => (415, "only PNG and JPEG images are accepted"),
        RejectReason::Collision => (409, "upload destination already exists"),
        RejectReason::SymlinkParent => (500, "upload directory failed safety checks: symlink_parent"),
        RejectReason::MissingBase => (500, "upload directory failed safety checks: missing_base"),
        RejectReason::PathTraversal => {
            (500, "upload directory failed safety checks: path_traversal")
        }
    };
    AppError::UploadRejected {
        code: reason.as_str(),
        status,
        detail: detail.to_string(),
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error.detailed_message(), error_type = error_type, "Error occurred");
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        match self {
            HttpAppError::Domain(err) => {
                log_error(&err);
                let status = StatusCode::from_u16(err.http_status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                let code = err.error_code();
                let title = err
                    .title()
                    .map(str::to_string)
                    .unwrap_or_else(|| title_from_code(&code));
                let detail = if err.is_sensitive() {
                    SENSITIVE_DETAIL.to_string()
                } else {
                    err.client_message()
                };
                build_problem(status, title, detail, problem_type_uri(&code), None)
                .into_response()
            }
            HttpAppError::Protocol(ProtocolError {
                status,
                detail,
                mut headers,
            }) => {
                if status.is_server_error() {
                    tracing::warn!(status = status.as_u16(), detail = ?detail, "Protocol error");
                } else {
                    tracing::debug!(status = status.as_u16(), detail = ?detail, "Protocol error");
                }
                let title = headers
                    .remove(&ERROR_TITLE_HEADER)
                    .and_then(|v| v.to_str().ok().map(str::to_string))
                    .unwrap_or_else(|| title_from_code(HTTP_ERROR_CODE));
                let detail = detail.unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("HTTP error")
                        .to_string()
                });

                let mut response = build_problem(
                    status,
                    title,
                    detail,
                    problem_type_uri(HTTP_ERROR_CODE),
                    None,
                )
                .into_response();
                for (name, value) in headers.iter() {
                    response
                        .headers_mut()
                        .entry(name.clone())
                        .or_insert(value.clone());
                }
                response
            }
            HttpAppError::Validation(RequestValidationError { errors }) => {
                tracing::debug!(error_count = errors.len(), "Request validation failed");
                let detail = errors
                    .first()
                    .map(|e| e.msg.clone())
                    .unwrap_or_else(|| "Invalid payload".to_string());

                let extras = if errors.is_empty() {
                    None
                } else {
                    let mut extras = Map::new();
                    extras.insert(
                        "errors".to_string(),
                        serde_json::to_value(&errors).unwrap_or(Value::Array(Vec::new())),
                    );
                    Some(extras)
                };

                build_problem(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "Validation Error",
                    detail,
                    problem_type_uri(VALIDATION_ERROR_CODE),
                    extras,
                )
                .into_response()
            }
        }
    }
}

const JSON_DATA_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";
const QUERY_PREFIX: &str = "Failed to deserialize query string: ";

/// Turn a serde data error into a violation without echoing the offending value.
///
/// The text has the form `[path: ]message[ at line L column C]`; only the path and the
/// kind of mismatch are kept.
fn violation_from_serde_text(root: &str, text: &str) -> FieldViolation {
    let (path, message) = match text.split_once(": ") {
        Some((path, rest)) if !path.is_empty() && !path.contains(' ') => (Some(path), rest),
        _ => (None, text),
    };

    let mut loc = vec![root.to_string()];
    if let Some(path) = path {
        loc.extend(
            path.split('.')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string),
        );
    }

    if let Some(field) = message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
    {
        loc.push(field.to_string());
        return FieldViolation::new("missing", loc, "Field required");
    }

    let (kind, msg) = if message.contains("expected a string") {
        ("string_type", "Input should be a valid string")
    } else if message.contains("expected a boolean") {
        ("bool_type", "Input should be a valid boolean")
    } else if ["expected i", "expected u", "expected an integer"]
        .iter()
        .any(|needle| message.contains(needle))
    {
        ("int_type", "Input should be a valid integer")
    } else if message.contains("expected f") || message.contains("expected a number") {
        ("float_type", "Input should be a valid number")
    } else if path.is_none() {
        (
            "model_attributes_type",
            "Input should be a valid dictionary or object to extract fields from",
        )
    } else {
        ("value_error", "Input is not a valid value")
    };
    FieldViolation::new(kind, loc, msg)
}

impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                let text = err.body_text();
                let text = text.strip_prefix(JSON_DATA_PREFIX).unwrap_or(&text);
                HttpAppError::validation(vec![violation_from_serde_text("body", text)])
            }
            JsonRejection::JsonSyntaxError(_) => HttpAppError::validation(vec![FieldViolation::new(
                "json_invalid",
                vec!["body".to_string()],
                "JSON decode error",
            )]),
            other => HttpAppError::protocol(other.status(), Some(other.body_text())),
        }
    }
}

/// Reader-facing name for a Rust type in a path parse failure.
fn expected_kind(type_name: &str) -> &'static str {
    let short = type_name.rsplit("::").next().unwrap_or(type_name);
    match short {
        "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
        | "u128" | "usize" => "integer",
        "f32" | "f64" => "number",
        "bool" => "boolean",
        "Uuid" => "UUID",
        _ => "value",
    }
}

impl From<PathRejection> for HttpAppError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(err) => {
                let violation = match err.kind() {
                    PathErrorKind::ParseErrorAtKey {
                        key,
                        value,
                        expected_type,
                    } => {
                        let mut violation = FieldViolation::new(
                            "parsing",
                            vec!["path".to_string(), key.clone()],
                            format!("Input should be a valid {}", expected_kind(expected_type)),
                        );
                        violation.input = Some(Value::String(value.clone()));
                        violation
                    }
                    PathErrorKind::ParseError {
                        value,
                        expected_type,
                    } => {
                        let mut violation = FieldViolation::new(
                            "parsing",
                            vec!["path".to_string()],
                            format!("Input should be a valid {}", expected_kind(expected_type)),
                        );
                        violation.input = Some(Value::String(value.clone()));
                        violation
                    }
                    _ => FieldViolation::new(
                        "parsing",
                        vec!["path".to_string()],
                        "Input should be a valid path parameter",
                    ),
                };
                HttpAppError::validation(vec![violation])
            }
            other => HttpAppError::protocol(other.status(), Some(other.body_text())),
        }
    }
}

impl From<QueryRejection> for HttpAppError {
    fn from(rejection: QueryRejection) -> Self {
        match rejection {
            QueryRejection::FailedToDeserializeQueryString(err) => {
                let text = err.body_text();
                let text = text.strip_prefix(QUERY_PREFIX).unwrap_or(&text);
                HttpAppError::validation(vec![violation_from_serde_text("query", text)])
            }
            other => HttpAppError::protocol(other.status(), Some(other.body_text())),
        }
    }
}

/// JSON body extractor that also runs `validator` rules.
///
/// Violations are reported in the body's declared field order.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + FieldOrder + Send,
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpAppError::from)?;
        inner
            .validate()
            .map_err(|errors| HttpAppError::validation(violations_from(&errors, T::FIELDS)))?;
        Ok(ValidatedJson(inner))
    }
}

/// Path extractor whose parse failures are request validation errors.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(inner) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedPath(inner))
    }
}

/// Query extractor whose parse failures are request validation errors.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(inner) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedQuery(inner))
    }
}
