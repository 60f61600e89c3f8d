//! Backlog API Library
//!
//! This crate provides the HTTP handlers, problem-response pipeline, middleware and
//! application setup for the backlog service.

mod api_doc;
mod handlers;
mod middleware;
mod telemetry;

pub mod auth;
pub mod error;
pub mod problem;
pub mod setup;
pub mod state;

// Re-exports
pub use error::HttpAppError;
pub use problem::{build_problem, KeyScrubber, ProblemDetails, CORRELATION_ID_HEADER};
pub use state::AppState;
