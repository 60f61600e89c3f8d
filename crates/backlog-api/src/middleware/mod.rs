pub mod correlation;
pub mod security_headers;

pub use correlation::{correlation_middleware, make_request_span, panic_response};
pub use security_headers::security_headers_middleware;
