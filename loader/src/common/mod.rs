//! Common Utilities
//!
//! Shared error handling, path helpers and the HTTP client.

pub mod error;
pub mod http;
pub mod paths;
pub mod result;

pub use error::{AppError, ErrorCode};
pub use http::create_http_client;
pub use result::AppResult;
