//! HTTP Client Utilities
//!
//! Shared HTTP client creation with consistent configuration.

/// Create a reqwest HTTP client for repository downloads.
///
/// No request timeout is set: a stalled repository blocks the resolution
/// waiting on it.
pub fn create_http_client() -> Result<reqwest::Client, String> {
    reqwest::Client::builder()
        .user_agent(concat!("pfunc/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {}", e))
}
