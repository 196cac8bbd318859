//! Common Error Types
//!
//! The error taxonomy surfaced by discovery, lookup, resolution and invocation.

use pfunc_bootstrap::BootstrapError;
use serde_json::Value;

use crate::resolver::ResolveError;

/// Coarse classification of an [`AppError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Configuration,
    NotFound,
    Resolution,
    Invocation,
    Io,
}

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A manifest or entry point is malformed or missing required operations.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No such function: {0}")]
    NotFound(String),

    /// A coordinate batch could not be resolved; nothing from the batch is used.
    #[error("Resolution failed: {0}")]
    Resolution(#[from] ResolveError),

    #[error("Could not invoke {name}{} due to: {source}", render_args(.args))]
    Invocation {
        name: String,
        args: Vec<Value>,
        #[source]
        source: BootstrapError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Configuration(_) => ErrorCode::Configuration,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::Resolution(_) => ErrorCode::Resolution,
            AppError::Invocation { .. } => ErrorCode::Invocation,
            AppError::Io(_) => ErrorCode::Io,
        }
    }
}

/// Render positional arguments as `[a, b]` for diagnostics
pub fn render_args(args: &[Value]) -> String {
    let parts: Vec<String> = args.iter().map(Value::to_string).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invocation_message() {
        let err = AppError::Invocation {
            name: "helloWorld".to_string(),
            args: vec![json!("James"), json!(1)],
            source: BootstrapError::failed("boom"),
        };
        assert_eq!(err.to_string(), "Could not invoke helloWorld[\"James\", 1] due to: boom");
        assert_eq!(err.code(), ErrorCode::Invocation);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_codes() {
        assert_eq!(AppError::NotFound("f".into()).code(), ErrorCode::NotFound);
        assert_eq!(AppError::configuration("bad").code(), ErrorCode::Configuration);
    }
}
