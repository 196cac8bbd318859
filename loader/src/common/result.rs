//! Common Result Type
//!
//! Type alias for application results.

use super::error::AppError;

/// Application result type
pub type AppResult<T> = Result<T, AppError>;
