//! Entry-Point Contract
//!
//! The structural contract a module's bootstrap type fulfils.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::info::{FunctionInfo, TypeTag};

/// Errors raised by a bootstrap implementation or across the ABI boundary
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BootstrapError {
    #[error("Function does not exist: {0}")]
    UnknownFunction(String),

    #[error("Argument {index} is not a {expected} but is {found}")]
    InvalidArgument {
        index: usize,
        expected: TypeTag,
        found: String,
    },

    #[error("{0}")]
    Failed(String),

    #[error("ABI error: {0}")]
    Abi(String),
}

impl BootstrapError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// A module's entry point.
///
/// `invoke` dispatches a function by name with positional arguments;
/// `function_metadata` describes every function the module offers. Both may
/// be called concurrently from many threads.
pub trait Bootstrap: Send + Sync {
    fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, BootstrapError>;

    fn function_metadata(&self) -> Result<Vec<FunctionInfo>, BootstrapError>;
}

/// Read the positional argument at `index` as `T`.
///
/// Missing and `null` arguments yield `None` so implementations can apply
/// their own defaults.
pub fn argument<T: DeserializeOwned>(args: &[Value], index: usize) -> Result<Option<T>, BootstrapError> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|_| BootstrapError::InvalidArgument {
                index,
                expected: TypeTag::of::<T>(),
                found: describe(value),
            }),
    }
}

/// Like [`argument`] but a missing argument is an error.
pub fn required_argument<T: DeserializeOwned>(args: &[Value], index: usize) -> Result<T, BootstrapError> {
    argument(args, index)?.ok_or_else(|| BootstrapError::InvalidArgument {
        index,
        expected: TypeTag::of::<T>(),
        found: "nothing".to_string(),
    })
}

fn describe(value: &Value) -> String {
    format!("{} {}", TypeTag::of_value(value), value)
}
