//! Invocation Bridge
//!
//! Dispatches a named call to a bootstrap unit and wraps every failure,
//! including panics inside the target, with the call's name and arguments.

use std::panic::{catch_unwind, AssertUnwindSafe};

use pfunc_bootstrap::abi::panic_message;
use pfunc_bootstrap::BootstrapError;
use serde_json::Value;
use tracing::debug;

use super::arguments::Arguments;
use super::BootstrapUnit;
use crate::common::{AppError, AppResult};

/// Invoke `name` on `unit`. No retry is attempted.
pub fn dispatch(unit: &BootstrapUnit, name: &str, args: impl Into<Arguments>) -> AppResult<Value> {
    let args = args.into().into_vec();
    debug!("Invoking {} via {}", name, unit.type_name());

    let outcome = catch_unwind(AssertUnwindSafe(|| unit.invoke(name, args.clone())));
    let result = match outcome {
        Ok(result) => result,
        Err(panic) => Err(BootstrapError::Failed(panic_message(panic.as_ref()))),
    };

    result.map_err(|source| AppError::Invocation {
        name: name.to_string(),
        args,
        source,
    })
}
