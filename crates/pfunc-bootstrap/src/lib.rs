//! pfunc Bootstrap Contract
//!
//! The entry-point pair every function module exposes to a pfunc host:
//! `invoke(name, args) -> value` and `function_metadata() -> [FunctionInfo]`.
//!
//! Modules either link this crate and register themselves in the compiled-in
//! registry ([`StaticModule`]), or are built as shared libraries and export the
//! C ABI entry points generated by [`export_bootstrap!`] and [`export_manifest!`].

pub mod abi;
pub mod builtin;
pub mod contract;
pub mod info;

pub use builtin::StaticModule;
pub use contract::{argument, required_argument, Bootstrap, BootstrapError};
pub use info::{FunctionInfo, ParameterInfo, TypeTag};

/// Re-exported so the export macros and callers agree on one JSON value type.
pub use serde_json::Value;

#[doc(hidden)]
pub use inventory;
