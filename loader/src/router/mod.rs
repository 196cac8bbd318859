//! Function Router
//!
//! Bootstrap units and the registered functions that route calls to them.

pub mod arguments;
pub mod dispatcher;

use std::fmt;
use std::sync::Arc;

use pfunc_bootstrap::{Bootstrap, BootstrapError, FunctionInfo};
use serde_json::Value;

use crate::common::AppResult;
use crate::manifest::Manifest;
use crate::registry::FunctionDescriptor;
use crate::scope::Scope;

pub use arguments::Arguments;
pub use dispatcher::dispatch;

/// A loaded module's entry-point pair, bound from one manifest resource.
///
/// Lives as long as any function it backs; keeps its scope alive.
pub struct BootstrapUnit {
    scope: Arc<Scope>,
    origin: String,
    type_name: String,
    manifest: Manifest,
    entry: Arc<dyn Bootstrap>,
}

impl BootstrapUnit {
    pub fn new(
        scope: Arc<Scope>,
        origin: String,
        type_name: String,
        manifest: Manifest,
        entry: Arc<dyn Bootstrap>,
    ) -> Self {
        Self {
            scope,
            origin,
            type_name,
            manifest,
            entry,
        }
    }

    pub fn scope(&self) -> &Arc<Scope> {
        &self.scope
    }

    /// Where the unit's manifest came from.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// The bound invoke entry point, without normalisation or wrapping.
    pub fn invoke(&self, name: &str, args: Vec<Value>) -> Result<Value, BootstrapError> {
        self.entry.invoke(name, &args)
    }

    /// The bound metadata entry point.
    pub fn metadata(&self) -> Result<Vec<FunctionInfo>, BootstrapError> {
        self.entry.function_metadata()
    }
}

impl fmt::Debug for BootstrapUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapUnit")
            .field("origin", &self.origin)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// A descriptor bound to the unit that implements it
#[derive(Debug, Clone)]
pub struct RegisteredFunction {
    descriptor: FunctionDescriptor,
    unit: Arc<BootstrapUnit>,
}

impl RegisteredFunction {
    pub fn new(descriptor: FunctionDescriptor, unit: Arc<BootstrapUnit>) -> Self {
        Self { descriptor, unit }
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Metadata captured at registration time.
    pub fn metadata(&self) -> &FunctionDescriptor {
        &self.descriptor
    }

    pub fn unit(&self) -> &Arc<BootstrapUnit> {
        &self.unit
    }

    /// Invoke this function. `null` means no arguments and a bare value is
    /// passed as the single argument.
    pub fn invoke(&self, args: impl Into<Arguments>) -> AppResult<Value> {
        dispatch(&self.unit, self.name(), args)
    }
}

impl fmt::Display for RegisteredFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {}", self.descriptor.prototype(), self.unit.origin())
    }
}
