//! pfunc loader
//!
//! Discovers modules through manifest resources, registers the functions they
//! offer by name and invokes them with positional arguments. Modules come from
//! the binary itself, from literal locations, or from artifact coordinates
//! resolved against Maven-style repositories.

pub mod common;
pub mod config;
pub mod library;
pub mod manifest;
pub mod registry;
pub mod resolver;
pub mod router;
pub mod scope;

pub use common::{AppError, AppResult, ErrorCode};
pub use config::{Config, ResolverConfig};
pub use library::{init, LibraryEntry, LibraryLoader, LibraryManifest};
pub use manifest::{scan, Manifest};
pub use registry::{FunctionDescriptor, FunctionRegistry, ParameterDescriptor, Registration, Rejected};
pub use resolver::{ArtifactCoordinate, DependencyResolver, RemoteRepository, ResolveError};
pub use router::{Arguments, BootstrapUnit, RegisteredFunction};
pub use scope::{Linker, ModuleLoader, ModuleSource, Scope};

pub use pfunc_bootstrap::{Bootstrap, BootstrapError, FunctionInfo, ParameterInfo, TypeTag};

/// Crate-level alias for [`AppError`]
pub type Error = AppError;
