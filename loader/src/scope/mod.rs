//! Loading Scopes
//!
//! A scope is an isolated set of module locations layered over a parent
//! scope. Locations are opened lazily through a [`Linker`]; resource lookups
//! see the parent's resources before local ones, type lookups search local
//! sources before falling back to the parent.

pub mod builtin;
pub mod native;

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use pfunc_bootstrap::{Bootstrap, StaticModule};
use tracing::{debug, warn};
use url::Url;

use crate::common::{AppError, AppResult};

pub use builtin::StaticSource;
pub use native::{DirectoryModule, NativeBootstrap, NativeLinker, NativeModule};

/// One opened module location
pub trait ModuleSource: Send + Sync {
    /// Human-readable origin, used in logs and registration reports.
    fn origin(&self) -> &str;

    /// Text of the named resource, `None` when this source does not have it.
    fn resource(&self, name: &str) -> AppResult<Option<String>>;

    /// Bound entry point for `type_name`, `None` when the type is not defined here.
    fn entry_point(&self, type_name: &str) -> AppResult<Option<Arc<dyn Bootstrap>>>;
}

/// Opens module locations
pub trait Linker: Send + Sync {
    fn open(&self, location: &Url) -> AppResult<Arc<dyn ModuleSource>>;
}

/// A resource found in a scope, with the source that supplied it
#[derive(Clone)]
pub struct Resource {
    pub name: String,
    pub text: String,
    pub source: Arc<dyn ModuleSource>,
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("origin", &self.source.origin())
            .finish()
    }
}

pub struct Scope {
    parent: Option<Arc<Scope>>,
    locations: Vec<Url>,
    linker: Option<Arc<dyn Linker>>,
    sources: OnceCell<Vec<Arc<dyn ModuleSource>>>,
}

impl Scope {
    /// A root scope with nothing in it
    pub fn empty() -> Arc<Self> {
        Self::from_sources(None, Vec::new())
    }

    /// A root scope exposing every module compiled into this binary
    pub fn builtin() -> Arc<Self> {
        let sources = StaticModule::all()
            .map(|module| Arc::new(StaticSource::from_module(module)) as Arc<dyn ModuleSource>)
            .collect();
        Self::from_sources(None, sources)
    }

    /// A scope over already-opened sources
    pub fn from_sources(parent: Option<Arc<Scope>>, sources: Vec<Arc<dyn ModuleSource>>) -> Arc<Self> {
        Arc::new(Self {
            parent,
            locations: Vec::new(),
            linker: None,
            sources: OnceCell::with_value(sources),
        })
    }

    pub fn parent(&self) -> Option<&Arc<Scope>> {
        self.parent.as_ref()
    }

    pub fn locations(&self) -> &[Url] {
        &self.locations
    }

    /// Local sources, opening the locations on first use.
    ///
    /// A location that cannot be opened is skipped; any type it would have
    /// provided surfaces as missing when requested.
    pub fn sources(&self) -> &[Arc<dyn ModuleSource>] {
        self.sources.get_or_init(|| {
            let Some(linker) = &self.linker else {
                return Vec::new();
            };
            let mut sources = Vec::with_capacity(self.locations.len());
            for location in &self.locations {
                match linker.open(location) {
                    Ok(source) => {
                        debug!("Opened module location {}", location);
                        sources.push(source);
                    }
                    Err(e) => warn!("Failed to open module location {}: {}", location, e),
                }
            }
            sources
        })
    }

    /// Every resource named `name` visible in this scope, parent's first.
    pub fn resources(&self, name: &str) -> AppResult<Vec<Resource>> {
        let mut resources = match &self.parent {
            Some(parent) => parent.resources(name)?,
            None => Vec::new(),
        };
        for source in self.sources() {
            if let Some(text) = source.resource(name)? {
                resources.push(Resource {
                    name: name.to_string(),
                    text,
                    source: Arc::clone(source),
                });
            }
        }
        Ok(resources)
    }

    /// Resolve a bootstrap type by name, falling back to the parent scope.
    pub fn resolve_type(&self, type_name: &str) -> AppResult<Arc<dyn Bootstrap>> {
        self.find_type(type_name)?.ok_or_else(|| {
            AppError::configuration(format!(
                "Scope does not contain bootstrap type {} in {:?}",
                type_name, self
            ))
        })
    }

    fn find_type(&self, type_name: &str) -> AppResult<Option<Arc<dyn Bootstrap>>> {
        for source in self.sources() {
            if let Some(entry) = source.entry_point(type_name)? {
                return Ok(Some(entry));
            }
        }
        match &self.parent {
            Some(parent) => parent.find_type(type_name),
            None => Ok(None),
        }
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let origins: Vec<&str> = match self.sources.get() {
            Some(sources) => sources.iter().map(|s| s.origin()).collect(),
            None => Vec::new(),
        };
        f.debug_struct("Scope")
            .field("locations", &self.locations.iter().map(Url::as_str).collect::<Vec<_>>())
            .field("sources", &origins)
            .field("parent", &self.parent)
            .finish()
    }
}

/// Builds loading scopes over module locations
#[derive(Clone)]
pub struct ModuleLoader {
    linker: Arc<dyn Linker>,
}

impl ModuleLoader {
    pub fn new() -> Self {
        Self::with_linker(Arc::new(NativeLinker))
    }

    pub fn with_linker(linker: Arc<dyn Linker>) -> Self {
        Self { linker }
    }

    /// Build a scope over `urls` layered on `parent`.
    ///
    /// Never fails; nothing is opened until the scope is first queried.
    pub fn build(&self, urls: Vec<Url>, parent: &Arc<Scope>) -> Arc<Scope> {
        Arc::new(Scope {
            parent: Some(Arc::clone(parent)),
            locations: urls,
            linker: Some(Arc::clone(&self.linker)),
            sources: OnceCell::new(),
        })
    }
}

impl Default for ModuleLoader {
    fn default() -> Self {
        Self::new()
    }
}
