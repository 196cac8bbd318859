//! Library Descriptors
//!
//! Loads modules named by a library descriptor into a registry, and performs
//! process start-up initialisation from [`Config`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;

use crate::common::{AppError, AppResult};
use crate::config::Config;
use crate::registry::{FunctionRegistry, Registration};
use crate::resolver::DependencyResolver;
use crate::scope::{ModuleLoader, Scope};

const COORDINATE_PREFIXES: [&str; 2] = ["mvn://", "mvn:"];

/// One non-blank descriptor line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryEntry {
    /// Artifact coordinate, prefix stripped
    Coordinate(String),
    /// Literal module location
    Location(Url),
}

/// A parsed library descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryManifest {
    entries: Vec<LibraryEntry>,
}

impl LibraryManifest {
    /// Parse descriptor text. Paths that are not URLs are taken relative to
    /// `base_dir`.
    pub fn parse(text: &str, base_dir: &Path) -> AppResult<Self> {
        let mut entries = Vec::new();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if let Some(coordinate) = COORDINATE_PREFIXES.iter().find_map(|p| line.strip_prefix(*p)) {
                entries.push(LibraryEntry::Coordinate(coordinate.trim().to_string()));
                continue;
            }
            entries.push(LibraryEntry::Location(location(line, base_dir)?));
        }
        Ok(Self { entries })
    }

    pub fn from_file(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let base_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self::parse(&text, &base_dir)
    }

    pub fn entries(&self) -> &[LibraryEntry] {
        &self.entries
    }

    pub fn coordinates(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                LibraryEntry::Coordinate(c) => Some(c.clone()),
                LibraryEntry::Location(_) => None,
            })
            .collect()
    }

    pub fn locations(&self) -> Vec<Url> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                LibraryEntry::Location(u) => Some(u.clone()),
                LibraryEntry::Coordinate(_) => None,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A URL, or else a filesystem path. Single-letter schemes are drive letters.
fn location(line: &str, base_dir: &Path) -> AppResult<Url> {
    if let Ok(url) = Url::parse(line) {
        if url.scheme().len() > 1 {
            return Ok(url);
        }
    }

    let mut path = base_dir.join(line);
    if path.is_relative() {
        path = std::env::current_dir()?.join(path);
    }
    Url::from_file_path(&path)
        .map_err(|_| AppError::configuration(format!("Invalid module location: {}", line)))
}

/// Resolves and loads library descriptors into a registry
pub struct LibraryLoader {
    resolver: DependencyResolver,
    loader: ModuleLoader,
    parent: Arc<Scope>,
}

impl LibraryLoader {
    pub fn new(resolver: DependencyResolver, loader: ModuleLoader, parent: Arc<Scope>) -> Self {
        Self {
            resolver,
            loader,
            parent,
        }
    }

    /// Resolve the descriptor's coordinates as one batch, build one scope over
    /// every location and register the functions it offers.
    pub async fn load(&self, registry: &FunctionRegistry, manifest: &LibraryManifest) -> AppResult<Registration> {
        let mut urls = manifest.locations();
        let coordinates = manifest.coordinates();
        if !coordinates.is_empty() {
            urls.extend(self.resolver.resolve(&coordinates).await?);
        }
        if urls.is_empty() {
            debug!("Library descriptor has no module locations");
            return Ok(Registration::default());
        }

        let scope = self.loader.build(urls, &self.parent);
        registry.load_functions(&scope)
    }

    pub async fn load_file(&self, registry: &FunctionRegistry, path: &Path) -> AppResult<Registration> {
        info!("Loading library descriptor {}", path.display());
        let manifest = LibraryManifest::from_file(path)?;
        self.load(registry, &manifest).await
    }
}

/// Build the process registry: built-in modules first, then each configured
/// library descriptor. A descriptor that fails to load is skipped.
pub async fn init(config: &Config) -> AppResult<FunctionRegistry> {
    let registry = FunctionRegistry::new();

    let parent = if config.builtins {
        let builtin = Scope::builtin();
        registry.load_functions(&builtin)?;
        builtin
    } else {
        Scope::empty()
    };

    let files = config.library_files();
    if files.is_empty() {
        return Ok(registry);
    }

    let resolver = DependencyResolver::from_config(&config.resolver)?;
    let libraries = LibraryLoader::new(resolver, ModuleLoader::new(), parent);
    for file in files {
        if let Err(e) = libraries.load_file(&registry, &file).await {
            warn!("Failed to load library descriptor {}: {}", file.display(), e);
        }
    }

    info!("Registry initialised with {} functions", registry.len());
    Ok(registry)
}
