//! Configuration
//!
//! Loader settings read from `~/.pfunc/config.json`, with environment
//! overrides applied on top.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::paths::{config_path, DEFAULT_LIBRARIES_FILE};
use crate::common::{AppError, AppResult};
use crate::resolver::RemoteRepository;

/// Override library descriptor
pub const LIBRARIES_ENV: &str = "PFUNC_LIBRARIES";
/// Local repository directory
pub const LOCAL_REPOSITORY_ENV: &str = "PFUNC_LOCAL_REPOSITORY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Default library descriptor, loaded when it exists.
    pub libraries: PathBuf,
    /// Extra descriptor loaded after the default one.
    pub override_libraries: Option<PathBuf>,
    /// Register the modules compiled into the binary.
    pub builtins: bool,
    pub resolver: ResolverConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            libraries: PathBuf::from(DEFAULT_LIBRARIES_FILE),
            override_libraries: None,
            builtins: true,
            resolver: ResolverConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverConfig {
    /// Defaults to `~/.pfunc/repository`.
    pub local_repository: Option<PathBuf>,
    pub remote_repositories: Vec<RemoteRepository>,
}

impl Config {
    /// User configuration with environment overrides.
    pub fn load() -> AppResult<Self> {
        let path = config_path().map_err(AppError::configuration)?;
        let config = if path.is_file() {
            Self::from_file(&path)?
        } else {
            debug!("No configuration at {}, using defaults", path.display());
            Self::default()
        };
        Ok(config.with_env(|key| std::env::var(key).ok()))
    }

    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::configuration(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| AppError::configuration(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Apply `PFUNC_LIBRARIES` and `PFUNC_LOCAL_REPOSITORY` from `var`.
    pub fn with_env(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(libraries) = var(LIBRARIES_ENV).filter(|v| !v.trim().is_empty()) {
            self.override_libraries = Some(PathBuf::from(libraries));
        }
        if let Some(repository) = var(LOCAL_REPOSITORY_ENV).filter(|v| !v.trim().is_empty()) {
            self.resolver.local_repository = Some(PathBuf::from(repository));
        }
        self
    }

    /// Descriptors to load, in order: the default one if it is a file, then
    /// the override unless it names the same file.
    pub fn library_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        if self.libraries.is_file() {
            files.push(self.libraries.clone());
        }
        if let Some(extra) = &self.override_libraries {
            if !files.iter().any(|f| same_file(f, extra)) {
                files.push(extra.clone());
            }
        }
        files
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
