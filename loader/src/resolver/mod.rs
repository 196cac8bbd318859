//! Dependency Resolver
//!
//! Resolves a batch of artifact coordinates, with their transitive
//! dependencies, to loadable module locations. Resolution is all-or-nothing:
//! any malformed or unlocatable coordinate fails the whole batch.

pub mod coordinate;
pub mod repository;
pub mod transport;

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};
use url::Url;

use crate::common::{create_http_client, AppError, AppResult};
use crate::config::ResolverConfig;

pub use coordinate::{ArtifactCoordinate, ArtifactKey};
pub use repository::{LocalRepository, ModuleDescriptor, RemoteRepository};
pub use transport::{DefaultTransport, Transport, TransportError};

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Invalid coordinate '{0}': {1}")]
    InvalidCoordinate(String, String),

    #[error("Artifact {0} was not found in any repository")]
    NotFound(String),

    #[error("Could not fetch {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },

    #[error("Checksum mismatch for {url}: expected {expected}, got {actual}")]
    Checksum {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid module descriptor for {coordinate}: {message}")]
    InvalidDescriptor { coordinate: String, message: String },

    #[error("Local repository error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub struct DependencyResolver {
    local: LocalRepository,
    remotes: Vec<RemoteRepository>,
    transport: Arc<dyn Transport>,
}

impl DependencyResolver {
    pub fn new(local: LocalRepository, remotes: Vec<RemoteRepository>, transport: Arc<dyn Transport>) -> Self {
        Self {
            local,
            remotes,
            transport,
        }
    }

    /// Resolver over the configured repositories with the default transport.
    pub fn from_config(config: &ResolverConfig) -> AppResult<Self> {
        let local = match &config.local_repository {
            Some(path) => path.clone(),
            None => crate::common::paths::local_repository_dir().map_err(AppError::configuration)?,
        };
        let client = create_http_client().map_err(AppError::configuration)?;
        let remotes = config
            .remote_repositories
            .iter()
            .map(|r| RemoteRepository::new(r.id.clone(), r.url.clone()))
            .collect();
        Ok(Self::new(
            LocalRepository::new(local),
            remotes,
            Arc::new(DefaultTransport::new(client)),
        ))
    }

    pub fn local(&self) -> &LocalRepository {
        &self.local
    }

    pub fn remotes(&self) -> &[RemoteRepository] {
        &self.remotes
    }

    /// Resolve `coordinates` and their dependencies to local module files.
    ///
    /// Mediation is nearest-wins: the first version reached breadth-first for
    /// a `(group, artifact, classifier)` key is used and other versions are
    /// omitted with their subtrees. Order of the result is unspecified.
    pub async fn resolve<S: AsRef<str>>(&self, coordinates: &[S]) -> Result<Vec<Url>, ResolveError> {
        let roots = coordinates
            .iter()
            .map(|c| c.as_ref().trim().parse::<ArtifactCoordinate>())
            .collect::<Result<Vec<_>, _>>()?;

        let mut queue: VecDeque<ArtifactCoordinate> = roots.into_iter().collect();
        let mut chosen: HashMap<ArtifactKey, String> = HashMap::new();
        let mut locations = Vec::new();

        while let Some(coordinate) = queue.pop_front() {
            match chosen.get(&coordinate.key()) {
                Some(version) if *version == coordinate.version => continue,
                Some(version) => {
                    debug!("Omitting {} in favour of version {}", coordinate, version);
                    continue;
                }
                None => {
                    chosen.insert(coordinate.key(), coordinate.version.clone());
                }
            }

            let path = self.artifact(&coordinate).await?;
            let url = Url::from_file_path(&path).map_err(|_| ResolveError::Io {
                path: path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "path is not absolute"),
            })?;
            debug!("Resolved {} to {}", coordinate, url);
            locations.push(url);

            for dependency in self.dependencies(&coordinate).await? {
                let parsed = dependency.parse::<ArtifactCoordinate>().map_err(|e| ResolveError::InvalidDescriptor {
                    coordinate: coordinate.to_string(),
                    message: e.to_string(),
                })?;
                queue.push_back(parsed);
            }
        }

        info!("Resolved {} coordinates to {} locations", coordinates.len(), locations.len());
        Ok(locations)
    }

    /// Local path of the artifact, downloading it on a cache miss.
    async fn artifact(&self, coordinate: &ArtifactCoordinate) -> Result<PathBuf, ResolveError> {
        if let Some(path) = self.local.find(coordinate) {
            return Ok(path);
        }

        let relative = coordinate.artifact_path();
        for remote in &self.remotes {
            let Some(bytes) = self.fetch(remote, &relative).await? else {
                continue;
            };
            self.verify(remote, &relative, &bytes).await?;
            info!("Downloaded {} from {}", coordinate, remote.id);
            return self.local.store(&relative, &bytes).await;
        }
        Err(ResolveError::NotFound(coordinate.to_string()))
    }

    /// Declared dependencies; an absent descriptor declares none.
    async fn dependencies(&self, coordinate: &ArtifactCoordinate) -> Result<Vec<String>, ResolveError> {
        let relative = coordinate.descriptor_path();
        let local = self.local.path(&relative);

        let bytes = if local.is_file() {
            let read = tokio::fs::read(&local).await;
            Some(read.map_err(|source| ResolveError::Io { path: local.clone(), source })?)
        } else {
            let mut found = None;
            for remote in &self.remotes {
                if let Some(bytes) = self.fetch(remote, &relative).await? {
                    self.local.store(&relative, &bytes).await?;
                    found = Some(bytes);
                    break;
                }
            }
            found
        };

        let Some(bytes) = bytes else {
            return Ok(Vec::new());
        };
        let descriptor: ModuleDescriptor =
            serde_json::from_slice(&bytes).map_err(|e| ResolveError::InvalidDescriptor {
                coordinate: coordinate.to_string(),
                message: e.to_string(),
            })?;
        Ok(descriptor.dependencies)
    }

    async fn fetch(&self, remote: &RemoteRepository, relative: &str) -> Result<Option<Vec<u8>>, ResolveError> {
        let url = remote.file_url(relative).map_err(|e| ResolveError::Transport {
            url: format!("{}{}", remote.url, relative),
            source: e.into(),
        })?;
        self.transport.fetch(&url).await.map_err(|source| ResolveError::Transport {
            url: url.to_string(),
            source,
        })
    }

    /// Check a `.sha256` sidecar when the repository has one.
    async fn verify(&self, remote: &RemoteRepository, relative: &str, bytes: &[u8]) -> Result<(), ResolveError> {
        use sha2::{Digest, Sha256};

        let sidecar = format!("{}.sha256", relative);
        let Some(expected) = self.fetch(remote, &sidecar).await? else {
            return Ok(());
        };
        let expected = String::from_utf8_lossy(&expected)
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_lowercase();
        let actual = hex::encode(Sha256::digest(bytes));
        if expected != actual {
            return Err(ResolveError::Checksum {
                url: format!("{}{}", remote.url, relative),
                expected,
                actual,
            });
        }
        Ok(())
    }
}
