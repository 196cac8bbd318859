//! Repositories
//!
//! The local repository doubles as resolution cache; remote repositories are
//! read through a [`Transport`](super::transport::Transport).

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use super::coordinate::ArtifactCoordinate;
use super::ResolveError;

/// A configured remote repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRepository {
    pub id: String,
    pub url: Url,
}

impl RemoteRepository {
    pub fn new(id: impl Into<String>, mut url: Url) -> Self {
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Self { id: id.into(), url }
    }

    /// URL of a repository-relative path.
    pub fn file_url(&self, relative: &str) -> Result<Url, url::ParseError> {
        let mut base = self.url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(relative)
    }
}

/// On-disk repository with the same layout as a remote one
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Path of the artifact when it is already stored locally.
    pub fn find(&self, coordinate: &ArtifactCoordinate) -> Option<PathBuf> {
        let path = self.path(&coordinate.artifact_path());
        path.is_file().then_some(path)
    }

    /// Store `bytes` at `relative`, written under a temporary name then renamed.
    pub async fn store(&self, relative: &str, bytes: &[u8]) -> Result<PathBuf, ResolveError> {
        let path = self.path(relative);
        let io_err = |source: io::Error| ResolveError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let partial = path.with_file_name(format!(
            ".{}.{}.part",
            path.file_name().and_then(|n| n.to_str()).unwrap_or("artifact"),
            std::process::id()
        ));
        tokio::fs::write(&partial, bytes).await.map_err(io_err)?;
        tokio::fs::rename(&partial, &path).await.map_err(io_err)?;
        Ok(path)
    }
}

/// Dependencies declared next to an artifact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    #[serde(default)]
    pub dependencies: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_url_gets_trailing_slash() {
        let repo = RemoteRepository::new("central", Url::parse("https://repo.example.com/maven").unwrap());
        assert_eq!(repo.url.as_str(), "https://repo.example.com/maven/");
        assert_eq!(
            repo.file_url("g/a/1.0/a-1.0.json").unwrap().as_str(),
            "https://repo.example.com/maven/g/a/1.0/a-1.0.json"
        );
    }

    #[tokio::test]
    async fn test_store_then_find() {
        let dir = tempfile::tempdir().unwrap();
        let local = LocalRepository::new(dir.path());
        let coordinate: ArtifactCoordinate = "g:a:1.0".parse().unwrap();

        assert!(local.find(&coordinate).is_none());
        let stored = local.store(&coordinate.artifact_path(), b"module").await.unwrap();
        assert_eq!(local.find(&coordinate), Some(stored.clone()));
        assert_eq!(std::fs::read(stored).unwrap(), b"module");
    }

    #[test]
    fn test_descriptor_defaults() {
        let descriptor: ModuleDescriptor = serde_json::from_str("{}").unwrap();
        assert!(descriptor.dependencies.is_empty());
    }
}
