//! Repository Transport
//!
//! Fetches repository files over `http`, `https` or `file` URLs.

use async_trait::async_trait;
use tracing::debug;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Repository answered with status {0}")]
    Status(u16),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported repository scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid repository URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Fetches one repository file
#[async_trait]
pub trait Transport: Send + Sync {
    /// Bytes at `url`, `None` when the repository does not have the file.
    async fn fetch(&self, url: &Url) -> Result<Option<Vec<u8>>, TransportError>;
}

/// reqwest for HTTP(S), tokio fs for `file:` URLs
pub struct DefaultTransport {
    client: reqwest::Client,
}

impl DefaultTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for DefaultTransport {
    async fn fetch(&self, url: &Url) -> Result<Option<Vec<u8>>, TransportError> {
        match url.scheme() {
            "http" | "https" => {
                debug!("GET {}", url);
                let response = self.client.get(url.clone()).send().await?;
                let status = response.status();
                if status == reqwest::StatusCode::NOT_FOUND {
                    return Ok(None);
                }
                if !status.is_success() {
                    return Err(TransportError::Status(status.as_u16()));
                }
                Ok(Some(response.bytes().await?.to_vec()))
            }
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| TransportError::UnsupportedScheme(url.to_string()))?;
                match tokio::fs::read(&path).await {
                    Ok(bytes) => Ok(Some(bytes)),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                    Err(e) => Err(e.into()),
                }
            }
            other => Err(TransportError::UnsupportedScheme(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> DefaultTransport {
        DefaultTransport::new(reqwest::Client::new())
    }

    #[tokio::test]
    async fn test_file_fetch() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("present.txt"), b"data").unwrap();

        let present = Url::from_file_path(dir.path().join("present.txt")).unwrap();
        let missing = Url::from_file_path(dir.path().join("missing.txt")).unwrap();

        assert_eq!(transport().fetch(&present).await.unwrap(), Some(b"data".to_vec()));
        assert_eq!(transport().fetch(&missing).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unsupported_scheme() {
        let url = Url::parse("ftp://example.com/a").unwrap();
        assert!(matches!(
            transport().fetch(&url).await,
            Err(TransportError::UnsupportedScheme(s)) if s == "ftp"
        ));
    }
}
