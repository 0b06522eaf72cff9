use astexplorer_core::LoadError;
use reqwest::Client;
use std::fmt;
use std::path::{Path, PathBuf};

/// Where the parser module's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
    File(PathBuf),
    Url(String),
}

impl ArtifactSource {
    /// Interpret a configured location. `http://` and `https://` are fetched
    /// over the network; anything else is a path, relative paths resolved
    /// against `base_dir`.
    pub fn from_location(location: &str, base_dir: &Path) -> Self {
        let trimmed = location.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return ArtifactSource::Url(trimmed.to_string());
        }

        let path = Path::new(trimmed);
        if path.is_absolute() {
            ArtifactSource::File(path.to_path_buf())
        } else {
            ArtifactSource::File(base_dir.join(path))
        }
    }

    /// Read the whole artifact into memory.
    pub async fn fetch(&self) -> Result<Vec<u8>, LoadError> {
        self.fetch_with(&Client::new()).await
    }

    /// Like [`fetch`](Self::fetch), sending URL requests through `client`.
    pub async fn fetch_with(&self, client: &Client) -> Result<Vec<u8>, LoadError> {
        match self {
            ArtifactSource::File(path) => tokio::fs::read(path).await.map_err(|e| self.failed(e)),
            ArtifactSource::Url(url) => {
                let resp = client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| self.failed(e))?;

                let status = resp.status();
                if !status.is_success() {
                    return Err(self.failed(format!("server returned {}", status)));
                }

                let bytes = resp.bytes().await.map_err(|e| self.failed(e))?;
                Ok(bytes.to_vec())
            }
        }
    }

    fn failed(&self, reason: impl fmt::Display) -> LoadError {
        LoadError::Fetch {
            location: self.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for ArtifactSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactSource::File(path) => write!(f, "{}", path.display()),
            ArtifactSource::Url(url) => f.write_str(url),
        }
    }
}
