//! Artifacts mirrored on the local filesystem as `<root>/<bucket>/<key>`.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use serde_json::Value;

use super::{ArtifactError, ArtifactLocation, ArtifactStore};

pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, uri: &str) -> Result<PathBuf, ArtifactError> {
        let location: ArtifactLocation = uri.parse()?;
        let relative = Path::new(&location.bucket).join(&location.key);

        // Keys must stay inside the mirror root.
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(ArtifactError::InvalidLocation(uri.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait::async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn fetch(&self, uri: &str) -> Result<Value, ArtifactError> {
        let path = self.path_for(uri)?;
        let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => ArtifactError::NotFound(uri.to_string()),
            _ => ArtifactError::Transport(format!("{}: {}", path.display(), e)),
        })?;
        serde_json::from_slice(&bytes).map_err(|e| ArtifactError::Decode(e.to_string()))
    }
}
