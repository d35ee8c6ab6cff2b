//! Artifact retrieval over HTTP.

use std::time::Duration;

use log::debug;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use super::{ArtifactError, ArtifactLocation, ArtifactStore};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Reads `s3://bucket/key` objects as `{endpoint}/{bucket}/{key}` (path-style).
/// `http(s)://` URIs are fetched as given.
pub struct HttpArtifactStore {
    client: Client,
    endpoint: Option<String>,
    timeout_secs: u64,
}

impl HttpArtifactStore {
    pub fn new(endpoint: Option<&str>, timeout_secs: u64) -> Result<Self, ArtifactError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ArtifactError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.map(|e| e.trim_end_matches('/').to_string()),
            timeout_secs,
        })
    }

    fn resolve_url(&self, uri: &str) -> Result<String, ArtifactError> {
        if uri.starts_with("https://") || uri.starts_with("http://") {
            return Ok(uri.to_string());
        }

        let location: ArtifactLocation = uri.parse()?;
        let endpoint = self.endpoint.as_deref().ok_or_else(|| {
            ArtifactError::InvalidLocation(format!("{} (no artifact endpoint configured)", uri))
        })?;
        Ok(format!("{}/{}/{}", endpoint, location.bucket, location.key))
    }
}

#[async_trait::async_trait]
impl ArtifactStore for HttpArtifactStore {
    async fn fetch(&self, uri: &str) -> Result<Value, ArtifactError> {
        let url = self.resolve_url(uri)?;
        debug!("Fetching artifact {} from {}", uri, url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                ArtifactError::Timeout(self.timeout_secs)
            } else {
                ArtifactError::Transport(e.to_string())
            }
        })?;

        match response.status() {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => {
                return Err(ArtifactError::NotFound(uri.to_string()))
            }
            s => return Err(ArtifactError::Transport(format!("{} ({})", uri, s))),
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ArtifactError::Transport(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| ArtifactError::Decode(e.to_string()))
    }
}
