//! Result artifact retrieval.
//!
//! Artifacts are addressed as `s3://bucket/key`. [`HttpArtifactStore`] reads
//! them from an object-storage HTTP endpoint (or follows a direct `https://`
//! link), [`FsArtifactStore`] from a local directory mirror.

pub mod fs;
pub mod http;

pub use fs::FsArtifactStore;
pub use http::HttpArtifactStore;

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

static RE_OBJECT_URI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^s3://([^/]+)/(.+)$").unwrap());

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArtifactError {
    #[error("Artifact not found: {0}")]
    NotFound(String),

    #[error("Invalid artifact location '{0}'")]
    InvalidLocation(String),

    #[error("Artifact store unreachable: {0}")]
    Transport(String),

    #[error("Artifact fetch timed out after {0}s")]
    Timeout(u64),

    #[error("Artifact is not valid JSON: {0}")]
    Decode(String),
}

impl ArtifactError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ArtifactError::Transport(_) | ArtifactError::Timeout(_))
    }
}

/// Bucket and key of an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocation {
    pub bucket: String,
    pub key: String,
}

impl ArtifactLocation {
    pub fn new(bucket: &str, key: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            key: key.trim_start_matches('/').to_string(),
        }
    }

    /// Where the result of `job_name` is written.
    pub fn for_job_output(bucket: &str, prefix: &str, job_name: &str) -> Self {
        let key = if prefix.is_empty() {
            format!("{}.json", job_name)
        } else {
            format!("{}/{}.json", prefix, job_name)
        };
        Self::new(bucket, &key)
    }

    /// Expands a media reference: full URIs are kept, bare keys are placed in `bucket`.
    pub fn media_uri(bucket: &str, media_location: &str) -> String {
        if media_location.contains("://") {
            media_location.to_string()
        } else {
            Self::new(bucket, media_location).to_string()
        }
    }
}

impl FromStr for ArtifactLocation {
    type Err = ArtifactError;

    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        let caps = RE_OBJECT_URI
            .captures(uri.trim())
            .ok_or_else(|| ArtifactError::InvalidLocation(uri.to_string()))?;
        Ok(Self {
            bucket: caps[1].to_string(),
            key: caps[2].to_string(),
        })
    }
}

impl fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Fetches JSON result documents.
#[async_trait::async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<Value, ArtifactError>;
}
