use std::path::PathBuf;
use thiserror::Error;

use crate::db::DatabaseError;

/// Errors surfaced by the orchestrator's public operations.
#[derive(Error, Debug)]
pub enum TranscriptionError {
    /// The requested state transition is not allowed from the video's current status.
    #[error("Conflict for video '{video_id}': {message}")]
    Conflict { video_id: String, message: String },

    #[error("Video not found: {0}")]
    VideoNotFound(String),

    /// The recognition service rejected the job, or submitting it failed.
    #[error("Submission of job '{job_name}' failed: {reason}")]
    Submission { job_name: String, reason: String },

    /// Transient failure reaching the recognition service or the artifact store.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed recognition artifact: {0}")]
    MalformedArtifact(String),

    #[error("Store error: {0}")]
    Store(#[from] DatabaseError),
}

impl TranscriptionError {
    pub(crate) fn conflict(video_id: &str, message: impl Into<String>) -> Self {
        TranscriptionError::Conflict {
            video_id: video_id.to_string(),
            message: message.into(),
        }
    }

    /// Returns true for errors a polling timer should retry on its next tick.
    pub fn is_transient(&self) -> bool {
        matches!(self, TranscriptionError::Transport(_))
    }
}

impl From<crate::parser::ParseError> for TranscriptionError {
    fn from(err: crate::parser::ParseError) -> Self {
        TranscriptionError::MalformedArtifact(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidField { field: String, reason: String },
}

/// Failures while wiring an orchestrator from configuration.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to open database: {0}")]
    Database(#[from] DatabaseError),

    #[error("Failed to resolve recognition API key: {0}")]
    Secret(#[from] crate::secrets::SecretError),

    #[error("Failed to create recognition client: {0}")]
    Recognition(#[from] crate::recognition::RecognitionError),

    #[error("Failed to create artifact store: {0}")]
    Artifact(#[from] crate::artifact::ArtifactError),

    #[error("No database path configured and no home directory to default to")]
    NoDatabasePath,
}

pub type Result<T> = std::result::Result<T, TranscriptionError>;
