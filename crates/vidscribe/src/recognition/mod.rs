//! Speech recognition service client.
//!
//! The orchestrator depends on [`SpeechRecognitionClient`] only; the HTTP
//! implementation in [`http`] is what a deployment wires in, tests use fakes.

pub mod http;

pub use http::HttpRecognitionClient;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{RecognitionSettings, RemoteJobStatus};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecognitionError {
    /// The service has no job with this name.
    #[error("Recognition job not found: {0}")]
    NotFound(String),

    /// The service refused the request (bad media, unsupported language, duplicate name).
    #[error("Recognition service rejected the request: {0}")]
    Rejected(String),

    #[error("Recognition service unreachable: {0}")]
    Transport(String),

    #[error("Recognition service call timed out after {0}s")]
    Timeout(u64),

    #[error("Unexpected recognition service response: {0}")]
    Decode(String),
}

impl RecognitionError {
    /// True for failures worth retrying on a later tick.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RecognitionError::Transport(_) | RecognitionError::Timeout(_)
        )
    }
}

/// Everything the service needs to start one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub job_name: String,
    pub media_uri: String,
    pub language_code: String,
    pub output_uri: String,
    pub settings: RecognitionSettings,
}

/// Status of a job as reported by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteJob {
    pub status: RemoteJobStatus,
    /// Set once the job is `COMPLETED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl RemoteJob {
    pub fn with_status(status: RemoteJobStatus) -> Self {
        Self {
            status,
            artifact_uri: None,
            failure_reason: None,
        }
    }
}

/// Remote speech recognition API.
#[async_trait::async_trait]
pub trait SpeechRecognitionClient: Send + Sync {
    /// Starts a job. Returns the status the service assigned on acceptance.
    async fn submit(&self, request: &SubmitRequest) -> Result<RemoteJobStatus, RecognitionError>;

    async fn get_status(&self, job_name: &str) -> Result<RemoteJob, RecognitionError>;

    /// Best-effort cancellation of a running job.
    async fn cancel(&self, job_name: &str) -> Result<(), RecognitionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_job_wire_shape() {
        let job: RemoteJob = serde_json::from_str(
            r#"{"status":"COMPLETED","artifactUri":"s3://b/transcriptions/j.json"}"#,
        )
        .unwrap();
        assert_eq!(job.status, RemoteJobStatus::Completed);
        assert_eq!(job.artifact_uri.as_deref(), Some("s3://b/transcriptions/j.json"));
        assert_eq!(job.failure_reason, None);
    }

    #[test]
    fn test_submit_request_serializes_camel_case() {
        let request = SubmitRequest {
            job_name: "transcribe_v1_1".into(),
            media_uri: "s3://b/v.mp4".into(),
            language_code: "en-US".into(),
            output_uri: "s3://b/transcriptions/transcribe_v1_1.json".into(),
            settings: RecognitionSettings::default(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["jobName"], "transcribe_v1_1");
        assert_eq!(value["settings"]["maxAlternatives"], 3);
        assert!(value["settings"].get("maxSpeakerLabels").is_none());
    }

    #[test]
    fn test_transient_errors() {
        assert!(RecognitionError::Timeout(15).is_transient());
        assert!(RecognitionError::Transport("reset".into()).is_transient());
        assert!(!RecognitionError::NotFound("j".into()).is_transient());
        assert!(!RecognitionError::Rejected("bad".into()).is_transient());
    }
}
