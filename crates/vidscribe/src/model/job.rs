//! Transcription job records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::options::RecognitionSettings;

/// Job status in the recognition service's vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RemoteJobStatus {
    Pending,
    Queued,
    InProgress,
    Completed,
    Failed,
    /// Any value the service reports that this crate does not know.
    Unknown(String),
}

impl RemoteJobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RemoteJobStatus::Pending => "PENDING",
            RemoteJobStatus::Queued => "QUEUED",
            RemoteJobStatus::InProgress => "IN_PROGRESS",
            RemoteJobStatus::Completed => "COMPLETED",
            RemoteJobStatus::Failed => "FAILED",
            RemoteJobStatus::Unknown(other) => other,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RemoteJobStatus::Completed | RemoteJobStatus::Failed)
    }
}

impl From<&str> for RemoteJobStatus {
    fn from(s: &str) -> Self {
        match s {
            "PENDING" => RemoteJobStatus::Pending,
            "QUEUED" => RemoteJobStatus::Queued,
            "IN_PROGRESS" => RemoteJobStatus::InProgress,
            "COMPLETED" => RemoteJobStatus::Completed,
            "FAILED" => RemoteJobStatus::Failed,
            other => RemoteJobStatus::Unknown(other.to_string()),
        }
    }
}

impl From<String> for RemoteJobStatus {
    fn from(s: String) -> Self {
        RemoteJobStatus::from(s.as_str())
    }
}

impl From<RemoteJobStatus> for String {
    fn from(status: RemoteJobStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for RemoteJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One attempt to transcribe a video.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionJob {
    /// Globally unique job name; also the record's primary key.
    pub job_name: String,
    pub video_id: String,
    pub media_uri: String,
    pub language_code: String,
    /// Where the recognition service writes the result artifact.
    pub output_uri: String,
    pub settings: RecognitionSettings,
    pub status: RemoteJobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl TranscriptionJob {
    /// Creates a `PENDING` job record.
    pub fn pending(
        job_name: &str,
        video_id: &str,
        media_uri: &str,
        language_code: &str,
        output_uri: &str,
        settings: RecognitionSettings,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            job_name: job_name.to_string(),
            video_id: video_id.to_string(),
            media_uri: media_uri.to_string(),
            language_code: language_code.to_string(),
            output_uri: output_uri.to_string(),
            settings,
            status: RemoteJobStatus::Pending,
            transcription_text: None,
            confidence: None,
            word_count: None,
            error: None,
            created_at: now,
            submitted_at: None,
            completed_at: None,
            updated_at: now,
        }
    }

    /// True while the job has not reached `COMPLETED` or `FAILED`.
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn mark_submitted(&mut self, status: RemoteJobStatus, now: DateTime<Utc>) {
        self.status = status;
        self.submitted_at = Some(now);
        self.updated_at = now;
    }

    pub fn complete(&mut self, text: &str, confidence: f64, word_count: u32, now: DateTime<Utc>) {
        self.status = RemoteJobStatus::Completed;
        self.transcription_text = Some(text.to_string());
        self.confidence = Some(confidence);
        self.word_count = Some(word_count);
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    pub fn fail(&mut self, reason: &str, now: DateTime<Utc>) {
        self.status = RemoteJobStatus::Failed;
        self.error = Some(reason.to_string());
        self.completed_at = Some(now);
        self.updated_at = now;
    }
}
