//! Video aggregate and its transcription status.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transcription status of a video.
///
/// `Completed` and `Failed` are terminal; only `retry` leaves `Failed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptionStatus {
    NotStarted,
    InProgress,
    Completed,
    Failed,
}

impl TranscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscriptionStatus::NotStarted => "not_started",
            TranscriptionStatus::InProgress => "in_progress",
            TranscriptionStatus::Completed => "completed",
            TranscriptionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TranscriptionStatus::Completed | TranscriptionStatus::Failed
        )
    }
}

impl fmt::Display for TranscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TranscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(TranscriptionStatus::NotStarted),
            "in_progress" => Ok(TranscriptionStatus::InProgress),
            "completed" => Ok(TranscriptionStatus::Completed),
            "failed" => Ok(TranscriptionStatus::Failed),
            other => Err(format!("unknown transcription status '{}'", other)),
        }
    }
}

/// One uploaded media asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    /// Opaque id assigned by the record store.
    pub id: String,
    pub title: String,
    /// Object key or full URI of the source media.
    pub media_location: String,
    pub language_code: String,
    pub transcription_status: TranscriptionStatus,
    /// Name of the most recent transcription job.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription_text: Option<String>,
    /// Mean word confidence in `[0, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    /// Creates a fresh `not_started` video. The id is filled in by the store.
    pub fn new(title: &str, media_location: &str, language_code: &str) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            title: title.to_string(),
            media_location: media_location.to_string(),
            language_code: language_code.to_string(),
            transcription_status: TranscriptionStatus::NotStarted,
            job_name: None,
            transcription_text: None,
            confidence: None,
            word_count: None,
            error: None,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the video to `in_progress` for the given job, clearing the
    /// previous attempt's outcome.
    pub fn begin_job(&mut self, job_name: &str, now: DateTime<Utc>) {
        self.transcription_status = TranscriptionStatus::InProgress;
        self.job_name = Some(job_name.to_string());
        self.transcription_text = None;
        self.confidence = None;
        self.word_count = None;
        self.error = None;
        self.started_at = Some(now);
        self.completed_at = None;
        self.updated_at = now;
    }

    pub fn complete(&mut self, text: &str, confidence: f64, word_count: u32, now: DateTime<Utc>) {
        self.transcription_status = TranscriptionStatus::Completed;
        self.transcription_text = Some(text.to_string());
        self.confidence = Some(confidence);
        self.word_count = Some(word_count);
        self.error = None;
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    pub fn fail(&mut self, reason: &str, now: DateTime<Utc>) {
        self.transcription_status = TranscriptionStatus::Failed;
        self.error = Some(reason.to_string());
        self.completed_at = Some(now);
        self.updated_at = now;
    }
}
