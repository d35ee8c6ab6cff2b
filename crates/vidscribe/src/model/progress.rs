//! Progress snapshots returned by a single status check.

use serde::{Deserialize, Serialize};

use super::job::RemoteJobStatus;
use super::video::{TranscriptionStatus, Video};

/// Maps a remote job status to the local status and a coarse progress figure.
///
/// The percentages are fixed estimates, not measured processing fractions.
pub fn remote_progress(status: &RemoteJobStatus) -> (TranscriptionStatus, u8) {
    match status {
        RemoteJobStatus::Completed => (TranscriptionStatus::Completed, 100),
        RemoteJobStatus::Failed => (TranscriptionStatus::Failed, 0),
        RemoteJobStatus::InProgress => (TranscriptionStatus::InProgress, 50),
        RemoteJobStatus::Queued => (TranscriptionStatus::InProgress, 25),
        RemoteJobStatus::Pending | RemoteJobStatus::Unknown(_) => {
            (TranscriptionStatus::InProgress, 10)
        }
    }
}

/// Ephemeral status of one video's transcription. Not persisted as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub status: TranscriptionStatus,
    pub progress_percent: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressSnapshot {
    pub fn not_started() -> Self {
        Self {
            status: TranscriptionStatus::NotStarted,
            progress_percent: 0,
            message: "Transcription not started".to_string(),
            job_name: None,
            text: None,
            confidence: None,
            error: None,
        }
    }

    /// Snapshot for a job the recognition service is still working on.
    pub fn running(job_name: &str, remote: &RemoteJobStatus) -> Self {
        let (status, progress_percent) = remote_progress(remote);
        let message = match remote {
            RemoteJobStatus::InProgress => "Recognition service is processing the audio".to_string(),
            RemoteJobStatus::Queued => "Queued at the recognition service".to_string(),
            other => format!("Status: {}", other),
        };
        Self {
            status,
            progress_percent,
            message,
            job_name: Some(job_name.to_string()),
            text: None,
            confidence: None,
            error: None,
        }
    }

    pub fn completed(job_name: Option<&str>, text: &str, confidence: f64) -> Self {
        Self {
            status: TranscriptionStatus::Completed,
            progress_percent: 100,
            message: "Transcription completed successfully".to_string(),
            job_name: job_name.map(str::to_string),
            text: Some(text.to_string()),
            confidence: Some(confidence),
            error: None,
        }
    }

    pub fn failed(job_name: Option<&str>, reason: &str) -> Self {
        Self {
            status: TranscriptionStatus::Failed,
            progress_percent: 0,
            message: format!("Transcription failed: {}", reason),
            job_name: job_name.map(str::to_string),
            text: None,
            confidence: None,
            error: Some(reason.to_string()),
        }
    }

    /// Polling gave up before the job reached a terminal state.
    pub fn stale(job_name: Option<&str>) -> Self {
        Self {
            status: TranscriptionStatus::InProgress,
            progress_percent: 0,
            message: "No progress reported within the polling window; cancel or retry the transcription"
                .to_string(),
            job_name: job_name.map(str::to_string),
            text: None,
            confidence: None,
            error: None,
        }
    }

    /// Builds a snapshot from what is persisted on the video, without any
    /// remote call. Used once a terminal state is stored.
    pub fn from_video(video: &Video) -> Self {
        let job_name = video.job_name.as_deref();
        match video.transcription_status {
            TranscriptionStatus::NotStarted => Self::not_started(),
            TranscriptionStatus::Completed => Self::completed(
                job_name,
                video.transcription_text.as_deref().unwrap_or_default(),
                video.confidence.unwrap_or(0.0),
            ),
            TranscriptionStatus::Failed => Self::failed(
                job_name,
                video.error.as_deref().unwrap_or("unknown error"),
            ),
            TranscriptionStatus::InProgress => Self {
                status: TranscriptionStatus::InProgress,
                progress_percent: 10,
                message: "Transcription in progress".to_string(),
                job_name: job_name.map(str::to_string),
                text: None,
                confidence: None,
                error: None,
            },
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_progress_table() {
        assert_eq!(
            remote_progress(&RemoteJobStatus::Completed),
            (TranscriptionStatus::Completed, 100)
        );
        assert_eq!(
            remote_progress(&RemoteJobStatus::Failed),
            (TranscriptionStatus::Failed, 0)
        );
        assert_eq!(
            remote_progress(&RemoteJobStatus::InProgress),
            (TranscriptionStatus::InProgress, 50)
        );
        assert_eq!(
            remote_progress(&RemoteJobStatus::Queued),
            (TranscriptionStatus::InProgress, 25)
        );
        assert_eq!(
            remote_progress(&RemoteJobStatus::Unknown("WHATEVER".into())),
            (TranscriptionStatus::InProgress, 10)
        );
        assert_eq!(
            remote_progress(&RemoteJobStatus::Pending),
            (TranscriptionStatus::InProgress, 10)
        );
    }

    #[test]
    fn test_unknown_status_is_named_in_message() {
        let snapshot = ProgressSnapshot::running("j1", &RemoteJobStatus::Unknown("DELETING".into()));
        assert_eq!(snapshot.message, "Status: DELETING");
        assert_eq!(snapshot.job_name.as_deref(), Some("j1"));
    }

    #[test]
    fn test_failed_snapshot_carries_reason() {
        let snapshot = ProgressSnapshot::failed(Some("j1"), "unsupported media");
        assert!(snapshot.is_terminal());
        assert_eq!(snapshot.error.as_deref(), Some("unsupported media"));
        assert!(snapshot.message.contains("unsupported media"));
    }
}
