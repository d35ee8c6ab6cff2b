//! One-shot status checks and terminal-state persistence.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};

use super::{bounded, Services};
use crate::artifact::ArtifactError;
use crate::error::{Result, TranscriptionError};
use crate::model::{
    ProgressSnapshot, RemoteJobStatus, TranscriptionJob, TranscriptionStatus, Video,
};
use crate::parser::{self, ParsedTranscript};
use crate::recognition::{RecognitionError, RemoteJob};

/// How a job ended.
#[derive(Debug)]
enum Outcome {
    Completed(ParsedTranscript),
    Failed(String),
}

#[derive(Clone)]
pub struct StatusPoller {
    services: Arc<Services>,
}

impl StatusPoller {
    pub(crate) fn new(services: Arc<Services>) -> Self {
        Self { services }
    }

    /// Reports the current progress of a video's transcription.
    ///
    /// Terminal outcomes reported by the service are persisted and returned
    /// as snapshots. Only transport and store failures are errors. Once a
    /// terminal state is stored, no remote call is made.
    pub async fn check_progress(&self, video_id: &str) -> Result<ProgressSnapshot> {
        let video = self.services.load_video(video_id)?;

        let snapshot = match (video.transcription_status, video.job_name.clone()) {
            (TranscriptionStatus::InProgress, Some(job_name)) => {
                self.poll_job(video, &job_name).await?
            }
            (TranscriptionStatus::NotStarted, _) | (TranscriptionStatus::InProgress, None) => {
                ProgressSnapshot::not_started()
            }
            _ => ProgressSnapshot::from_video(&video),
        };

        self.services.broadcaster.publish(video_id, &snapshot);
        Ok(snapshot)
    }

    async fn poll_job(&self, video: Video, job_name: &str) -> Result<ProgressSnapshot> {
        let job = self.services.store.get_job(job_name)?;

        // A job settled without its video (interrupted write) is applied as stored.
        if let Some(job) = job.as_ref().filter(|j| !j.is_active()) {
            return self.services.apply_settled_job(video, job);
        }

        let remote = bounded(
            self.services.call_timeout,
            self.services.recognition.get_status(job_name),
            RecognitionError::Timeout,
        )
        .await;

        let remote = match remote {
            Ok(remote) => remote,
            Err(RecognitionError::NotFound(_)) => {
                let reason = format!("recognition job {} no longer exists", job_name);
                return self.settle(video, job, Outcome::Failed(reason));
            }
            Err(e) => return Err(TranscriptionError::Transport(e.to_string())),
        };

        match remote.status {
            RemoteJobStatus::Completed => {
                let outcome = self.fetch_outcome(job.as_ref(), &remote).await?;
                self.settle(video, job, outcome)
            }
            RemoteJobStatus::Failed => {
                let reason = remote
                    .failure_reason
                    .unwrap_or_else(|| "recognition service reported failure".to_string());
                self.settle(video, job, Outcome::Failed(reason))
            }
            status => {
                if let Some(mut job) = job.filter(|j| j.status != status) {
                    job.status = status.clone();
                    job.updated_at = Utc::now();
                    self.services.store.update_job_if_active(&job)?;
                }
                Ok(ProgressSnapshot::running(job_name, &status))
            }
        }
    }

    /// Downloads and parses the result artifact of a completed job.
    ///
    /// Transient fetch failures are errors so the next tick retries; a
    /// missing or malformed artifact is a failed job.
    async fn fetch_outcome(
        &self,
        job: Option<&TranscriptionJob>,
        remote: &RemoteJob,
    ) -> Result<Outcome> {
        let Some(uri) = remote
            .artifact_uri
            .as_deref()
            .or(job.map(|j| j.output_uri.as_str()))
            .filter(|uri| !uri.is_empty())
        else {
            return Ok(Outcome::Failed(
                "recognition service reported no result location".to_string(),
            ));
        };

        let fetched = bounded(
            self.services.call_timeout,
            self.services.artifacts.fetch(uri),
            ArtifactError::Timeout,
        )
        .await;

        let document = match fetched {
            Ok(document) => document,
            Err(e) if e.is_transient() => return Err(TranscriptionError::Transport(e.to_string())),
            Err(e) => return Ok(Outcome::Failed(e.to_string())),
        };

        match parser::parse(&document) {
            Ok(parsed) => Ok(Outcome::Completed(parsed)),
            Err(e) => {
                let err = TranscriptionError::from(e);
                warn!("Artifact {} rejected: {}", uri, err);
                Ok(Outcome::Failed(err.to_string()))
            }
        }
    }

    /// Persists a terminal outcome on the job, then the video.
    ///
    /// The video is only written if this call moved the job to its terminal
    /// state, so a cancel or an earlier poll that already settled the
    /// attempt is never overwritten.
    fn settle(
        &self,
        video: Video,
        job: Option<TranscriptionJob>,
        outcome: Outcome,
    ) -> Result<ProgressSnapshot> {
        let store = &self.services.store;
        let now = Utc::now();

        if let Some(mut job) = job {
            match &outcome {
                Outcome::Completed(parsed) => job.complete(
                    &parsed.text,
                    parsed.average_confidence,
                    parsed.word_count,
                    now,
                ),
                Outcome::Failed(reason) => job.fail(reason, now),
            }
            if !store.update_job_if_active(&job)? {
                debug!("Job {} already settled elsewhere", job.job_name);
                return self.services.stored_snapshot(&video.id);
            }
        }

        let mut updated = video;
        match &outcome {
            Outcome::Completed(parsed) => {
                updated.complete(&parsed.text, parsed.average_confidence, parsed.word_count, now);
                info!(
                    "Transcription of video {} completed: {} words, confidence {:.2}",
                    updated.id, parsed.word_count, parsed.average_confidence
                );
            }
            Outcome::Failed(reason) => {
                updated.fail(reason, now);
                warn!("Transcription of video {} failed: {}", updated.id, reason);
            }
        }

        if store.update_video_if(&updated, TranscriptionStatus::InProgress)? {
            Ok(ProgressSnapshot::from_video(&updated))
        } else {
            self.services.stored_snapshot(&updated.id)
        }
    }

}
