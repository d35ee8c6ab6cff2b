//! Job submission: bookkeeping records first, then the remote call.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{error, info, warn};

use super::{bounded, Services};
use crate::artifact::ArtifactLocation;
use crate::error::{Result, TranscriptionError};
use crate::language::resolve_language_code;
use crate::model::{
    ProgressSnapshot, RecognitionSettings, RemoteJobStatus, TranscriptionJob,
    TranscriptionOptions, TranscriptionStatus, Video,
};
use crate::recognition::{RecognitionError, SubmitRequest};

/// Recorded on a job whose video was claimed by a concurrent start.
const SUPERSEDED_REASON: &str = "superseded by a concurrent start";

/// Recorded when the service refuses a job in its acceptance response.
const REFUSED_REASON: &str = "recognition service failed the job on submission";

/// Upper bound on name collisions resolved by bumping the timestamp.
const MAX_NAME_ATTEMPTS: i64 = 1000;

#[derive(Clone)]
pub struct SubmissionManager {
    services: Arc<Services>,
}

impl SubmissionManager {
    pub(crate) fn new(services: Arc<Services>) -> Self {
        Self { services }
    }

    /// Starts a transcription for a video that is not currently in progress.
    pub async fn start(
        &self,
        video_id: &str,
        media_location: &str,
        language_code: &str,
        options: &TranscriptionOptions,
    ) -> Result<String> {
        let video = self.services.load_video(video_id)?;
        if video.transcription_status == TranscriptionStatus::InProgress {
            return Err(TranscriptionError::conflict(
                video_id,
                "a transcription is already in progress",
            ));
        }

        self.submit(video, media_location, language_code, options)
            .await
    }

    /// Creates a job for `video` and submits it.
    ///
    /// The video is claimed with a compare-and-swap against the status it was
    /// read with, so of two racing submissions exactly one proceeds.
    pub(crate) async fn submit(
        &self,
        mut video: Video,
        media_location: &str,
        language_code: &str,
        options: &TranscriptionOptions,
    ) -> Result<String> {
        let store = &self.services.store;
        let storage = &self.services.storage;
        let expected = video.transcription_status;
        let now = Utc::now();

        let job_name = self.unique_job_name(&video.id, now)?;
        let media_location = media_location.trim();
        let media_uri = if media_location.is_empty() {
            String::new()
        } else {
            ArtifactLocation::media_uri(&storage.bucket, media_location)
        };
        let language = resolve_language_code(language_code);
        let output_uri =
            ArtifactLocation::for_job_output(&storage.bucket, &storage.output_prefix, &job_name)
                .to_string();
        let settings = RecognitionSettings::from(options);

        let mut job = TranscriptionJob::pending(
            &job_name,
            &video.id,
            &media_uri,
            &language,
            &output_uri,
            settings.clone(),
            now,
        );
        store.create_job(&job)?;

        video.media_location = media_location.to_string();
        video.language_code = language.clone();
        video.begin_job(&job_name, now);
        if !store.update_video_if(&video, expected)? {
            warn!(
                "Video {} changed while starting job {}, abandoning it",
                video.id, job_name
            );
            job.fail(SUPERSEDED_REASON, Utc::now());
            store.update_job_if_active(&job)?;
            return Err(TranscriptionError::conflict(
                &video.id,
                "a concurrent start claimed the video",
            ));
        }

        if media_uri.is_empty() {
            let reason = "media location is empty".to_string();
            self.roll_back(&mut video, &mut job, &reason);
            return Err(TranscriptionError::Submission { job_name, reason });
        }

        let request = SubmitRequest {
            job_name: job_name.clone(),
            media_uri,
            language_code: language,
            output_uri,
            settings,
        };
        let submitted = bounded(
            self.services.call_timeout,
            self.services.recognition.submit(&request),
            RecognitionError::Timeout,
        )
        .await;

        match submitted {
            Ok(RemoteJobStatus::Failed) => {
                let reason = REFUSED_REASON.to_string();
                self.roll_back(&mut video, &mut job, &reason);
                Err(TranscriptionError::Submission { job_name, reason })
            }
            Ok(status) => {
                job.mark_submitted(accepted_status(status), Utc::now());
                // The remote job exists now; the poller reconciles a stale record.
                if let Err(e) = store.update_job_if_active(&job) {
                    error!("Failed to record submission of job {}: {}", job_name, e);
                }
                info!(
                    "Started transcription job {} for video {} ({})",
                    job_name, video.id, job.status
                );
                Ok(job_name)
            }
            Err(e) => {
                let reason = e.to_string();
                self.roll_back(&mut video, &mut job, &reason);
                Err(TranscriptionError::Submission { job_name, reason })
            }
        }
    }

    /// Marks both records failed. Write errors are logged; the caller
    /// reports the original failure.
    fn roll_back(&self, video: &mut Video, job: &mut TranscriptionJob, reason: &str) {
        let store = &self.services.store;
        let now = Utc::now();
        warn!(
            "Submission of job {} for video {} failed: {}",
            job.job_name, video.id, reason
        );

        job.fail(reason, now);
        if let Err(e) = store.update_job_if_active(job) {
            error!("Failed to mark job {} failed: {}", job.job_name, e);
        }

        video.fail(reason, now);
        match store.update_video_if(video, TranscriptionStatus::InProgress) {
            Ok(true) => {}
            Ok(false) => warn!("Video {} changed during rollback, left as stored", video.id),
            Err(e) => error!("Failed to roll back video {}: {}", video.id, e),
        }

        self.services
            .broadcaster
            .publish(&video.id, &ProgressSnapshot::from_video(video));
    }

    /// `transcribe_<videoId>_<millis>`, bumping the timestamp on collision.
    fn unique_job_name(&self, video_id: &str, now: DateTime<Utc>) -> Result<String> {
        let base = now.timestamp_millis();
        for offset in 0..MAX_NAME_ATTEMPTS {
            let candidate = job_name(video_id, base + offset);
            if self.services.store.get_job(&candidate)?.is_none() {
                return Ok(candidate);
            }
        }
        Err(TranscriptionError::conflict(
            video_id,
            "could not allocate a unique job name",
        ))
    }
}

pub fn job_name(video_id: &str, millis: i64) -> String {
    format!("transcribe_{}_{}", video_id, millis)
}

/// Status recorded for an accepted job. Only the poller moves a job to a
/// terminal state, so anything but a queued or running answer counts as running.
fn accepted_status(status: RemoteJobStatus) -> RemoteJobStatus {
    match status {
        RemoteJobStatus::Pending | RemoteJobStatus::Queued | RemoteJobStatus::InProgress => {
            status
        }
        _ => RemoteJobStatus::InProgress,
    }
}
