//! Manual cancellation and retry of transcriptions.

use std::sync::Arc;

use chrono::Utc;
use log::{info, warn};

use super::submission::SubmissionManager;
use super::{bounded, Services};
use crate::error::{Result, TranscriptionError};
use crate::model::{ProgressSnapshot, TranscriptionOptions, TranscriptionStatus};
use crate::recognition::RecognitionError;

/// Failure reason recorded on canceled videos and jobs.
pub const CANCELED_REASON: &str = "canceled by user";

#[derive(Clone)]
pub struct CancellationManager {
    services: Arc<Services>,
    submission: SubmissionManager,
}

impl CancellationManager {
    pub(crate) fn new(services: Arc<Services>, submission: SubmissionManager) -> Self {
        Self {
            services,
            submission,
        }
    }

    /// Cancels an in-progress transcription.
    ///
    /// The remote cancel is best effort. Locally the video ends `failed`
    /// unless a poll settled the job first, in which case the video takes
    /// that job's outcome. Videos that are not in progress are left untouched.
    pub async fn cancel(&self, video_id: &str) -> Result<()> {
        let store = &self.services.store;
        let mut video = self.services.load_video(video_id)?;

        if video.transcription_status != TranscriptionStatus::InProgress {
            info!(
                "Nothing to cancel for video {} ({})",
                video_id, video.transcription_status
            );
            return Ok(());
        }

        if let Some(job_name) = video.job_name.clone() {
            let canceled = bounded(
                self.services.call_timeout,
                self.services.recognition.cancel(&job_name),
                RecognitionError::Timeout,
            )
            .await;
            match canceled {
                Ok(()) => info!("Canceled recognition job {}", job_name),
                Err(e) => warn!("Remote cancel of job {} failed: {}", job_name, e),
            }

            if let Some(mut job) = store.get_job(&job_name)? {
                job.fail(CANCELED_REASON, Utc::now());
                if !store.update_job_if_active(&job)? {
                    // A poll settled the job first; its outcome stands.
                    if let Some(settled) = store.get_job(&job_name)? {
                        info!(
                            "Job {} settled as {} before the cancel took effect",
                            job_name, settled.status
                        );
                        let snapshot = self.services.apply_settled_job(video, &settled)?;
                        self.services.broadcaster.publish(video_id, &snapshot);
                        return Ok(());
                    }
                }
            }
        }

        video.fail(CANCELED_REASON, Utc::now());
        if store.update_video_if(&video, TranscriptionStatus::InProgress)? {
            info!("Transcription of video {} canceled", video_id);
            self.services
                .broadcaster
                .publish(video_id, &ProgressSnapshot::from_video(&video));
        } else {
            info!("Video {} settled before the cancel took effect", video_id);
        }
        Ok(())
    }

    /// Resubmits a failed transcription under a new job name with the
    /// media, language and settings of the previous attempt.
    pub async fn retry(&self, video_id: &str) -> Result<String> {
        let video = self.services.load_video(video_id)?;

        if video.transcription_status != TranscriptionStatus::Failed {
            return Err(TranscriptionError::conflict(
                video_id,
                format!(
                    "retry requires a failed transcription, status is {}",
                    video.transcription_status
                ),
            ));
        }

        let options = self
            .services
            .store
            .list_jobs_for_video(video_id)?
            .first()
            .map(|job| job.settings.to_options())
            .unwrap_or_else(TranscriptionOptions::default);

        let media_location = video.media_location.clone();
        let language_code = video.language_code.clone();
        info!(
            "Retrying transcription of video {} (previous job {})",
            video_id,
            video.job_name.as_deref().unwrap_or("none")
        );

        self.submission
            .submit(video, &media_location, &language_code, &options)
            .await
    }
}
