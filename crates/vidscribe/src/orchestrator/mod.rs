//! Transcription job orchestration.
//!
//! [`TranscriptionOrchestrator`] is the facade callers use. It owns the
//! injected collaborators and composes the submission, polling,
//! cancellation and scheduling components.

pub mod cancellation;
pub mod poller;
pub mod scheduler;
pub mod submission;

pub use cancellation::{CancellationManager, CANCELED_REASON};
pub use poller::StatusPoller;
pub use scheduler::{PollExit, PollScheduler};
pub use submission::SubmissionManager;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::info;
use tokio::sync::broadcast;

use crate::artifact::{ArtifactStore, FsArtifactStore, HttpArtifactStore};
use crate::broadcast::{ProgressBroadcaster, ProgressEvent};
use crate::config::{OrchestratorConfig, StorageConfig};
use crate::db::Database;
use crate::error::{Result, SetupError, TranscriptionError};
use crate::language::resolve_language_code;
use crate::model::{
    ProgressSnapshot, RemoteJobStatus, TranscriptionJob, TranscriptionOptions,
    TranscriptionStatus, Video,
};
use crate::parser;
use crate::recognition::{HttpRecognitionClient, SpeechRecognitionClient};
use crate::store::{RecordStore, SqliteRecordStore};

/// Collaborators and settings shared by the orchestration components.
pub(crate) struct Services {
    pub store: Arc<dyn RecordStore>,
    pub recognition: Arc<dyn SpeechRecognitionClient>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub broadcaster: ProgressBroadcaster,
    pub storage: StorageConfig,
    /// Bound on every remote call.
    pub call_timeout: Duration,
}

impl Services {
    pub fn load_video(&self, video_id: &str) -> Result<Video> {
        self.store
            .get_video(video_id)?
            .ok_or_else(|| TranscriptionError::VideoNotFound(video_id.to_string()))
    }

    /// Copies the outcome of an already settled job onto its in-progress
    /// video. A video that moved on in the meantime is returned as stored.
    pub fn apply_settled_job(
        &self,
        video: Video,
        job: &TranscriptionJob,
    ) -> Result<ProgressSnapshot> {
        let now = Utc::now();
        let mut updated = video;

        match (&job.status, &job.transcription_text) {
            (RemoteJobStatus::Completed, Some(text)) => updated.complete(
                text,
                job.confidence.unwrap_or(0.0),
                job.word_count.unwrap_or_else(|| parser::count_words(text)),
                now,
            ),
            _ => updated.fail(
                job.error.as_deref().unwrap_or("transcription job failed"),
                now,
            ),
        }

        info!(
            "Video {} synchronised with settled job {}",
            updated.id, job.job_name
        );
        if self
            .store
            .update_video_if(&updated, TranscriptionStatus::InProgress)?
        {
            Ok(ProgressSnapshot::from_video(&updated))
        } else {
            self.stored_snapshot(&updated.id)
        }
    }

    pub fn stored_snapshot(&self, video_id: &str) -> Result<ProgressSnapshot> {
        let video = self.load_video(video_id)?;
        Ok(ProgressSnapshot::from_video(&video))
    }
}

/// Awaits `call`, mapping an elapsed `limit` to `on_timeout(limit_secs)`.
pub(crate) async fn bounded<T, E, F>(
    limit: Duration,
    call: F,
    on_timeout: impl FnOnce(u64) -> E,
) -> std::result::Result<T, E>
where
    F: Future<Output = std::result::Result<T, E>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout(limit.as_secs())),
    }
}

pub struct TranscriptionOrchestrator {
    services: Arc<Services>,
    submission: SubmissionManager,
    poller: StatusPoller,
    cancellation: CancellationManager,
    scheduler: PollScheduler,
}

impl TranscriptionOrchestrator {
    /// Builds an orchestrator around explicitly constructed collaborators.
    pub fn new(
        store: Arc<dyn RecordStore>,
        recognition: Arc<dyn SpeechRecognitionClient>,
        artifacts: Arc<dyn ArtifactStore>,
        config: &OrchestratorConfig,
    ) -> Self {
        let broadcaster = ProgressBroadcaster::default();
        let services = Arc::new(Services {
            store,
            recognition,
            artifacts,
            broadcaster: broadcaster.clone(),
            storage: config.storage.clone(),
            call_timeout: config.recognition.request_timeout(),
        });

        let submission = SubmissionManager::new(Arc::clone(&services));
        let poller = StatusPoller::new(Arc::clone(&services));
        let cancellation = CancellationManager::new(Arc::clone(&services), submission.clone());
        let scheduler = PollScheduler::new(poller.clone(), broadcaster, &config.polling);

        Self {
            services,
            submission,
            poller,
            cancellation,
            scheduler,
        }
    }

    /// Wires the SQLite store and the HTTP clients described by `config`.
    pub fn from_config(config: &OrchestratorConfig) -> std::result::Result<Self, SetupError> {
        crate::config::loader::validate_config(config)?;

        let db_path = config
            .database
            .resolved_path()
            .ok_or(SetupError::NoDatabasePath)?;
        let store = SqliteRecordStore::new(Database::open(&db_path)?);

        let api_key = config.recognition.api_key_source().resolve_optional()?;
        let timeout_secs = config.recognition.request_timeout_secs;
        let recognition =
            HttpRecognitionClient::new(&config.recognition.endpoint, api_key, timeout_secs)?;

        let artifacts: Arc<dyn ArtifactStore> = match &config.artifacts.local_root {
            Some(root) => Arc::new(FsArtifactStore::new(root)),
            None => Arc::new(HttpArtifactStore::new(
                config.artifacts.endpoint.as_deref(),
                timeout_secs,
            )?),
        };

        info!(
            "Orchestrator ready (bucket={}, recognition={})",
            config.storage.bucket, config.recognition.endpoint
        );
        Ok(Self::new(
            Arc::new(store),
            Arc::new(recognition),
            artifacts,
            config,
        ))
    }

    /// Records an uploaded video with status `not_started`.
    pub fn register_video(&self, title: &str, media_location: &str, language: &str) -> Result<Video> {
        let video = Video::new(title, media_location.trim(), &resolve_language_code(language));
        let video = self.services.store.create_video(video)?;
        info!("Registered video {} ({})", video.id, video.title);
        Ok(video)
    }

    pub fn video(&self, video_id: &str) -> Result<Video> {
        self.services.load_video(video_id)
    }

    /// Stored transcript text; `None` unless the transcription completed.
    pub fn transcription_result(&self, video_id: &str) -> Result<Option<String>> {
        let video = self.services.load_video(video_id)?;
        Ok(match video.transcription_status {
            TranscriptionStatus::Completed => video.transcription_text,
            _ => None,
        })
    }

    /// Every attempt for a video, newest first.
    pub fn job_history(&self, video_id: &str) -> Result<Vec<TranscriptionJob>> {
        self.services.load_video(video_id)?;
        Ok(self.services.store.list_jobs_for_video(video_id)?)
    }

    pub async fn start(
        &self,
        video_id: &str,
        media_location: &str,
        language_code: &str,
        options: &TranscriptionOptions,
    ) -> Result<String> {
        self.submission
            .start(video_id, media_location, language_code, options)
            .await
    }

    pub async fn check_progress(&self, video_id: &str) -> Result<ProgressSnapshot> {
        self.poller.check_progress(video_id).await
    }

    /// Stops background polling for the video, then cancels its job.
    pub async fn cancel(&self, video_id: &str) -> Result<()> {
        self.scheduler.stop(video_id).await;
        self.cancellation.cancel(video_id).await
    }

    pub async fn retry(&self, video_id: &str) -> Result<String> {
        self.cancellation.retry(video_id).await
    }

    /// Starts a transcription and polls it in the background.
    pub async fn start_and_track(
        &self,
        video_id: &str,
        media_location: &str,
        language_code: &str,
        options: &TranscriptionOptions,
    ) -> Result<String> {
        let job_name = self
            .start(video_id, media_location, language_code, options)
            .await?;
        self.scheduler.track(video_id);
        Ok(job_name)
    }

    /// Retries a failed transcription and polls it in the background.
    pub async fn retry_and_track(&self, video_id: &str) -> Result<String> {
        let job_name = self.retry(video_id).await?;
        self.scheduler.track(video_id);
        Ok(job_name)
    }

    pub fn track(&self, video_id: &str) -> bool {
        self.scheduler.track(video_id)
    }

    pub async fn stop_tracking(&self, video_id: &str) -> bool {
        self.scheduler.stop(video_id).await
    }

    pub fn is_tracking(&self, video_id: &str) -> bool {
        self.scheduler.is_tracking(video_id)
    }

    /// Resumes polling for every video left `in_progress`, e.g. after a restart.
    /// Returns how many videos are now tracked by this call.
    pub fn resume_tracking(&self) -> Result<usize> {
        let videos = self
            .services
            .store
            .list_videos_by_status(TranscriptionStatus::InProgress)?;
        let resumed = videos.iter().filter(|v| self.scheduler.track(&v.id)).count();
        if resumed > 0 {
            info!("Resumed polling for {} video(s)", resumed);
        }
        Ok(resumed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.services.broadcaster.subscribe()
    }

    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
    }
}
