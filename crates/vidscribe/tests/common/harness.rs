//! Test harness wiring a `TranscriptionOrchestrator` to fakes.
//!
//! The recognition fake answers every status query with the currently
//! scripted `RemoteJob`, after draining any one-shot errors. The artifact
//! fake serves documents by URI and counts fetches.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use vidscribe::config::OrchestratorConfig;
use vidscribe::{
    ArtifactError, ArtifactStore, RecognitionError, RecordStore, RemoteJob, RemoteJobStatus,
    SpeechRecognitionClient, SqliteRecordStore, SubmitRequest, TranscriptionJob,
    TranscriptionOrchestrator, Video,
};

pub const BUCKET: &str = "test-bucket";
pub const ARTIFACT_URI: &str = "s3://test-bucket/transcriptions/result.json";

#[derive(Default)]
struct RecognitionState {
    submissions: Vec<SubmitRequest>,
    submit_errors: VecDeque<RecognitionError>,
    accepted_status: Option<RemoteJobStatus>,
    remote: Option<RemoteJob>,
    status_errors: VecDeque<RecognitionError>,
    status_calls: usize,
    cancel_error: Option<RecognitionError>,
    cancels: Vec<String>,
}

/// Scripted stand-in for the recognition service.
#[derive(Default)]
pub struct FakeRecognitionClient {
    state: Mutex<RecognitionState>,
}

impl FakeRecognitionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `submit` fails with `err`.
    pub fn reject_next_submit(&self, err: RecognitionError) {
        self.state.lock().unwrap().submit_errors.push_back(err);
    }

    /// Status returned by `submit` on acceptance (default `IN_PROGRESS`).
    pub fn accept_as(&self, status: RemoteJobStatus) {
        self.state.lock().unwrap().accepted_status = Some(status);
    }

    /// What every later status query reports.
    pub fn set_remote(&self, remote: RemoteJob) {
        self.state.lock().unwrap().remote = Some(remote);
    }

    pub fn set_status(&self, status: RemoteJobStatus) {
        self.set_remote(RemoteJob::with_status(status));
    }

    pub fn complete_with(&self, artifact_uri: &str) {
        self.set_remote(RemoteJob {
            status: RemoteJobStatus::Completed,
            artifact_uri: Some(artifact_uri.to_string()),
            failure_reason: None,
        });
    }

    pub fn fail_with(&self, reason: &str) {
        self.set_remote(RemoteJob {
            status: RemoteJobStatus::Failed,
            artifact_uri: None,
            failure_reason: Some(reason.to_string()),
        });
    }

    /// The next status query fails with `err`.
    pub fn fail_next_status(&self, err: RecognitionError) {
        self.state.lock().unwrap().status_errors.push_back(err);
    }

    /// Every later cancel fails with `err`.
    pub fn fail_cancels(&self, err: RecognitionError) {
        self.state.lock().unwrap().cancel_error = Some(err);
    }

    pub fn submissions(&self) -> Vec<SubmitRequest> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn status_calls(&self) -> usize {
        self.state.lock().unwrap().status_calls
    }

    pub fn cancels(&self) -> Vec<String> {
        self.state.lock().unwrap().cancels.clone()
    }
}

#[async_trait::async_trait]
impl SpeechRecognitionClient for FakeRecognitionClient {
    async fn submit(&self, request: &SubmitRequest) -> Result<RemoteJobStatus, RecognitionError> {
        let mut state = self.state.lock().unwrap();
        state.submissions.push(request.clone());
        if let Some(err) = state.submit_errors.pop_front() {
            return Err(err);
        }
        Ok(state
            .accepted_status
            .clone()
            .unwrap_or(RemoteJobStatus::InProgress))
    }

    async fn get_status(&self, _job_name: &str) -> Result<RemoteJob, RecognitionError> {
        let mut state = self.state.lock().unwrap();
        state.status_calls += 1;
        if let Some(err) = state.status_errors.pop_front() {
            return Err(err);
        }
        Ok(state
            .remote
            .clone()
            .unwrap_or_else(|| RemoteJob::with_status(RemoteJobStatus::InProgress)))
    }

    async fn cancel(&self, job_name: &str) -> Result<(), RecognitionError> {
        let mut state = self.state.lock().unwrap();
        state.cancels.push(job_name.to_string());
        match &state.cancel_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// In-memory artifact store counting fetches.
#[derive(Default)]
pub struct FakeArtifactStore {
    documents: Mutex<HashMap<String, Result<Value, ArtifactError>>>,
    fetches: AtomicUsize,
}

impl FakeArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, uri: &str, document: Value) {
        self.documents
            .lock()
            .unwrap()
            .insert(uri.to_string(), Ok(document));
    }

    /// Fetching `uri` fails with `err` until replaced by `put`.
    pub fn fail(&self, uri: &str, err: ArtifactError) {
        self.documents
            .lock()
            .unwrap()
            .insert(uri.to_string(), Err(err));
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ArtifactStore for FakeArtifactStore {
    async fn fetch(&self, uri: &str) -> Result<Value, ArtifactError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.documents
            .lock()
            .unwrap()
            .get(uri)
            .cloned()
            .unwrap_or_else(|| Err(ArtifactError::NotFound(uri.to_string())))
    }
}

/// Orchestrator over an in-memory SQLite store and the fakes above.
pub struct TestHarness {
    pub store: Arc<SqliteRecordStore>,
    pub recognition: Arc<FakeRecognitionClient>,
    pub artifacts: Arc<FakeArtifactStore>,
    pub orchestrator: TranscriptionOrchestrator,
    pub config: OrchestratorConfig,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(Self::default_config())
    }

    pub fn default_config() -> OrchestratorConfig {
        let mut config = OrchestratorConfig::default();
        config.storage.bucket = BUCKET.to_string();
        config.polling.interval_secs = 5;
        config.polling.timeout_mins = 2;
        config
    }

    pub fn with_config(config: OrchestratorConfig) -> Self {
        let store = Arc::new(SqliteRecordStore::in_memory().expect("in-memory store"));
        let recognition = Arc::new(FakeRecognitionClient::new());
        let artifacts = Arc::new(FakeArtifactStore::new());

        let orchestrator = TranscriptionOrchestrator::new(
            store.clone(),
            recognition.clone(),
            artifacts.clone(),
            &config,
        );

        Self {
            store,
            recognition,
            artifacts,
            orchestrator,
            config,
        }
    }

    /// Registers a `not_started` video with media under `videos/`.
    pub fn register(&self, title: &str) -> Video {
        self.orchestrator
            .register_video(title, &format!("videos/{}.mp4", title), "english")
            .expect("register video")
    }

    /// Registers a video and starts a transcription for it.
    pub async fn started(&self, title: &str) -> (Video, String) {
        let video = self.register(title);
        let job_name = self
            .orchestrator
            .start(&video.id, &video.media_location, "english", &Default::default())
            .await
            .expect("start transcription");
        (video, job_name)
    }

    /// Scripts the remote job as completed with `artifact` as its result.
    pub fn complete_remote(&self, artifact: Value) {
        self.artifacts.put(ARTIFACT_URI, artifact);
        self.recognition.complete_with(ARTIFACT_URI);
    }

    pub fn video(&self, video_id: &str) -> Video {
        self.store
            .get_video(video_id)
            .expect("read video")
            .expect("video exists")
    }

    pub fn job(&self, job_name: &str) -> TranscriptionJob {
        self.store
            .get_job(job_name)
            .expect("read job")
            .expect("job exists")
    }

    pub fn jobs(&self, video_id: &str) -> Vec<TranscriptionJob> {
        self.store.list_jobs_for_video(video_id).expect("list jobs")
    }

    pub fn active_jobs(&self, video_id: &str) -> usize {
        self.jobs(video_id).iter().filter(|j| j.is_active()).count()
    }
}
