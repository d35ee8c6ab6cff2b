//! Record store for videos and transcription jobs.
//!
//! The orchestrator only talks to the [`RecordStore`] trait; the SQLite
//! implementation lives in [`sqlite`]. Calls are synchronous and short, so
//! they are made directly from async code.

pub mod sqlite;

pub use sqlite::SqliteRecordStore;

use crate::db::DatabaseError;
use crate::model::{TranscriptionJob, TranscriptionStatus, Video};

/// Durable storage for `Video` and `TranscriptionJob` records.
///
/// No transaction spans two calls. The conditional writes are the only
/// atomic read-modify-write primitives.
pub trait RecordStore: Send + Sync {
    /// Persists a new video and returns it with its store-assigned id.
    fn create_video(&self, video: Video) -> Result<Video, DatabaseError>;

    fn get_video(&self, id: &str) -> Result<Option<Video>, DatabaseError>;

    fn update_video(&self, video: &Video) -> Result<(), DatabaseError>;

    /// Writes `video` only if the stored status still equals `expected`.
    fn update_video_if(
        &self,
        video: &Video,
        expected: TranscriptionStatus,
    ) -> Result<bool, DatabaseError>;

    fn list_videos_by_status(
        &self,
        status: TranscriptionStatus,
    ) -> Result<Vec<Video>, DatabaseError>;

    fn create_job(&self, job: &TranscriptionJob) -> Result<(), DatabaseError>;

    fn get_job(&self, job_name: &str) -> Result<Option<TranscriptionJob>, DatabaseError>;

    fn update_job(&self, job: &TranscriptionJob) -> Result<(), DatabaseError>;

    /// Writes `job` only while the stored job is not terminal.
    fn update_job_if_active(&self, job: &TranscriptionJob) -> Result<bool, DatabaseError>;

    /// All attempts for a video, newest first.
    fn list_jobs_for_video(&self, video_id: &str) -> Result<Vec<TranscriptionJob>, DatabaseError>;
}
