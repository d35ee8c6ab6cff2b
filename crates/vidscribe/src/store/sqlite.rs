//! SQLite-backed record store.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::db::job_repo::{self, JobRow};
use crate::db::video_repo::{self, VideoRow};
use crate::db::{Database, DatabaseError};
use crate::model::{
    RecognitionSettings, RemoteJobStatus, TranscriptionJob, TranscriptionStatus, Video,
};

use super::RecordStore;

// ─── Helpers ────────────────────────────────────────────────────────────────

fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            log::warn!("parse_timestamp: failed to parse '{}': {}", s, e);
            Utc::now()
        })
}

fn parse_status(s: &str) -> Result<TranscriptionStatus, DatabaseError> {
    s.parse().map_err(|reason| DatabaseError::InvalidValue {
        column: "transcription_status",
        reason,
    })
}

fn word_count_from_db(value: Option<i64>) -> Option<u32> {
    value.and_then(|v| u32::try_from(v).ok())
}

fn video_to_row(video: &Video) -> VideoRow {
    VideoRow {
        id: video.id.clone(),
        title: video.title.clone(),
        media_location: video.media_location.clone(),
        language_code: video.language_code.clone(),
        transcription_status: video.transcription_status.as_str().to_string(),
        job_name: video.job_name.clone(),
        transcription_text: video.transcription_text.clone(),
        confidence: video.confidence,
        word_count: video.word_count.map(i64::from),
        error: video.error.clone(),
        started_at: video.started_at.map(format_timestamp),
        completed_at: video.completed_at.map(format_timestamp),
        created_at: format_timestamp(video.created_at),
        updated_at: format_timestamp(video.updated_at),
    }
}

fn video_from_row(row: VideoRow) -> Result<Video, DatabaseError> {
    Ok(Video {
        transcription_status: parse_status(&row.transcription_status)?,
        started_at: row.started_at.as_deref().map(parse_timestamp),
        completed_at: row.completed_at.as_deref().map(parse_timestamp),
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
        word_count: word_count_from_db(row.word_count),
        id: row.id,
        title: row.title,
        media_location: row.media_location,
        language_code: row.language_code,
        job_name: row.job_name,
        transcription_text: row.transcription_text,
        confidence: row.confidence,
        error: row.error,
    })
}

fn job_to_row(job: &TranscriptionJob) -> Result<JobRow, DatabaseError> {
    let settings =
        serde_json::to_string(&job.settings).map_err(|e| DatabaseError::InvalidValue {
            column: "settings",
            reason: e.to_string(),
        })?;

    Ok(JobRow {
        job_name: job.job_name.clone(),
        video_id: job.video_id.clone(),
        media_uri: job.media_uri.clone(),
        language_code: job.language_code.clone(),
        output_uri: job.output_uri.clone(),
        settings,
        status: job.status.as_str().to_string(),
        transcription_text: job.transcription_text.clone(),
        confidence: job.confidence,
        word_count: job.word_count.map(i64::from),
        error: job.error.clone(),
        created_at: format_timestamp(job.created_at),
        submitted_at: job.submitted_at.map(format_timestamp),
        completed_at: job.completed_at.map(format_timestamp),
        updated_at: format_timestamp(job.updated_at),
    })
}

fn job_from_row(row: JobRow) -> Result<TranscriptionJob, DatabaseError> {
    let settings: RecognitionSettings =
        serde_json::from_str(&row.settings).map_err(|e| DatabaseError::InvalidValue {
            column: "settings",
            reason: e.to_string(),
        })?;

    Ok(TranscriptionJob {
        settings,
        status: RemoteJobStatus::from(row.status.as_str()),
        created_at: parse_timestamp(&row.created_at),
        submitted_at: row.submitted_at.as_deref().map(parse_timestamp),
        completed_at: row.completed_at.as_deref().map(parse_timestamp),
        updated_at: parse_timestamp(&row.updated_at),
        word_count: word_count_from_db(row.word_count),
        job_name: row.job_name,
        video_id: row.video_id,
        media_uri: row.media_uri,
        language_code: row.language_code,
        output_uri: row.output_uri,
        transcription_text: row.transcription_text,
        confidence: row.confidence,
        error: row.error,
    })
}

// ─── SqliteRecordStore ──────────────────────────────────────────────────────

/// Record store backed by the crate's rusqlite [`Database`].
#[derive(Clone)]
pub struct SqliteRecordStore {
    db: Database,
}

impl SqliteRecordStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Opens an in-memory store. Intended for tests and demos.
    pub fn in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl RecordStore for SqliteRecordStore {
    fn create_video(&self, mut video: Video) -> Result<Video, DatabaseError> {
        video.id = uuid::Uuid::new_v4().to_string();
        video_repo::insert(&self.db, &video_to_row(&video))?;
        log::debug!("Created video {} ({})", video.id, video.title);
        Ok(video)
    }

    fn get_video(&self, id: &str) -> Result<Option<Video>, DatabaseError> {
        video_repo::find_by_id(&self.db, id)?
            .map(video_from_row)
            .transpose()
    }

    fn update_video(&self, video: &Video) -> Result<(), DatabaseError> {
        if video_repo::update(&self.db, &video_to_row(video))? {
            Ok(())
        } else {
            Err(DatabaseError::MissingRecord {
                entity: "video",
                id: video.id.clone(),
            })
        }
    }

    fn update_video_if(
        &self,
        video: &Video,
        expected: TranscriptionStatus,
    ) -> Result<bool, DatabaseError> {
        video_repo::update_if_status(&self.db, &video_to_row(video), expected.as_str())
    }

    fn list_videos_by_status(
        &self,
        status: TranscriptionStatus,
    ) -> Result<Vec<Video>, DatabaseError> {
        video_repo::list_by_status(&self.db, status.as_str())?
            .into_iter()
            .map(video_from_row)
            .collect()
    }

    fn create_job(&self, job: &TranscriptionJob) -> Result<(), DatabaseError> {
        job_repo::insert(&self.db, &job_to_row(job)?)
    }

    fn get_job(&self, job_name: &str) -> Result<Option<TranscriptionJob>, DatabaseError> {
        job_repo::find_by_name(&self.db, job_name)?
            .map(job_from_row)
            .transpose()
    }

    fn update_job(&self, job: &TranscriptionJob) -> Result<(), DatabaseError> {
        if job_repo::update(&self.db, &job_to_row(job)?)? {
            Ok(())
        } else {
            Err(DatabaseError::MissingRecord {
                entity: "transcription job",
                id: job.job_name.clone(),
            })
        }
    }

    fn update_job_if_active(&self, job: &TranscriptionJob) -> Result<bool, DatabaseError> {
        job_repo::update_if_active(&self.db, &job_to_row(job)?)
    }

    fn list_jobs_for_video(&self, video_id: &str) -> Result<Vec<TranscriptionJob>, DatabaseError> {
        job_repo::list_for_video(&self.db, video_id)?
            .into_iter()
            .map(job_from_row)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::SubsecRound;

    fn store() -> SqliteRecordStore {
        SqliteRecordStore::in_memory().unwrap()
    }

    fn pending_job(store: &SqliteRecordStore, video_id: &str, name: &str) -> TranscriptionJob {
        let job = TranscriptionJob::pending(
            name,
            video_id,
            "s3://bucket/videos/a.mp4",
            "en-US",
            &format!("s3://bucket/transcriptions/{}.json", name),
            RecognitionSettings::default(),
            Utc::now(),
        );
        store.create_job(&job).unwrap();
        job
    }

    #[test]
    fn test_create_video_assigns_id() {
        let store = store();
        let video = store
            .create_video(Video::new("Talk", "videos/a.mp4", "en-US"))
            .unwrap();
        assert!(!video.id.is_empty());

        let loaded = store.get_video(&video.id).unwrap().unwrap();
        assert_eq!(loaded.title, "Talk");
        assert_eq!(loaded.transcription_status, TranscriptionStatus::NotStarted);
        assert_eq!(loaded.created_at, video.created_at.trunc_subsecs(6));
    }

    #[test]
    fn test_update_missing_video_is_an_error() {
        let store = store();
        let mut ghost = Video::new("Ghost", "k", "en-US");
        ghost.id = "missing".to_string();
        assert!(matches!(
            store.update_video(&ghost),
            Err(DatabaseError::MissingRecord { .. })
        ));
    }

    #[test]
    fn test_update_video_if_compares_status() {
        let store = store();
        let mut video = store
            .create_video(Video::new("Talk", "videos/a.mp4", "en-US"))
            .unwrap();

        video.begin_job("j1", Utc::now());
        assert!(store
            .update_video_if(&video, TranscriptionStatus::NotStarted)
            .unwrap());
        assert!(!store
            .update_video_if(&video, TranscriptionStatus::NotStarted)
            .unwrap());
    }

    #[test]
    fn test_job_round_trip_keeps_settings() {
        let store = store();
        let video = store
            .create_video(Video::new("Talk", "videos/a.mp4", "en-US"))
            .unwrap();
        let mut job = pending_job(&store, &video.id, "j1");
        job.settings.show_speaker_labels = true;
        job.settings.max_speaker_labels = Some(4);
        job.mark_submitted(RemoteJobStatus::Queued, Utc::now());
        store.update_job(&job).unwrap();

        let loaded = store.get_job("j1").unwrap().unwrap();
        assert_eq!(loaded.status, RemoteJobStatus::Queued);
        assert!(loaded.submitted_at.is_some());
        // Settings are immutable after creation.
        assert_eq!(loaded.settings, RecognitionSettings::default());
    }

    #[test]
    fn test_terminal_job_is_not_rewritten() {
        let store = store();
        let video = store
            .create_video(Video::new("Talk", "videos/a.mp4", "en-US"))
            .unwrap();
        let mut job = pending_job(&store, &video.id, "j1");

        job.complete("hello", 0.9, 1, Utc::now());
        assert!(store.update_job_if_active(&job).unwrap());
        job.fail("late", Utc::now());
        assert!(!store.update_job_if_active(&job).unwrap());

        let loaded = store.get_job("j1").unwrap().unwrap();
        assert_eq!(loaded.status, RemoteJobStatus::Completed);
        assert_eq!(loaded.word_count, Some(1));
    }

    #[test]
    fn test_list_jobs_for_video() {
        let store = store();
        let video = store
            .create_video(Video::new("Talk", "videos/a.mp4", "en-US"))
            .unwrap();
        pending_job(&store, &video.id, "first");
        pending_job(&store, &video.id, "second");

        let jobs = store.list_jobs_for_video(&video.id).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].job_name, "second");
    }

    #[test]
    fn test_invalid_status_in_db_is_reported() {
        let store = store();
        store
            .database()
            .with_conn(|conn| {
                conn.execute_batch("PRAGMA ignore_check_constraints = ON;")?;
                conn.execute(
                    "INSERT INTO videos (id, title, media_location, language_code, transcription_status, created_at, updated_at)
                     VALUES ('bad', 't', 'k', 'en-US', 'uploading', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
                    [],
                )?;
                Ok(())
            })
            .unwrap();

        assert!(matches!(
            store.get_video("bad"),
            Err(DatabaseError::InvalidValue { .. })
        ));
    }
}
