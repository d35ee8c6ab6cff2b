//! Job repository — CRUD operations for the `transcription_jobs` table.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DatabaseError};

/// Remote statuses after which a job record is never rewritten.
const TERMINAL_STATUSES: &str = "('COMPLETED', 'FAILED')";

/// A raw transcription job row from the database.
#[derive(Debug, Clone)]
pub struct JobRow {
    pub job_name: String,
    pub video_id: String,
    pub media_uri: String,
    pub language_code: String,
    pub output_uri: String,
    /// JSON-encoded recognition settings.
    pub settings: String,
    pub status: String,
    pub transcription_text: Option<String>,
    pub confidence: Option<f64>,
    pub word_count: Option<i64>,
    pub error: Option<String>,
    pub created_at: String,
    pub submitted_at: Option<String>,
    pub completed_at: Option<String>,
    pub updated_at: String,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            job_name: row.get("job_name")?,
            video_id: row.get("video_id")?,
            media_uri: row.get("media_uri")?,
            language_code: row.get("language_code")?,
            output_uri: row.get("output_uri")?,
            settings: row.get("settings")?,
            status: row.get("status")?,
            transcription_text: row.get("transcription_text")?,
            confidence: row.get("confidence")?,
            word_count: row.get("word_count")?,
            error: row.get("error")?,
            created_at: row.get("created_at")?,
            submitted_at: row.get("submitted_at")?,
            completed_at: row.get("completed_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Inserts a new job row.
pub fn insert(db: &Database, job: &JobRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO transcription_jobs (job_name, video_id, media_uri, language_code,
             output_uri, settings, status, transcription_text, confidence, word_count, error,
             created_at, submitted_at, completed_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                job.job_name,
                job.video_id,
                job.media_uri,
                job.language_code,
                job.output_uri,
                job.settings,
                job.status,
                job.transcription_text,
                job.confidence,
                job.word_count,
                job.error,
                job.created_at,
                job.submitted_at,
                job.completed_at,
                job.updated_at,
            ],
        )?;
        Ok(())
    })
}

const UPDATE_SQL: &str = "UPDATE transcription_jobs SET status=?2, transcription_text=?3,
     confidence=?4, word_count=?5, error=?6, submitted_at=?7, completed_at=?8, updated_at=?9
     WHERE job_name=?1";

/// Updates the mutable fields of a job. Identity, inputs and `created_at` never change.
pub fn update(db: &Database, job: &JobRow) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(UPDATE_SQL, update_params(job).as_slice())?;
        Ok(changed > 0)
    })
}

/// Updates the job only while its stored status is not terminal.
///
/// Returns whether the row was written.
pub fn update_if_active(db: &Database, job: &JobRow) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let sql = format!("{} AND status NOT IN {}", UPDATE_SQL, TERMINAL_STATUSES);
        let changed = conn.execute(&sql, update_params(job).as_slice())?;
        Ok(changed > 0)
    })
}

fn update_params(job: &JobRow) -> Vec<&dyn rusqlite::types::ToSql> {
    vec![
        &job.job_name,
        &job.status,
        &job.transcription_text,
        &job.confidence,
        &job.word_count,
        &job.error,
        &job.submitted_at,
        &job.completed_at,
        &job.updated_at,
    ]
}

/// Finds a job by its name.
pub fn find_by_name(db: &Database, job_name: &str) -> Result<Option<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let row = conn
            .query_row(
                "SELECT * FROM transcription_jobs WHERE job_name = ?1",
                params![job_name],
                JobRow::from_row,
            )
            .optional()?;
        Ok(row)
    })
}

/// Lists all jobs of a video, newest first.
pub fn list_for_video(db: &Database, video_id: &str) -> Result<Vec<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM transcription_jobs WHERE video_id = ?1
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt
            .query_map(params![video_id], JobRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Counts the non-terminal jobs of a video.
pub fn count_active_for_video(db: &Database, video_id: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let sql = format!(
            "SELECT COUNT(*) FROM transcription_jobs WHERE video_id = ?1 AND status NOT IN {}",
            TERMINAL_STATUSES
        );
        let count: u64 = conn.query_row(&sql, params![video_id], |r| r.get(0))?;
        Ok(count)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        let db = Database::open_in_memory().expect("Failed to create test database");
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO videos (id, title, media_location, language_code, created_at, updated_at)
                 VALUES ('v1', 'Talk', 'videos/talk.mp4', 'en-US', '2026-01-01', '2026-01-01')",
                [],
            )?;
            Ok(())
        })
        .unwrap();
        db
    }

    fn sample_job(name: &str, created_at: &str) -> JobRow {
        JobRow {
            job_name: name.to_string(),
            video_id: "v1".to_string(),
            media_uri: "s3://bucket/videos/talk.mp4".to_string(),
            language_code: "en-US".to_string(),
            output_uri: format!("s3://bucket/transcriptions/{}.json", name),
            settings: "{}".to_string(),
            status: "PENDING".to_string(),
            transcription_text: None,
            confidence: None,
            word_count: None,
            error: None,
            created_at: created_at.to_string(),
            submitted_at: None,
            completed_at: None,
            updated_at: created_at.to_string(),
        }
    }

    #[test]
    fn test_insert_and_find() {
        let db = test_db();
        insert(&db, &sample_job("j1", "2026-01-01T00:00:00.000000Z")).unwrap();

        let found = find_by_name(&db, "j1").unwrap().unwrap();
        assert_eq!(found.video_id, "v1");
        assert_eq!(found.status, "PENDING");
        assert!(find_by_name(&db, "j2").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_job_name_is_rejected() {
        let db = test_db();
        insert(&db, &sample_job("j1", "2026-01-01T00:00:00.000000Z")).unwrap();
        assert!(insert(&db, &sample_job("j1", "2026-01-01T00:00:01.000000Z")).is_err());
    }

    #[test]
    fn test_update_if_active_skips_terminal_rows() {
        let db = test_db();
        let mut job = sample_job("j1", "2026-01-01T00:00:00.000000Z");
        insert(&db, &job).unwrap();

        job.status = "COMPLETED".to_string();
        job.transcription_text = Some("first".to_string());
        assert!(update_if_active(&db, &job).unwrap());

        job.transcription_text = Some("second".to_string());
        assert!(!update_if_active(&db, &job).unwrap());

        let found = find_by_name(&db, "j1").unwrap().unwrap();
        assert_eq!(found.transcription_text.as_deref(), Some("first"));
    }

    #[test]
    fn test_list_for_video_newest_first() {
        let db = test_db();
        insert(&db, &sample_job("old", "2026-01-01T00:00:00.000000Z")).unwrap();
        insert(&db, &sample_job("new", "2026-01-02T00:00:00.000000Z")).unwrap();

        let rows = list_for_video(&db, "v1").unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.job_name.as_str()).collect();
        assert_eq!(names, vec!["new", "old"]);
    }

    #[test]
    fn test_count_active_for_video() {
        let db = test_db();
        insert(&db, &sample_job("a", "2026-01-01T00:00:00.000000Z")).unwrap();
        let mut done = sample_job("b", "2026-01-01T00:00:01.000000Z");
        done.status = "FAILED".to_string();
        insert(&db, &done).unwrap();

        assert_eq!(count_active_for_video(&db, "v1").unwrap(), 1);
    }
}
