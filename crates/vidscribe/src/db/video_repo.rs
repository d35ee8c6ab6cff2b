//! Video repository — CRUD operations for the `videos` table.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DatabaseError};

/// A raw video row from the database.
#[derive(Debug, Clone)]
pub struct VideoRow {
    pub id: String,
    pub title: String,
    pub media_location: String,
    pub language_code: String,
    pub transcription_status: String,
    pub job_name: Option<String>,
    pub transcription_text: Option<String>,
    pub confidence: Option<f64>,
    pub word_count: Option<i64>,
    pub error: Option<String>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl VideoRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            media_location: row.get("media_location")?,
            language_code: row.get("language_code")?,
            transcription_status: row.get("transcription_status")?,
            job_name: row.get("job_name")?,
            transcription_text: row.get("transcription_text")?,
            confidence: row.get("confidence")?,
            word_count: row.get("word_count")?,
            error: row.get("error")?,
            started_at: row.get("started_at")?,
            completed_at: row.get("completed_at")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Inserts a new video row.
pub fn insert(db: &Database, video: &VideoRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO videos (id, title, media_location, language_code, transcription_status,
             job_name, transcription_text, confidence, word_count, error, started_at,
             completed_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                video.id,
                video.title,
                video.media_location,
                video.language_code,
                video.transcription_status,
                video.job_name,
                video.transcription_text,
                video.confidence,
                video.word_count,
                video.error,
                video.started_at,
                video.completed_at,
                video.created_at,
                video.updated_at,
            ],
        )?;
        Ok(())
    })
}

const UPDATE_SQL: &str = "UPDATE videos SET title=?2, media_location=?3, language_code=?4,
     transcription_status=?5, job_name=?6, transcription_text=?7, confidence=?8,
     word_count=?9, error=?10, started_at=?11, completed_at=?12, updated_at=?13
     WHERE id=?1";

/// Updates an existing video row. All fields except `id` and `created_at` are overwritten.
/// Returns false if no row with that id exists.
pub fn update(db: &Database, video: &VideoRow) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(UPDATE_SQL, update_params(video).as_slice())?;
        Ok(changed > 0)
    })
}

/// Updates the row only if its stored status still equals `expected_status`.
///
/// Returns whether the row was written.
pub fn update_if_status(
    db: &Database,
    video: &VideoRow,
    expected_status: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let sql = format!("{} AND transcription_status=?14", UPDATE_SQL);
        let mut values = update_params(video);
        values.push(&expected_status);
        let changed = conn.execute(&sql, values.as_slice())?;
        Ok(changed > 0)
    })
}

fn update_params(video: &VideoRow) -> Vec<&dyn rusqlite::types::ToSql> {
    vec![
        &video.id,
        &video.title,
        &video.media_location,
        &video.language_code,
        &video.transcription_status,
        &video.job_name,
        &video.transcription_text,
        &video.confidence,
        &video.word_count,
        &video.error,
        &video.started_at,
        &video.completed_at,
        &video.updated_at,
    ]
}

/// Finds a video by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<VideoRow>, DatabaseError> {
    db.with_conn(|conn| {
        let row = conn
            .query_row(
                "SELECT * FROM videos WHERE id = ?1",
                params![id],
                VideoRow::from_row,
            )
            .optional()?;
        Ok(row)
    })
}

/// Lists videos with the given transcription status, oldest first.
pub fn list_by_status(db: &Database, status: &str) -> Result<Vec<VideoRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM videos WHERE transcription_status = ?1 ORDER BY created_at ASC",
        )?;
        let rows = stmt
            .query_map(params![status], VideoRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
