//! Database migration system.
//!
//! Tracks applied migrations in a `_migrations` table and applies
//! pending ones in order, each inside its own transaction.

use rusqlite::Connection;

use super::error::DatabaseError;

/// A single migration definition.
struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
}

/// All migrations in order. Each is applied at most once.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create_videos_table",
        sql: include_str!("sql/001_create_videos.sql"),
    },
    Migration {
        version: 2,
        description: "create_transcription_jobs_table",
        sql: include_str!("sql/002_create_transcription_jobs.sql"),
    },
    Migration {
        version: 3,
        description: "add_job_status_index",
        sql: include_str!("sql/003_add_job_status_index.sql"),
    },
];

/// Runs all pending migrations on the given connection.
pub fn run_all(conn: &mut Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |r| r.get(0),
    )?;

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        log::info!(
            "Running migration v{}: {}",
            migration.version,
            migration.description
        );

        let tx = conn.transaction()?;
        tx.execute_batch(migration.sql)
            .map_err(|e| DatabaseError::Migration {
                version: migration.version,
                reason: e.to_string(),
            })?;
        tx.execute(
            "INSERT INTO _migrations (version, description) VALUES (?1, ?2)",
            rusqlite::params![migration.version, migration.description],
        )?;
        tx.commit()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        conn
    }

    #[test]
    fn test_migrations_run_on_fresh_db() {
        let mut conn = fresh();
        run_all(&mut conn).unwrap();

        let count: u32 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as u32);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let mut conn = fresh();
        run_all(&mut conn).unwrap();
        run_all(&mut conn).unwrap();

        let count: u32 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as u32);
    }

    #[test]
    fn test_video_status_is_constrained() {
        let mut conn = fresh();
        run_all(&mut conn).unwrap();

        let result = conn.execute(
            "INSERT INTO videos (id, title, media_location, language_code, transcription_status, created_at, updated_at)
             VALUES ('v1', 't', 'k', 'en-US', 'uploading', '2026-01-01', '2026-01-01')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_jobs_reference_videos() {
        let mut conn = fresh();
        run_all(&mut conn).unwrap();

        let result = conn.execute(
            "INSERT INTO transcription_jobs (job_name, video_id, media_uri, language_code, output_uri, settings, created_at, updated_at)
             VALUES ('j1', 'missing', 's3://b/k', 'en-US', 's3://b/o.json', '{}', '2026-01-01', '2026-01-01')",
            [],
        );
        assert!(result.is_err());
    }
}
