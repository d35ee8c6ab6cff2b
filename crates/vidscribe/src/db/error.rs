//! Failures of the SQLite record store.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The database directory could not be created.
    #[error("Cannot prepare database directory '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema migration {version} failed: {reason}")]
    Migration { version: u32, reason: String },

    /// A thread panicked while holding the connection.
    #[error("Database connection lock poisoned")]
    LockPoisoned,

    /// An unconditional update named a video or job that is not stored.
    #[error("No {entity} record with id '{id}'")]
    MissingRecord { entity: &'static str, id: String },

    /// A stored column holds a status or setting this crate cannot read.
    #[error("Invalid value in column '{column}': {reason}")]
    InvalidValue { column: &'static str, reason: String },
}
