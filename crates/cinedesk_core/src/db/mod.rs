//! Durable key-value store backing the catalog blob.
//!
//! # Responsibility
//! - Open SQLite files holding the `kv_store` table.
//! - Classify storage failures the catalog store reports upward.
//!
//! # Invariants
//! - `kv_store` holds one row per storage key; the catalog lives under a
//!   single key and is always rewritten whole.
//! - Connections handed out already carry the latest `kv_store` schema
//!   (tracked via `PRAGMA user_version`).
//! - A file written by a newer schema is refused, never downgraded.

use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file was migrated by a newer cinedesk build.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl DbError {
    /// Whether the write was refused because the database hit its size
    /// limit (disk full or `max_page_count`).
    pub fn is_storage_full(&self) -> bool {
        match self {
            Self::Sqlite(err) => err.sqlite_error_code() == Some(ErrorCode::DiskFull),
            Self::UnsupportedSchemaVersion { .. } => false,
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) if self.is_storage_full() => {
                write!(f, "catalog storage is full: {err}")
            }
            Self::Sqlite(err) => write!(f, "catalog storage error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "kv_store schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
