//! Catalog blob repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist the whole `CatalogRecord` as one JSON value under one key.
//! - Keep SQL and JSON encoding inside the persistence boundary.
//!
//! # Invariants
//! - Every save rewrites the full blob and advances the row revision.
//! - A stored JSON `null` is treated like a missing key.
//! - Read paths reject malformed blobs instead of masking them.

use crate::db::DbError;
use crate::model::catalog::CatalogRecord;
use log::{debug, error};
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage key used by the admin panel.
pub const DEFAULT_STORAGE_KEY: &str = "movieData";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for catalog persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Serialization(serde_json::Error),
    InvalidData(String),
}

impl RepoError {
    /// Whether storage refused the write for lack of space.
    pub fn is_storage_full(&self) -> bool {
        matches!(self, Self::Db(err) if err.is_storage_full())
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "catalog serialization failed: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted catalog data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Durable storage for the catalog blob.
pub trait CatalogRepository {
    /// Returns `None` when nothing (or JSON `null`) is stored.
    fn load_catalog(&self) -> RepoResult<Option<CatalogRecord>>;
    /// Overwrites the stored blob with `record`.
    fn save_catalog(&self, record: &CatalogRecord) -> RepoResult<()>;
    /// Removes the stored blob. Returns whether anything was removed.
    fn clear_catalog(&self) -> RepoResult<bool>;
}

impl<R: CatalogRepository + ?Sized> CatalogRepository for &R {
    fn load_catalog(&self) -> RepoResult<Option<CatalogRecord>> {
        (**self).load_catalog()
    }

    fn save_catalog(&self, record: &CatalogRecord) -> RepoResult<()> {
        (**self).save_catalog(record)
    }

    fn clear_catalog(&self) -> RepoResult<bool> {
        (**self).clear_catalog()
    }
}

/// SQLite-backed repository over the `kv_store` table.
pub struct SqliteCatalogRepository<'conn> {
    conn: &'conn Connection,
    key: String,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    /// Repository bound to [`DEFAULT_STORAGE_KEY`].
    pub fn new(conn: &'conn Connection) -> Self {
        Self::with_key(conn, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(conn: &'conn Connection, key: impl Into<String>) -> Self {
        Self {
            conn,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Raw stored JSON text, if any.
    pub fn raw_value(&self) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [self.key.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Number of writes the current row has seen (`0` when absent).
    pub fn revision(&self) -> RepoResult<u64> {
        let revision = self
            .conn
            .query_row(
                "SELECT revision FROM kv_store WHERE key = ?1;",
                [self.key.as_str()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        match revision {
            None => Ok(0),
            Some(value) => u64::try_from(value).map_err(|_| {
                RepoError::InvalidData(format!("negative revision `{value}` in kv_store"))
            }),
        }
    }
}

impl CatalogRepository for SqliteCatalogRepository<'_> {
    fn load_catalog(&self) -> RepoResult<Option<CatalogRecord>> {
        let Some(raw) = self.raw_value()? else {
            return Ok(None);
        };

        let parsed: Option<CatalogRecord> = serde_json::from_str(&raw).map_err(|err| {
            error!(
                "event=catalog_load module=repo status=error key={} error_code=invalid_blob",
                self.key
            );
            RepoError::InvalidData(format!("key `{}` does not hold a catalog: {err}", self.key))
        })?;
        Ok(parsed)
    }

    fn save_catalog(&self, record: &CatalogRecord) -> RepoResult<()> {
        let encoded = serde_json::to_string(record)?;
        self.conn.execute(
            "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                revision = kv_store.revision + 1,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![self.key.as_str(), encoded],
        )?;
        debug!(
            "event=catalog_save module=repo status=ok key={} bytes={} entries={}",
            self.key,
            encoded.len(),
            record.len()
        );
        Ok(())
    }

    fn clear_catalog(&self) -> RepoResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM kv_store WHERE key = ?1;", [self.key.as_str()])?;
        Ok(removed > 0)
    }
}
