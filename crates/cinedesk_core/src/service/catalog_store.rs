//! In-memory catalog mirrored to durable storage.
//!
//! # Responsibility
//! - Load the catalog once, serve category sequences for display.
//! - Apply append/replace/remove and re-serialize the whole record.
//!
//! # Invariants
//! - Storage is written before the in-memory record changes; a failed
//!   write leaves memory at the last persisted state.
//! - Replace/remove of an absent id never touches storage.
//! - The id clock observes the largest loaded id, so a unique-id clock
//!   never hands out an id already stored.
//! - An append whose id already exists in the category replaces that
//!   entry in place (last write wins).

use crate::model::catalog::CatalogRecord;
use crate::model::category::Category;
use crate::model::movie::{MovieEntry, MovieId};
use crate::repo::catalog_repo::{CatalogRepository, RepoResult};
use crate::service::clock::{IdClock, SystemIdClock};
use log::{info, warn};

/// Explicit catalog store owned by one UI layer.
pub struct CatalogStore<R: CatalogRepository> {
    repo: R,
    record: CatalogRecord,
    clock: Box<dyn IdClock>,
}

impl<R: CatalogRepository> CatalogStore<R> {
    /// Loads the catalog from `repo`, defaulting to three empty categories.
    pub fn open(repo: R) -> RepoResult<Self> {
        Self::open_with_clock(repo, Box::new(SystemIdClock::new()))
    }

    /// Same as [`CatalogStore::open`] with a caller-provided id source.
    pub fn open_with_clock(repo: R, clock: Box<dyn IdClock>) -> RepoResult<Self> {
        let loaded = repo.load_catalog()?;
        let status = if loaded.is_some() { "ok" } else { "empty" };
        let record = loaded.unwrap_or_default();
        if let Some(max_id) = record.max_id() {
            clock.observe(max_id);
        }
        info!(
            "event=catalog_open module=store status={} entries={}",
            status,
            record.len()
        );
        Ok(Self {
            repo,
            record,
            clock,
        })
    }

    pub fn record(&self) -> &CatalogRecord {
        &self.record
    }

    pub fn entries(&self, category: Category) -> &[MovieEntry] {
        self.record.entries(category)
    }

    pub fn find(&self, category: Category, id: MovieId) -> Option<&MovieEntry> {
        self.record.find(category, id)
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Appends `entry` under a fresh id and returns that id.
    ///
    /// The entry is stored as given apart from its id; submit defaults are
    /// the caller's concern.
    pub fn append(&mut self, category: Category, entry: MovieEntry) -> RepoResult<MovieId> {
        let id = self.clock.next_id();
        let stored = MovieEntry { id, ..entry };

        let mut entries = self.entries(category).to_vec();
        match entries.iter().position(|existing| existing.id == id) {
            Some(index) => {
                warn!(
                    "event=catalog_append module=store status=collision category={category} id={id}"
                );
                entries[index] = stored;
            }
            None => entries.push(stored),
        }

        self.commit(category, entries)?;
        info!("event=catalog_append module=store status=ok category={category} id={id}");
        Ok(id)
    }

    /// Replaces the entry with `id`, keeping that id.
    ///
    /// Returns `false` without writing when `id` is not in `category`.
    pub fn replace(
        &mut self,
        category: Category,
        id: MovieId,
        entry: MovieEntry,
    ) -> RepoResult<bool> {
        let Some(index) = self.position(category, id) else {
            info!("event=catalog_replace module=store status=skip category={category} id={id}");
            return Ok(false);
        };

        let mut entries = self.entries(category).to_vec();
        entries[index] = MovieEntry { id, ..entry };
        self.commit(category, entries)?;
        info!("event=catalog_replace module=store status=ok category={category} id={id}");
        Ok(true)
    }

    /// Removes the entry with `id`.
    ///
    /// Returns `false` without writing when `id` is not in `category`.
    pub fn remove(&mut self, category: Category, id: MovieId) -> RepoResult<bool> {
        if self.position(category, id).is_none() {
            info!("event=catalog_remove module=store status=skip category={category} id={id}");
            return Ok(false);
        }

        let entries = self
            .entries(category)
            .iter()
            .filter(|entry| entry.id != id)
            .cloned()
            .collect();
        self.commit(category, entries)?;
        info!("event=catalog_remove module=store status=ok category={category} id={id}");
        Ok(true)
    }

    /// Empties every category and persists the empty record.
    pub fn reset(&mut self) -> RepoResult<()> {
        let empty = CatalogRecord::default();
        self.repo.save_catalog(&empty)?;
        self.record = empty;
        info!("event=catalog_reset module=store status=ok");
        Ok(())
    }

    fn position(&self, category: Category, id: MovieId) -> Option<usize> {
        self.entries(category)
            .iter()
            .position(|entry| entry.id == id)
    }

    fn commit(&mut self, category: Category, entries: Vec<MovieEntry>) -> RepoResult<()> {
        let next = self.record.with_entries(category, entries);
        if let Err(err) = self.repo.save_catalog(&next) {
            let error_code = if err.is_storage_full() {
                "storage_full"
            } else {
                "write_failed"
            };
            warn!(
                "event=catalog_sync module=store status=error category={category} error_code={error_code} error={err}"
            );
            return Err(err);
        }
        self.record = next;
        Ok(())
    }
}
