use cinedesk_core::db::{open_db, open_db_in_memory};
use cinedesk_core::{
    CatalogRecord, CatalogRepository, CatalogStore, Category, ManualIdClock, MovieEntry,
    RepoError, RepoResult, SqliteCatalogRepository,
};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;

#[test]
fn empty_storage_opens_with_three_empty_categories() {
    let conn = open_db_in_memory().unwrap();
    let store = CatalogStore::open(SqliteCatalogRepository::new(&conn)).unwrap();

    for category in Category::ALL {
        assert!(store.entries(category).is_empty());
    }
    assert_eq!(store.repository().revision().unwrap(), 0);
}

#[test]
fn appends_assign_unique_ids_and_persist_every_time() {
    let conn = open_db_in_memory().unwrap();
    let mut store = CatalogStore::open(SqliteCatalogRepository::new(&conn)).unwrap();

    let mut ids = HashSet::new();
    for n in 0..25 {
        let id = store
            .append(Category::Trending, MovieEntry::titled(format!("movie {n}")))
            .unwrap();
        ids.insert(id);
    }

    assert_eq!(ids.len(), 25);
    assert_eq!(store.entries(Category::Trending).len(), 25);
    assert_eq!(store.repository().revision().unwrap(), 25);
    assert_eq!(
        store.entries(Category::Trending)[0].title,
        "movie 0",
        "appends keep insertion order"
    );
}

#[test]
fn replace_only_touches_the_target_entry() {
    let conn = open_db_in_memory().unwrap();
    let mut store = CatalogStore::open_with_clock(
        SqliteCatalogRepository::new(&conn),
        Box::new(ManualIdClock::new([1, 2, 3])),
    )
    .unwrap();
    store.append(Category::TopRating, MovieEntry::titled("Alien")).unwrap();
    store.append(Category::TopRating, MovieEntry::titled("Heat")).unwrap();
    store.append(Category::NewRelease, MovieEntry::titled("Dune")).unwrap();

    let before = serde_json::to_string(store.record()).unwrap();
    let untouched_trending = serde_json::to_value(store.entries(Category::Trending)).unwrap();
    let untouched_new = serde_json::to_value(store.entries(Category::NewRelease)).unwrap();

    let mut edited = store.find(Category::TopRating, 2).unwrap().clone();
    edited.title = "Heat (1995)".to_string();
    edited.id = 999;
    assert!(store.replace(Category::TopRating, 2, edited).unwrap());

    let top = store.entries(Category::TopRating);
    assert_eq!(top[0], MovieEntry { id: 1, ..MovieEntry::titled("Alien") });
    assert_eq!(top[1].id, 2, "replace keeps the original id");
    assert_eq!(top[1].title, "Heat (1995)");
    assert_eq!(
        serde_json::to_value(store.entries(Category::Trending)).unwrap(),
        untouched_trending
    );
    assert_eq!(
        serde_json::to_value(store.entries(Category::NewRelease)).unwrap(),
        untouched_new
    );
    assert_ne!(serde_json::to_string(store.record()).unwrap(), before);
}

#[test]
fn absent_ids_are_no_ops_without_storage_writes() {
    let conn = open_db_in_memory().unwrap();
    let mut store = CatalogStore::open(SqliteCatalogRepository::new(&conn)).unwrap();
    let id = store
        .append(Category::Trending, MovieEntry::titled("Arrival"))
        .unwrap();
    let revision = store.repository().revision().unwrap();
    let snapshot = store.record().clone();

    assert!(!store.remove(Category::Trending, id + 1).unwrap());
    assert!(!store.remove(Category::TopRating, id).unwrap());
    assert!(!store
        .replace(Category::NewRelease, id, MovieEntry::titled("x"))
        .unwrap());

    assert_eq!(store.repository().revision().unwrap(), revision);
    assert_eq!(store.record(), &snapshot);
}

#[test]
fn remove_keeps_remaining_order() {
    let conn = open_db_in_memory().unwrap();
    let mut store = CatalogStore::open_with_clock(
        SqliteCatalogRepository::new(&conn),
        Box::new(ManualIdClock::new([10, 20, 30])),
    )
    .unwrap();
    for title in ["a", "b", "c"] {
        store.append(Category::NewRelease, MovieEntry::titled(title)).unwrap();
    }

    assert!(store.remove(Category::NewRelease, 20).unwrap());

    let ids: Vec<_> = store
        .entries(Category::NewRelease)
        .iter()
        .map(|entry| entry.id)
        .collect();
    assert_eq!(ids, vec![10, 30]);
}

#[test]
fn colliding_ids_replace_in_place() {
    let conn = open_db_in_memory().unwrap();
    let mut store = CatalogStore::open_with_clock(
        SqliteCatalogRepository::new(&conn),
        Box::new(ManualIdClock::frozen(42)),
    )
    .unwrap();

    store.append(Category::Trending, MovieEntry::titled("first")).unwrap();
    store.append(Category::Trending, MovieEntry::titled("second")).unwrap();

    let entries = store.entries(Category::Trending);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, 42);
    assert_eq!(entries[0].title, "second");
}

#[test]
fn stores_opened_per_call_never_reuse_an_id() {
    let conn = open_db_in_memory().unwrap();

    for title in ["first", "second", "third"] {
        let mut store = CatalogStore::open(SqliteCatalogRepository::new(&conn)).unwrap();
        store
            .append(Category::Trending, MovieEntry::titled(title))
            .unwrap();
    }

    let store = CatalogStore::open(SqliteCatalogRepository::new(&conn)).unwrap();
    let titles: Vec<_> = store
        .entries(Category::Trending)
        .iter()
        .map(|entry| entry.title.as_str())
        .collect();
    assert_eq!(titles, vec!["first", "second", "third"]);
}

#[test]
fn append_moves_past_ids_stored_ahead_of_the_clock() {
    let conn = open_db_in_memory().unwrap();
    let future_id = 4_000_000_000_000;
    let mut seeded = CatalogRecord::default();
    seeded.set_entries(
        Category::NewRelease,
        vec![MovieEntry {
            id: future_id,
            ..MovieEntry::titled("from a fast clock")
        }],
    );
    SqliteCatalogRepository::new(&conn)
        .save_catalog(&seeded)
        .unwrap();

    let mut store = CatalogStore::open(SqliteCatalogRepository::new(&conn)).unwrap();
    let id = store
        .append(Category::NewRelease, MovieEntry::titled("local"))
        .unwrap();

    assert!(id > future_id);
    assert_eq!(store.entries(Category::NewRelease).len(), 2);
}

#[test]
fn state_survives_reopen_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.db");

    let id = {
        let conn = open_db(&path).unwrap();
        let mut store = CatalogStore::open(SqliteCatalogRepository::new(&conn)).unwrap();
        store
            .append(Category::TopRating, MovieEntry::titled("Stalker"))
            .unwrap()
    };

    let conn = open_db(&path).unwrap();
    let store = CatalogStore::open(SqliteCatalogRepository::new(&conn)).unwrap();
    let loaded = store.find(Category::TopRating, id).unwrap();
    assert_eq!(loaded.title, "Stalker");

    let raw = store.repository().raw_value().unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert!(json["topRating"].is_array());
    assert!(json["trending"].is_array());
    assert!(json["newRelease"].is_array());
}

#[test]
fn reset_persists_an_empty_record() {
    let conn = open_db_in_memory().unwrap();
    let mut store = CatalogStore::open(SqliteCatalogRepository::new(&conn)).unwrap();
    store
        .append(Category::NewRelease, MovieEntry::titled("Nope"))
        .unwrap();

    store.reset().unwrap();

    assert!(store.record().is_empty());
    let reopened = CatalogStore::open(SqliteCatalogRepository::new(&conn)).unwrap();
    assert!(reopened.record().is_empty());
}

#[test]
fn custom_storage_key_is_isolated_from_the_default() {
    let conn = open_db_in_memory().unwrap();
    let mut staging =
        CatalogStore::open(SqliteCatalogRepository::with_key(&conn, "movieData.staging"))
            .unwrap();
    staging
        .append(Category::Trending, MovieEntry::titled("Staged"))
        .unwrap();

    let live = CatalogStore::open(SqliteCatalogRepository::new(&conn)).unwrap();
    assert!(live.record().is_empty());
}

#[test]
fn full_storage_is_reported_and_memory_stays_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let mut store = CatalogStore::open(SqliteCatalogRepository::new(&conn)).unwrap();
    store
        .append(Category::TopRating, MovieEntry::titled("fits"))
        .unwrap();
    let snapshot = store.record().clone();
    let pages: i64 = conn
        .query_row("PRAGMA page_count;", [], |row| row.get(0))
        .unwrap();
    conn.query_row(&format!("PRAGMA max_page_count = {pages};"), [], |_| Ok(()))
        .unwrap();

    let err = store
        .append(Category::TopRating, MovieEntry::titled("x".repeat(64 * 1024)))
        .unwrap_err();

    assert!(err.is_storage_full(), "unexpected error: {err}");
    assert!(err.to_string().contains("catalog storage is full"));
    assert_eq!(store.record(), &snapshot);
}

/// Repository whose writes can be switched to fail.
#[derive(Default)]
struct FlakyRepository {
    saved: RefCell<Option<CatalogRecord>>,
    fail_writes: Cell<bool>,
}

impl CatalogRepository for FlakyRepository {
    fn load_catalog(&self) -> RepoResult<Option<CatalogRecord>> {
        Ok(self.saved.borrow().clone())
    }

    fn save_catalog(&self, record: &CatalogRecord) -> RepoResult<()> {
        if self.fail_writes.get() {
            return Err(RepoError::InvalidData("disk full".to_string()));
        }
        *self.saved.borrow_mut() = Some(record.clone());
        Ok(())
    }

    fn clear_catalog(&self) -> RepoResult<bool> {
        Ok(self.saved.borrow_mut().take().is_some())
    }
}

#[test]
fn failed_write_is_surfaced_and_memory_stays_unchanged() {
    let repo = FlakyRepository::default();
    let mut store =
        CatalogStore::open_with_clock(&repo, Box::new(ManualIdClock::new([1, 2]))).unwrap();
    store.append(Category::TopRating, MovieEntry::titled("kept")).unwrap();
    let snapshot = store.record().clone();

    repo.fail_writes.set(true);
    let err = store
        .append(Category::TopRating, MovieEntry::titled("lost"))
        .unwrap_err();
    assert!(err.to_string().contains("disk full"));
    assert!(!err.is_storage_full());
    assert!(store.remove(Category::TopRating, 1).is_err());

    assert_eq!(store.record(), &snapshot);
    assert_eq!(repo.saved.borrow().as_ref(), Some(&snapshot));
}
