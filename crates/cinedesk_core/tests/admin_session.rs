use cinedesk_core::db::open_db_in_memory;
use cinedesk_core::{
    AdminSession, AutoConfirm, CatalogStore, Category, CategorySwitchPolicy, DeleteOutcome,
    FieldInput, ManualIdClock, MovieEntry, SessionError, SqliteCatalogRepository, SubmitOutcome,
};
use rusqlite::Connection;
use std::cell::RefCell;

fn session_with_ids(conn: &Connection, ids: Vec<i64>) -> AdminSession<SqliteCatalogRepository<'_>> {
    let store = CatalogStore::open_with_clock(
        SqliteCatalogRepository::new(conn),
        Box::new(ManualIdClock::new(ids)),
    )
    .unwrap();
    AdminSession::new(store)
}

fn revision(session: &AdminSession<SqliteCatalogRepository<'_>>) -> u64 {
    session.store().repository().revision().unwrap()
}

fn fill(session: &mut AdminSession<SqliteCatalogRepository<'_>>, pairs: &[(&str, &str)]) {
    for (name, value) in pairs {
        session.set_field(name, FieldInput::text(*value)).unwrap();
    }
}

#[test]
fn create_submit_applies_defaults_and_resets_the_form() {
    let conn = open_db_in_memory().unwrap();
    let mut session = session_with_ids(&conn, vec![1700000000000]);
    fill(&mut session, &[("title", "Inception"), ("genre", "Sci-Fi")]);
    session
        .set_field("top10", FieldInput::Checkbox(true))
        .unwrap();

    let outcome = session.submit().unwrap();

    assert_eq!(
        outcome,
        SubmitOutcome::Created {
            category: Category::TopRating,
            id: 1700000000000
        }
    );
    let stored = &session.entries()[0];
    assert_eq!(stored.title, "Inception");
    assert!(stored.top10);
    assert_eq!(stored.image, "default_image_url");
    assert_eq!(stored.hover_image, "default_hover_image_url");
    assert_eq!(stored.card_class_name, "max-w-[180px] sm:max-w-[280px]");
    assert_eq!(session.draft().values(), &MovieEntry::default());
    assert_eq!(session.form_heading(), "Add New Movie");
}

#[test]
fn empty_dimensions_fall_back_on_submit() {
    let conn = open_db_in_memory().unwrap();
    let mut session = session_with_ids(&conn, vec![5]);
    fill(
        &mut session,
        &[("title", "Blank"), ("imageWidth", ""), ("imageHeight", "")],
    );

    session.submit().unwrap();

    let stored = &session.entries()[0];
    assert_eq!(stored.image_width, "250px");
    assert_eq!(stored.image_height, "400px");
}

#[test]
fn trending_add_leaves_other_categories_empty() {
    let conn = open_db_in_memory().unwrap();
    let mut session = session_with_ids(&conn, vec![7]);

    session.select_category(Category::Trending);
    fill(
        &mut session,
        &[("title", "A"), ("genre", "Drama"), ("ageRating", "PG")],
    );
    session.submit().unwrap();

    let record = session.record();
    let trending = record.entries(Category::Trending);
    assert_eq!(trending.len(), 1);
    assert_eq!(trending[0].title, "A");
    assert_eq!(trending[0].genre, "Drama");
    assert_eq!(trending[0].age_rating, "PG");
    assert!(record.entries(Category::TopRating).is_empty());
    assert!(record.entries(Category::NewRelease).is_empty());

    let reopened = CatalogStore::open(SqliteCatalogRepository::new(&conn)).unwrap();
    assert_eq!(reopened.record(), record);
}

#[test]
fn trending_scenario_creates_edits_and_deletes() {
    let conn = open_db_in_memory().unwrap();
    let mut session = session_with_ids(&conn, vec![100]);

    session.select_category(Category::Trending);
    assert_eq!(session.heading(), "Trending Movies");
    fill(&mut session, &[("title", "Dune"), ("ageRating", "13+")]);
    let id = session.submit().unwrap().id();

    session.begin_edit(id).unwrap();
    assert_eq!(session.form_heading(), "Edit Movie");
    assert_eq!(session.draft().values().title, "Dune");
    fill(&mut session, &[("title", "Dune: Part Two")]);
    let outcome = session.submit().unwrap();
    assert_eq!(
        outcome,
        SubmitOutcome::Updated {
            category: Category::Trending,
            id
        }
    );
    assert_eq!(session.entries().len(), 1);
    assert_eq!(session.entries()[0].title, "Dune: Part Two");
    assert_eq!(session.entries()[0].age_rating, "13+");

    assert_eq!(
        session.delete(id, &AutoConfirm(true)).unwrap(),
        DeleteOutcome::Deleted
    );
    assert!(session.entries().is_empty());
    assert!(session.record().entries(Category::TopRating).is_empty());
}

#[test]
fn declined_delete_leaves_storage_unwritten() {
    let conn = open_db_in_memory().unwrap();
    let mut session = session_with_ids(&conn, vec![9]);
    fill(&mut session, &[("title", "Memento")]);
    session.submit().unwrap();
    let before = revision(&session);

    let asked = RefCell::new(Vec::new());
    let decline = |category: Category, entry: &MovieEntry| {
        asked.borrow_mut().push((category, entry.title.clone()));
        false
    };
    assert_eq!(session.delete(9, &decline).unwrap(), DeleteOutcome::Declined);

    assert_eq!(
        asked.into_inner(),
        vec![(Category::TopRating, "Memento".to_string())]
    );
    assert_eq!(revision(&session), before);
    assert_eq!(session.entries().len(), 1);
}

#[test]
fn delete_of_unknown_id_skips_confirmation() {
    let conn = open_db_in_memory().unwrap();
    let mut session = session_with_ids(&conn, vec![]);
    let never = |_: Category, _: &MovieEntry| -> bool { panic!("must not ask") };

    assert_eq!(session.delete(404, &never).unwrap(), DeleteOutcome::NotFound);
    assert_eq!(revision(&session), 0);
}

#[test]
fn deleting_the_edited_entry_resets_the_form() {
    let conn = open_db_in_memory().unwrap();
    let mut session = session_with_ids(&conn, vec![1, 2]);
    fill(&mut session, &[("title", "one")]);
    session.submit().unwrap();
    fill(&mut session, &[("title", "two")]);
    session.submit().unwrap();

    session.begin_edit(2).unwrap();
    session.delete(1, &AutoConfirm(true)).unwrap();
    assert!(session.draft().is_editing(), "other deletes keep the edit");

    session.delete(2, &AutoConfirm(true)).unwrap();
    assert!(!session.draft().is_editing());
}

#[test]
fn cancel_edit_restores_blank_create_mode() {
    let conn = open_db_in_memory().unwrap();
    let mut session = session_with_ids(&conn, vec![3]);
    fill(&mut session, &[("title", "Tenet")]);
    session.submit().unwrap();

    session.begin_edit(3).unwrap();
    fill(&mut session, &[("title", "changed")]);
    session.cancel_edit();

    assert!(!session.draft().is_editing());
    assert_eq!(session.draft().values(), &MovieEntry::default());
    assert_eq!(session.entries()[0].title, "Tenet");
}

#[test]
fn begin_edit_requires_the_entry_in_the_active_category() {
    let conn = open_db_in_memory().unwrap();
    let mut session = session_with_ids(&conn, vec![8]);
    fill(&mut session, &[("title", "Rush")]);
    session.submit().unwrap();

    session.select_category(Category::NewRelease);
    let err = session.begin_edit(8).unwrap_err();
    assert!(matches!(
        err,
        SessionError::EntryNotFound {
            category: Category::NewRelease,
            id: 8
        }
    ));
}

#[test]
fn discard_policy_drops_the_edit_on_category_switch() {
    let conn = open_db_in_memory().unwrap();
    let mut session = session_with_ids(&conn, vec![1, 2]);
    fill(&mut session, &[("title", "Top pick")]);
    session.submit().unwrap();

    session.begin_edit(1).unwrap();
    session.select_category(Category::Trending);
    assert!(!session.draft().is_editing());

    fill(&mut session, &[("title", "Fresh")]);
    let outcome = session.submit().unwrap();
    assert_eq!(
        outcome,
        SubmitOutcome::Created {
            category: Category::Trending,
            id: 2
        }
    );
    assert_eq!(session.record().entries(Category::TopRating)[0].title, "Top pick");
}

#[test]
fn keep_policy_commits_the_edit_to_its_origin_category() {
    let conn = open_db_in_memory().unwrap();
    let store = CatalogStore::open_with_clock(
        SqliteCatalogRepository::new(&conn),
        Box::new(ManualIdClock::new([1])),
    )
    .unwrap();
    let mut session = AdminSession::new(store).with_switch_policy(CategorySwitchPolicy::KeepEdit);
    fill(&mut session, &[("title", "Origin")]);
    session.submit().unwrap();

    session.begin_edit(1).unwrap();
    session.select_category(Category::NewRelease);
    assert!(session.draft().is_editing());
    fill(&mut session, &[("title", "Origin (edited)")]);
    let outcome = session.submit().unwrap();

    assert_eq!(
        outcome,
        SubmitOutcome::Updated {
            category: Category::TopRating,
            id: 1
        }
    );
    assert!(session.entries().is_empty());
    assert_eq!(
        session.record().entries(Category::TopRating)[0].title,
        "Origin (edited)"
    );
}

#[test]
fn create_mode_draft_survives_category_switch() {
    let conn = open_db_in_memory().unwrap();
    let mut session = session_with_ids(&conn, vec![]);
    fill(&mut session, &[("title", "half typed")]);

    session.select_category(Category::NewRelease);

    assert_eq!(session.draft().values().title, "half typed");
}

#[test]
fn request_image_without_prober_commits_fallback_dimensions() {
    let conn = open_db_in_memory().unwrap();
    let mut session = session_with_ids(&conn, vec![]);

    let ticket = session
        .request_image("hoverImage", "https://img.example/poster.jpg")
        .unwrap();

    assert!(ticket.is_none());
    let values = session.draft().values();
    assert_eq!(values.hover_image, "https://img.example/poster.jpg");
    assert_eq!(values.image_width, "250px");
    assert_eq!(values.image_height, "400px");

    let err = session.request_image("title", "x").unwrap_err();
    assert!(matches!(err, SessionError::NotAnImageField(_)));
}

#[test]
fn reset_catalog_empties_every_category() {
    let conn = open_db_in_memory().unwrap();
    let mut session = session_with_ids(&conn, vec![1, 2]);
    fill(&mut session, &[("title", "a")]);
    session.submit().unwrap();
    session.select_category(Category::Trending);
    fill(&mut session, &[("title", "b")]);
    session.submit().unwrap();

    session.reset_catalog().unwrap();

    assert!(session.record().is_empty());
}
