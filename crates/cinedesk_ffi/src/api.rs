//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose catalog admin use-cases to Dart via FRB.
//! - Translate core errors into flat response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Each call opens its own connection; no catalog state lives between
//!   calls.
//! - Delete confirmation happens on the Dart side before `admin_delete`.

use cinedesk_core::db::open_db;
use cinedesk_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AdminConfig, CatalogStore, Category, Dimensions, DraftField, HttpDimensionSource,
    ImageProber, MovieEntry, MovieId, ProbeStatus, SqliteCatalogRepository,
};
use log::warn;
use std::sync::{Arc, OnceLock};

static ADMIN_CONFIG: OnceLock<Result<AdminConfig, String>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One stored movie as shown in the admin table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminMovieItem {
    pub id: i64,
    pub title: String,
    pub image: String,
    pub hover_image: String,
    pub alt: String,
    pub age_rating: String,
    pub duration: String,
    pub genre: String,
    pub new_episode: bool,
    pub top10: bool,
    pub image_width: String,
    pub image_height: String,
    pub bg_color: String,
    pub text_color: String,
    pub title_size: String,
    pub card_class_name: String,
}

/// Form values submitted from Dart. Ids and the card class are assigned
/// by core.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminMovieInput {
    pub title: String,
    pub image: String,
    pub hover_image: String,
    pub alt: String,
    pub age_rating: String,
    pub duration: String,
    pub genre: String,
    pub new_episode: bool,
    pub top10: bool,
    pub image_width: String,
    pub image_height: String,
    pub bg_color: String,
    pub text_color: String,
    pub title_size: String,
}

/// Category listing envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminListResponse {
    pub ok: bool,
    /// Table heading, e.g. `Trending Movies`; empty on failure.
    pub heading: String,
    pub items: Vec<AdminMovieItem>,
    pub message: String,
}

/// Generic action response envelope for catalog mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Id of the created or updated movie.
    pub movie_id: Option<i64>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl AdminActionResponse {
    fn success(message: impl Into<String>, movie_id: Option<MovieId>) -> Self {
        Self {
            ok: true,
            movie_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            movie_id: None,
            message: message.into(),
        }
    }
}

/// Image probe envelope. On failure the form keeps its previous values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminProbeResponse {
    pub ok: bool,
    pub url: String,
    /// CSS width, fallback `250px` when the image has no intrinsic size.
    pub image_width: String,
    pub image_height: String,
    pub message: String,
}

/// Lists one category (`topRating|trending|newRelease`).
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn admin_list(category: String) -> AdminListResponse {
    match resolve_config() {
        Ok(config) => list_with(&config, &category),
        Err(err) => AdminListResponse {
            ok: false,
            heading: String::new(),
            items: Vec::new(),
            message: err,
        },
    }
}

/// Creates (`id=None`) or updates (`id=Some`) a movie in `category`.
///
/// Empty image URLs and dimensions get their submit defaults.
#[flutter_rust_bridge::frb(sync)]
pub fn admin_save(category: String, id: Option<i64>, input: AdminMovieInput) -> AdminActionResponse {
    match resolve_config() {
        Ok(config) => save_with(&config, &category, id, input),
        Err(err) => AdminActionResponse::failure(err),
    }
}

/// Deletes a movie the user already confirmed.
#[flutter_rust_bridge::frb(sync)]
pub fn admin_delete(category: String, id: i64) -> AdminActionResponse {
    match resolve_config() {
        Ok(config) => delete_with(&config, &category, id),
        Err(err) => AdminActionResponse::failure(err),
    }
}

/// Empties all three categories.
#[flutter_rust_bridge::frb(sync)]
pub fn admin_reset() -> AdminActionResponse {
    match resolve_config() {
        Ok(config) => reset_with(&config),
        Err(err) => AdminActionResponse::failure(err),
    }
}

/// Resolves the natural size of an image URL.
///
/// # FFI contract
/// - Worker-thread call; blocks for at most the configured probe timeout.
/// - Never panics.
pub fn admin_probe_image(url: String) -> AdminProbeResponse {
    match resolve_config() {
        Ok(config) => probe_with(&config, url),
        Err(err) => AdminProbeResponse {
            ok: false,
            url,
            image_width: String::new(),
            image_height: String::new(),
            message: err,
        },
    }
}

fn resolve_config() -> Result<AdminConfig, String> {
    ADMIN_CONFIG
        .get_or_init(|| AdminConfig::from_env().map_err(|err| err.to_string()))
        .clone()
}

fn parse_category(raw: &str) -> Result<Category, String> {
    raw.parse::<Category>().map_err(|err| err.to_string())
}

fn with_catalog_store<T>(
    config: &AdminConfig,
    f: impl FnOnce(&mut CatalogStore<SqliteCatalogRepository<'_>>) -> Result<T, String>,
) -> Result<T, String> {
    let conn = open_db(&config.db_path).map_err(|err| format!("catalog DB open failed: {err}"))?;
    let repo = SqliteCatalogRepository::with_key(&conn, config.storage_key.as_str());
    let mut store =
        CatalogStore::open(repo).map_err(|err| format!("catalog load failed: {err}"))?;
    f(&mut store)
}

fn list_with(config: &AdminConfig, category: &str) -> AdminListResponse {
    let result = parse_category(category).and_then(|category| {
        with_catalog_store(config, |store| {
            let items = store
                .entries(category)
                .iter()
                .map(to_movie_item)
                .collect::<Vec<_>>();
            Ok((category, items))
        })
    });

    match result {
        Ok((category, items)) => AdminListResponse {
            ok: true,
            heading: category.heading().to_string(),
            message: format!("{} movie(s).", items.len()),
            items,
        },
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error op=admin_list");
            AdminListResponse {
                ok: false,
                heading: String::new(),
                items: Vec::new(),
                message: format!("admin_list failed: {err}"),
            }
        }
    }
}

fn save_with(
    config: &AdminConfig,
    category: &str,
    id: Option<i64>,
    input: AdminMovieInput,
) -> AdminActionResponse {
    let draft = from_movie_input(input);
    let result = parse_category(category).and_then(|category| {
        with_catalog_store(config, |store| match id {
            Some(id) => {
                let replaced = store
                    .replace(category, id, draft.finalized(id))
                    .map_err(|err| err.to_string())?;
                if !replaced {
                    return Err(format!("movie {id} not found in {category}"));
                }
                Ok(("Movie updated.", id))
            }
            None => store
                .append(category, draft.finalized(0))
                .map(|id| ("Movie created.", id))
                .map_err(|err| err.to_string()),
        })
    });

    match result {
        Ok((message, id)) => AdminActionResponse::success(message, Some(id)),
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error op=admin_save");
            AdminActionResponse::failure(format!("admin_save failed: {err}"))
        }
    }
}

fn delete_with(config: &AdminConfig, category: &str, id: i64) -> AdminActionResponse {
    let result = parse_category(category).and_then(|category| {
        with_catalog_store(config, |store| {
            store.remove(category, id).map_err(|err| err.to_string())
        })
    });

    match result {
        Ok(true) => AdminActionResponse::success("Movie deleted.", Some(id)),
        Ok(false) => AdminActionResponse::success("Nothing to delete.", None),
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error op=admin_delete");
            AdminActionResponse::failure(format!("admin_delete failed: {err}"))
        }
    }
}

fn reset_with(config: &AdminConfig) -> AdminActionResponse {
    match with_catalog_store(config, |store| store.reset().map_err(|err| err.to_string())) {
        Ok(()) => AdminActionResponse::success("Catalog reset.", None),
        Err(err) => AdminActionResponse::failure(format!("admin_reset failed: {err}")),
    }
}

fn probe_with(config: &AdminConfig, url: String) -> AdminProbeResponse {
    let failure = |url: String, message: String| AdminProbeResponse {
        ok: false,
        url,
        image_width: String::new(),
        image_height: String::new(),
        message,
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => return failure(url, format!("admin_probe_image failed: {err}")),
    };
    let source = match HttpDimensionSource::new(config.probe_max_bytes) {
        Ok(source) => source,
        Err(err) => return failure(url, format!("admin_probe_image failed: {err}")),
    };

    let timeout = config.probe_timeout;
    let completion = runtime.block_on(async move {
        let mut prober = ImageProber::new(Arc::new(source), timeout);
        prober.request(DraftField::Image, url);
        prober.next_completion().await
    });
    let Some(completion) = completion else {
        return failure(String::new(), "admin_probe_image failed: probe vanished".to_string());
    };

    let url = completion.ticket.url;
    match completion.status {
        ProbeStatus::Loaded(dimensions) => AdminProbeResponse {
            ok: true,
            url,
            image_width: Dimensions::css_width(dimensions),
            image_height: Dimensions::css_height(dimensions),
            message: match dimensions {
                Some(d) => format!("{}x{}", d.width, d.height),
                None => "Image has no intrinsic size.".to_string(),
            },
        },
        ProbeStatus::Failed(message) => failure(url, format!("admin_probe_image failed: {message}")),
        ProbeStatus::TimedOut => failure(url, "admin_probe_image timed out".to_string()),
        ProbeStatus::Cancelled => failure(url, "admin_probe_image cancelled".to_string()),
    }
}

fn from_movie_input(input: AdminMovieInput) -> MovieEntry {
    MovieEntry {
        id: 0,
        title: input.title,
        image: input.image,
        hover_image: input.hover_image,
        alt: input.alt,
        age_rating: input.age_rating,
        duration: input.duration,
        genre: input.genre,
        new_episode: input.new_episode,
        top10: input.top10,
        image_width: input.image_width,
        image_height: input.image_height,
        bg_color: input.bg_color,
        text_color: input.text_color,
        title_size: input.title_size,
        card_class_name: String::new(),
    }
}

fn to_movie_item(entry: &MovieEntry) -> AdminMovieItem {
    AdminMovieItem {
        id: entry.id,
        title: entry.title.clone(),
        image: entry.image.clone(),
        hover_image: entry.hover_image.clone(),
        alt: entry.alt.clone(),
        age_rating: entry.age_rating.clone(),
        duration: entry.duration.clone(),
        genre: entry.genre.clone(),
        new_episode: entry.new_episode,
        top10: entry.top10,
        image_width: entry.image_width.clone(),
        image_height: entry.image_height.clone(),
        bg_color: entry.bg_color.clone(),
        text_color: entry.text_color.clone(),
        title_size: entry.title_size.clone(),
        card_class_name: entry.card_class_name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, delete_with, init_logging, list_with, ping, probe_with, reset_with,
        save_with, AdminMovieInput,
    };
    use cinedesk_core::AdminConfig;

    fn temp_config(dir: &tempfile::TempDir) -> AdminConfig {
        AdminConfig {
            db_path: dir.path().join("ffi.sqlite3"),
            ..AdminConfig::default()
        }
    }

    fn input(title: &str) -> AdminMovieInput {
        AdminMovieInput {
            title: title.to_string(),
            ..AdminMovieInput::default()
        }
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn save_then_list_returns_defaulted_movie() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);

        let created = save_with(&config, "trending", None, input("Arrival"));
        assert!(created.ok, "{}", created.message);
        let id = created.movie_id.expect("create should return movie_id");

        let listed = list_with(&config, "trending");
        assert!(listed.ok, "{}", listed.message);
        assert_eq!(listed.heading, "Trending Movies");
        assert_eq!(listed.items.len(), 1);
        assert_eq!(listed.items[0].id, id);
        assert_eq!(listed.items[0].image, "default_image_url");
        assert_eq!(listed.items[0].image_width, "250px");
        assert!(list_with(&config, "topRating").items.is_empty());
    }

    #[test]
    fn update_keeps_id_and_unknown_id_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);
        let id = save_with(&config, "newRelease", None, input("Draft title"))
            .movie_id
            .expect("create should return movie_id");

        let updated = save_with(&config, "newRelease", Some(id), input("Final title"));
        assert!(updated.ok, "{}", updated.message);
        assert_eq!(updated.movie_id, Some(id));
        assert_eq!(list_with(&config, "newRelease").items[0].title, "Final title");

        let missing = save_with(&config, "newRelease", Some(id + 1), input("ghost"));
        assert!(!missing.ok);
        assert!(missing.message.contains("not found"));
    }

    #[test]
    fn delete_and_reset_clear_entries() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);
        let id = save_with(&config, "topRating", None, input("Heat"))
            .movie_id
            .expect("create should return movie_id");
        save_with(&config, "trending", None, input("Ran"));

        let deleted = delete_with(&config, "topRating", id);
        assert!(deleted.ok);
        assert_eq!(deleted.movie_id, Some(id));
        let again = delete_with(&config, "topRating", id);
        assert!(again.ok);
        assert_eq!(again.movie_id, None);

        assert!(reset_with(&config).ok);
        assert!(list_with(&config, "trending").items.is_empty());
    }

    #[test]
    fn unknown_category_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let response = list_with(&temp_config(&dir), "classics");
        assert!(!response.ok);
        assert!(response.message.contains("classics"));
    }

    #[test]
    fn probe_reports_css_dimensions_for_data_urls() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);

        let response = probe_with(&config, "data:image/gif;base64,R0lGODlhAgADAAAAAA==".to_string());
        assert!(response.ok, "{}", response.message);
        assert_eq!(response.image_width, "2px");
        assert_eq!(response.image_height, "3px");

        let failed = probe_with(&config, "/no/such/poster.png".to_string());
        assert!(!failed.ok);
        assert!(failed.image_width.is_empty());
    }
}
