//! Core domain logic for the cinedesk movie catalog admin.
//! This crate is the single source of truth for catalog invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod probe;
pub mod repo;
pub mod service;

pub use config::{AdminConfig, ConfigError};
pub use logging::{default_log_level, init_logging, init_stderr_logging, logging_status, LogTarget};
pub use model::catalog::CatalogRecord;
pub use model::category::{Category, ParseCategoryError};
pub use model::movie::{MovieEntry, MovieId};
pub use probe::prober::{ImageProber, ProbeCompletion, ProbeStatus, ProbeTicket};
pub use probe::source::{DimensionSource, HttpDimensionSource};
pub use probe::{Dimensions, ProbeError, ProbeResult};
pub use repo::catalog_repo::{
    CatalogRepository, RepoError, RepoResult, SqliteCatalogRepository, DEFAULT_STORAGE_KEY,
};
pub use service::admin_session::{
    AdminSession, AutoConfirm, CategorySwitchPolicy, DeleteConfirmation, DeleteOutcome,
    ProbeOutcome, SessionError, SessionResult, SubmitOutcome,
};
pub use service::catalog_store::CatalogStore;
pub use service::clock::{IdClock, ManualIdClock, SystemIdClock};
pub use service::draft::{Draft, DraftError, DraftField, EditTarget, FieldInput};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
