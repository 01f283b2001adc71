//! Admin panel session: form, category selector and catalog store.
//!
//! # Responsibility
//! - Tie the draft, the active category and the store into the admin
//!   use-cases (submit, edit, cancel, delete, switch category).
//! - Feed image probe completions back into the draft.
//!
//! # Invariants
//! - An edit always commits into the category it was seeded from.
//! - Deletion happens only after the confirmation step accepts it.
//! - Stale probe completions never touch the draft.

use crate::model::catalog::CatalogRecord;
use crate::model::category::Category;
use crate::model::movie::{MovieEntry, MovieId};
use crate::probe::prober::{ImageProber, ProbeCompletion, ProbeStatus, ProbeTicket};
use crate::probe::Dimensions;
use crate::repo::catalog_repo::{CatalogRepository, RepoError};
use crate::service::catalog_store::CatalogStore;
use crate::service::draft::{Draft, DraftError, DraftField, FieldInput};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub type SessionResult<T> = Result<T, SessionError>;

/// Session-level error for admin use-cases.
#[derive(Debug)]
pub enum SessionError {
    Repo(RepoError),
    Draft(DraftError),
    /// The target entry is not in the category.
    EntryNotFound { category: Category, id: MovieId },
    /// Only `image` and `hoverImage` can be probed.
    NotAnImageField(DraftField),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Draft(err) => write!(f, "{err}"),
            Self::EntryNotFound { category, id } => {
                write!(f, "movie {id} not found in {category}")
            }
            Self::NotAnImageField(field) => write!(f, "field `{field}` is not an image field"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Draft(err) => Some(err),
            Self::EntryNotFound { .. } | Self::NotAnImageField(_) => None,
        }
    }
}

impl From<RepoError> for SessionError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<DraftError> for SessionError {
    fn from(value: DraftError) -> Self {
        Self::Draft(value)
    }
}

/// What happens to an in-progress edit when the active category changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategorySwitchPolicy {
    /// Drop the edit and reset the draft. A create-mode draft is kept.
    #[default]
    DiscardEdit,
    /// Keep the draft; the edit still commits to its origin category.
    KeepEdit,
}

impl CategorySwitchPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DiscardEdit => "discard",
            Self::KeepEdit => "keep",
        }
    }
}

impl FromStr for CategorySwitchPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "discard" | "discard_edit" | "discard-edit" => Ok(Self::DiscardEdit),
            "keep" | "keep_edit" | "keep-edit" => Ok(Self::KeepEdit),
            other => Err(format!(
                "unsupported category switch policy `{other}`; expected discard|keep"
            )),
        }
    }
}

/// Synchronous delete confirmation step (the "are you sure" dialog).
pub trait DeleteConfirmation {
    fn confirm_delete(&self, category: Category, entry: &MovieEntry) -> bool;
}

impl<F> DeleteConfirmation for F
where
    F: Fn(Category, &MovieEntry) -> bool,
{
    fn confirm_delete(&self, category: Category, entry: &MovieEntry) -> bool {
        self(category, entry)
    }
}

/// Fixed answer, for callers that confirmed elsewhere (`--yes`, FFI).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoConfirm(pub bool);

impl DeleteConfirmation for AutoConfirm {
    fn confirm_delete(&self, _category: Category, _entry: &MovieEntry) -> bool {
        self.0
    }
}

/// Result of a successful submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created { category: Category, id: MovieId },
    Updated { category: Category, id: MovieId },
}

impl SubmitOutcome {
    pub fn id(self) -> MovieId {
        match self {
            Self::Created { id, .. } | Self::Updated { id, .. } => id,
        }
    }
}

/// Result of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Declined,
    /// Nothing with that id in the active category; storage untouched.
    NotFound,
}

/// What a probe completion did to the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Applied {
        field: DraftField,
        dimensions: Option<Dimensions>,
    },
    /// A newer request for the same field exists.
    Stale { field: DraftField, sequence: u64 },
    Failed { field: DraftField, message: String },
    TimedOut { field: DraftField },
    /// Probe aborted before finishing, by a newer request or a form reset.
    Cancelled { field: DraftField, sequence: u64 },
}

/// Admin panel state owned by one UI layer.
pub struct AdminSession<R: CatalogRepository> {
    store: CatalogStore<R>,
    draft: Draft,
    active: Category,
    switch_policy: CategorySwitchPolicy,
    prober: Option<ImageProber>,
}

impl<R: CatalogRepository> AdminSession<R> {
    pub fn new(store: CatalogStore<R>) -> Self {
        Self {
            store,
            draft: Draft::new(),
            active: Category::default(),
            switch_policy: CategorySwitchPolicy::default(),
            prober: None,
        }
    }

    pub fn with_switch_policy(mut self, policy: CategorySwitchPolicy) -> Self {
        self.switch_policy = policy;
        self
    }

    pub fn with_prober(mut self, prober: ImageProber) -> Self {
        self.prober = Some(prober);
        self
    }

    pub fn store(&self) -> &CatalogStore<R> {
        &self.store
    }

    pub fn record(&self) -> &CatalogRecord {
        self.store.record()
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn active_category(&self) -> Category {
        self.active
    }

    /// Entries of the active category.
    pub fn entries(&self) -> &[MovieEntry] {
        self.store.entries(self.active)
    }

    /// Table heading for the active category.
    pub fn heading(&self) -> &'static str {
        self.active.heading()
    }

    /// Form heading: `Edit Movie` or `Add New Movie`.
    pub fn form_heading(&self) -> &'static str {
        if self.draft.is_editing() {
            "Edit Movie"
        } else {
            "Add New Movie"
        }
    }

    /// Switches the active category, applying the switch policy.
    pub fn select_category(&mut self, category: Category) {
        if category == self.active {
            return;
        }
        let discarded = self.switch_policy == CategorySwitchPolicy::DiscardEdit
            && self.draft.is_editing();
        if discarded {
            self.reset_form();
        }
        info!(
            "event=category_select module=session status=ok from={} to={} edit_discarded={}",
            self.active, category, discarded
        );
        self.active = category;
    }

    /// Text or checkbox update of one draft attribute by name.
    pub fn set_field(&mut self, name: &str, input: FieldInput) -> SessionResult<DraftField> {
        let field = self.draft.set_field(name, input)?;
        Ok(field)
    }

    /// Seeds the draft from an entry of the active category.
    pub fn begin_edit(&mut self, id: MovieId) -> SessionResult<()> {
        let category = self.active;
        let entry = self
            .store
            .find(category, id)
            .ok_or(SessionError::EntryNotFound { category, id })?
            .clone();
        self.cancel_probes();
        self.draft.seed_from(&entry, category);
        Ok(())
    }

    /// Leaves edit mode and clears the draft.
    pub fn cancel_edit(&mut self) {
        self.reset_form();
    }

    /// Persists the draft: append in create mode, replace in edit mode.
    ///
    /// The draft resets only after the write succeeded.
    pub fn submit(&mut self) -> SessionResult<SubmitOutcome> {
        let outcome = match self.draft.editing() {
            Some(target) => {
                let entry = self.draft.to_entry(target.id);
                if !self.store.replace(target.category, target.id, entry)? {
                    return Err(SessionError::EntryNotFound {
                        category: target.category,
                        id: target.id,
                    });
                }
                SubmitOutcome::Updated {
                    category: target.category,
                    id: target.id,
                }
            }
            None => {
                let entry = self.draft.to_entry(0);
                let id = self.store.append(self.active, entry)?;
                SubmitOutcome::Created {
                    category: self.active,
                    id,
                }
            }
        };
        self.reset_form();
        Ok(outcome)
    }

    /// Deletes an entry of the active category after confirmation.
    pub fn delete(
        &mut self,
        id: MovieId,
        confirmation: &dyn DeleteConfirmation,
    ) -> SessionResult<DeleteOutcome> {
        let category = self.active;
        let Some(entry) = self.store.find(category, id) else {
            return Ok(DeleteOutcome::NotFound);
        };
        if !confirmation.confirm_delete(category, entry) {
            info!(
                "event=catalog_remove module=session status=declined category={category} id={id}"
            );
            return Ok(DeleteOutcome::Declined);
        }

        if !self.store.remove(category, id)? {
            return Ok(DeleteOutcome::NotFound);
        }
        let was_editing = self
            .draft
            .editing()
            .is_some_and(|target| target.id == id && target.category == category);
        if was_editing {
            self.reset_form();
        }
        Ok(DeleteOutcome::Deleted)
    }

    /// Empties the whole catalog.
    pub fn reset_catalog(&mut self) -> SessionResult<()> {
        self.store.reset()?;
        self.reset_form();
        Ok(())
    }

    /// Starts a dimension probe for `image` or `hoverImage`.
    ///
    /// Without a configured prober the URL is committed directly with the
    /// fallback dimensions. Must run inside a tokio runtime otherwise.
    pub fn request_image(
        &mut self,
        name: &str,
        url: impl Into<String>,
    ) -> SessionResult<Option<ProbeTicket>> {
        let field = name.parse::<DraftField>()?;
        if !matches!(field, DraftField::Image | DraftField::HoverImage) {
            return Err(SessionError::NotAnImageField(field));
        }
        let url = url.into();
        match self.prober.as_mut() {
            Some(prober) => Ok(Some(prober.request(field, url))),
            None => {
                self.draft.set_image(
                    field,
                    url,
                    Dimensions::css_width(None),
                    Dimensions::css_height(None),
                );
                Ok(None)
            }
        }
    }

    /// Applies one probe completion if it is still current.
    ///
    /// Cancelled probes never touch the draft.
    pub fn apply_probe(&mut self, completion: ProbeCompletion) -> ProbeOutcome {
        let field = completion.ticket.field;
        let sequence = completion.ticket.sequence;
        let current = self
            .prober
            .as_mut()
            .is_some_and(|prober| prober.settle(&completion));
        if !current && completion.status != ProbeStatus::Cancelled {
            return ProbeOutcome::Stale { field, sequence };
        }

        match completion.status {
            ProbeStatus::Loaded(dimensions) => {
                self.draft.set_image(
                    field,
                    completion.ticket.url,
                    Dimensions::css_width(dimensions),
                    Dimensions::css_height(dimensions),
                );
                ProbeOutcome::Applied { field, dimensions }
            }
            ProbeStatus::Failed(message) => ProbeOutcome::Failed { field, message },
            ProbeStatus::TimedOut => ProbeOutcome::TimedOut { field },
            ProbeStatus::Cancelled => ProbeOutcome::Cancelled { field, sequence },
        }
    }

    /// Applies completions that already arrived, without waiting.
    pub fn poll_probes(&mut self) -> Vec<ProbeOutcome> {
        let mut outcomes = Vec::new();
        while let Some(completion) = self
            .prober
            .as_mut()
            .and_then(ImageProber::try_next_completion)
        {
            outcomes.push(self.apply_probe(completion));
        }
        outcomes
    }

    /// Waits until every field's newest probe has reported, applying
    /// completions as they arrive.
    pub async fn settle_probes(&mut self) -> Vec<ProbeOutcome> {
        let mut outcomes = Vec::new();
        loop {
            let Some(prober) = self.prober.as_mut() else {
                break;
            };
            if prober.pending() == 0 {
                break;
            }
            let Some(completion) = prober.next_completion().await else {
                break;
            };
            outcomes.push(self.apply_probe(completion));
        }
        outcomes.extend(self.poll_probes());
        outcomes
    }

    pub fn pending_probes(&self) -> usize {
        self.prober.as_ref().map_or(0, ImageProber::pending)
    }

    fn cancel_probes(&mut self) {
        if let Some(prober) = self.prober.as_mut() {
            prober.cancel_all();
        }
    }

    fn reset_form(&mut self) {
        self.cancel_probes();
        self.draft.reset();
    }
}
