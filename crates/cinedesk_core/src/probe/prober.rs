//! Cancellable, sequence-keyed image probes.
//!
//! # Responsibility
//! - Spawn one probe task per image-field update.
//! - Cancel the previous in-flight probe of the same field.
//! - Deliver completions in arrival order, tagged with their sequence.
//!
//! # Invariants
//! - Sequence numbers are unique per prober and strictly increasing.
//! - A completion is current only while its sequence is the newest one
//!   issued for its field.
//! - Every probe ends (loaded, failed, timed out or cancelled) and reports.

use super::source::DimensionSource;
use super::Dimensions;
use crate::service::draft::DraftField;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity of one probe request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTicket {
    pub field: DraftField,
    pub sequence: u64,
    pub url: String,
}

/// How a probe task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    /// Image loaded; `None` when it has no intrinsic size.
    Loaded(Option<Dimensions>),
    Failed(String),
    TimedOut,
    Cancelled,
}

/// Message sent by a finished probe task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeCompletion {
    pub ticket: ProbeTicket,
    pub status: ProbeStatus,
}

struct InFlight {
    sequence: u64,
    token: CancellationToken,
}

/// Runs image probes on the current tokio runtime.
pub struct ImageProber {
    source: Arc<dyn DimensionSource>,
    timeout: Duration,
    next_sequence: u64,
    latest: HashMap<DraftField, InFlight>,
    tx: mpsc::UnboundedSender<ProbeCompletion>,
    rx: mpsc::UnboundedReceiver<ProbeCompletion>,
}

impl ImageProber {
    pub fn new(source: Arc<dyn DimensionSource>, timeout: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            source,
            timeout,
            next_sequence: 0,
            latest: HashMap::new(),
            tx,
            rx,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Starts probing `url` for `field`, superseding any earlier request
    /// for the same field.
    ///
    /// Must be called from within a tokio runtime.
    pub fn request(&mut self, field: DraftField, url: impl Into<String>) -> ProbeTicket {
        self.next_sequence += 1;
        let ticket = ProbeTicket {
            field,
            sequence: self.next_sequence,
            url: url.into(),
        };

        let token = CancellationToken::new();
        if let Some(previous) = self.latest.insert(
            field,
            InFlight {
                sequence: ticket.sequence,
                token: token.clone(),
            },
        ) {
            debug!(
                "event=probe_supersede module=probe status=ok field={} seq={} superseded_seq={}",
                field, ticket.sequence, previous.sequence
            );
            previous.token.cancel();
        }

        tokio::spawn(run_probe(
            Arc::clone(&self.source),
            self.timeout,
            ticket.clone(),
            token,
            self.tx.clone(),
        ));
        ticket
    }

    /// Whether `completion` still carries the newest sequence of its field.
    pub fn is_current(&self, completion: &ProbeCompletion) -> bool {
        self.latest
            .get(&completion.ticket.field)
            .is_some_and(|in_flight| in_flight.sequence == completion.ticket.sequence)
    }

    /// Marks the field idle if `completion` is its newest probe.
    ///
    /// Returns whether the completion was current.
    pub fn settle(&mut self, completion: &ProbeCompletion) -> bool {
        if !self.is_current(completion) {
            return false;
        }
        self.latest.remove(&completion.ticket.field);
        true
    }

    /// Number of fields with a probe still awaiting its current result.
    pub fn pending(&self) -> usize {
        self.latest.len()
    }

    /// Cancels the in-flight probe for `field`, if any.
    pub fn cancel(&mut self, field: DraftField) {
        if let Some(in_flight) = self.latest.remove(&field) {
            in_flight.token.cancel();
        }
    }

    /// Cancels every in-flight probe.
    pub fn cancel_all(&mut self) {
        for (_, in_flight) in self.latest.drain() {
            in_flight.token.cancel();
        }
    }

    /// Waits for the next completion, stale or not.
    pub async fn next_completion(&mut self) -> Option<ProbeCompletion> {
        self.rx.recv().await
    }

    /// Returns an already delivered completion without waiting.
    pub fn try_next_completion(&mut self) -> Option<ProbeCompletion> {
        self.rx.try_recv().ok()
    }
}

impl Drop for ImageProber {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

async fn run_probe(
    source: Arc<dyn DimensionSource>,
    timeout: Duration,
    ticket: ProbeTicket,
    token: CancellationToken,
    tx: mpsc::UnboundedSender<ProbeCompletion>,
) {
    let started_at = Instant::now();
    let status = tokio::select! {
        _ = token.cancelled() => ProbeStatus::Cancelled,
        outcome = tokio::time::timeout(timeout, source.fetch_dimensions(&ticket.url)) => {
            match outcome {
                Ok(Ok(dimensions)) => ProbeStatus::Loaded(dimensions),
                Ok(Err(err)) => ProbeStatus::Failed(err.to_string()),
                Err(_) => ProbeStatus::TimedOut,
            }
        }
    };

    match &status {
        ProbeStatus::Loaded(_) | ProbeStatus::Cancelled => debug!(
            "event=image_probe module=probe status={} field={} seq={} duration_ms={}",
            status_label(&status),
            ticket.field,
            ticket.sequence,
            started_at.elapsed().as_millis()
        ),
        ProbeStatus::Failed(_) | ProbeStatus::TimedOut => warn!(
            "event=image_probe module=probe status={} field={} seq={} duration_ms={}",
            status_label(&status),
            ticket.field,
            ticket.sequence,
            started_at.elapsed().as_millis()
        ),
    }

    // Receiver gone means the prober was dropped; nobody is waiting.
    let _ = tx.send(ProbeCompletion { ticket, status });
}

fn status_label(status: &ProbeStatus) -> &'static str {
    match status {
        ProbeStatus::Loaded(_) => "ok",
        ProbeStatus::Failed(_) => "error",
        ProbeStatus::TimedOut => "timeout",
        ProbeStatus::Cancelled => "cancelled",
    }
}
