//! Entry id sources.

use crate::model::movie::MovieId;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Last id handed out by any [`SystemIdClock`] in this process.
static LAST_SYSTEM_ID: AtomicI64 = AtomicI64::new(0);

/// Hands out ids for newly created entries.
pub trait IdClock: Send {
    fn next_id(&self) -> MovieId;

    /// Reports an id already present in loaded data.
    ///
    /// Clocks that promise unique ids must hand out only larger ones
    /// afterwards.
    fn observe(&self, _existing: MovieId) {}
}

/// Wall-clock ids in epoch milliseconds.
///
/// Never returns the same id twice within the process, across all
/// instances: when two calls land in the same millisecond (or the wall
/// clock steps back), the id is bumped past the previous one.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemIdClock;

impl SystemIdClock {
    pub fn new() -> Self {
        Self
    }
}

impl IdClock for SystemIdClock {
    fn next_id(&self) -> MovieId {
        let now = now_epoch_ms();
        let previous = LAST_SYSTEM_ID
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(previous + 1)
    }

    fn observe(&self, existing: MovieId) {
        LAST_SYSTEM_ID.fetch_max(existing, Ordering::AcqRel);
    }
}

/// Clock returning scripted ids, for simulations and tests.
///
/// Repeats the last scripted id once the script runs out.
#[derive(Debug)]
pub struct ManualIdClock {
    script: Mutex<VecDeque<MovieId>>,
    last: AtomicI64,
}

impl ManualIdClock {
    pub fn new(ids: impl IntoIterator<Item = MovieId>) -> Self {
        Self {
            script: Mutex::new(ids.into_iter().collect()),
            last: AtomicI64::new(0),
        }
    }

    /// Clock that always returns `id`.
    pub fn frozen(id: MovieId) -> Self {
        let clock = Self::new(Vec::new());
        clock.last.store(id, Ordering::Release);
        clock
    }
}

impl IdClock for ManualIdClock {
    fn next_id(&self) -> MovieId {
        let scripted = match self.script.lock() {
            Ok(mut script) => script.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        };
        match scripted {
            Some(id) => {
                self.last.store(id, Ordering::Release);
                id
            }
            None => self.last.load(Ordering::Acquire),
        }
    }
}

pub(crate) fn now_epoch_ms() -> MovieId {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
