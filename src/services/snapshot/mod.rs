//! Versioned holder for the current day snapshot.
//!
//! Every fetch takes a ticket from a monotonically increasing counter. A
//! completed fetch is only installed if nothing newer has been installed, so
//! a slow stale response cannot overwrite a fresher one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::models::snapshot::DaySnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

impl FetchTicket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct SnapshotStore {
    next_generation: AtomicU64,
    current: Mutex<Option<DaySnapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a generation for a fetch about to start.
    pub fn begin_fetch(&self) -> FetchTicket {
        FetchTicket(self.next_generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Install `snapshot` unless a newer fetch already landed.
    ///
    /// Returns whether the snapshot was installed.
    pub fn apply(&self, ticket: FetchTicket, mut snapshot: DaySnapshot) -> bool {
        let mut current = self.lock();
        if let Some(existing) = current.as_ref() {
            if existing.generation > ticket.generation() {
                log::debug!(
                    "Discarding stale snapshot for {} (generation {} < {})",
                    snapshot.date,
                    ticket.generation(),
                    existing.generation
                );
                return false;
            }
        }

        snapshot.generation = ticket.generation();
        *current = Some(snapshot);
        true
    }

    pub fn current(&self) -> Option<DaySnapshot> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    fn lock(&self) -> MutexGuard<'_, Option<DaySnapshot>> {
        // A panic while holding the lock cannot leave a half-written snapshot.
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
