// Work module
// Owner-facing grouping of day-chunk reservations into one logical job

use chrono::{DateTime, Utc};

use crate::models::reservation::Reservation;

/// How the members of a work were matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkGrouping {
    /// Members share a root reservation id.
    RootId,
    /// A lone reservation with no related chunks.
    Single,
    /// Matched by the legacy field-similarity heuristic; approximate.
    Heuristic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Work {
    pub root_id: i64,
    pub reservations: Vec<Reservation>,
    pub first_start: DateTime<Utc>,
    pub last_start: DateTime<Utc>,
    pub grouping: WorkGrouping,
}

impl Work {
    /// Build a work from its members; `None` when `reservations` is empty.
    pub fn from_members(
        root_id: i64,
        mut reservations: Vec<Reservation>,
        grouping: WorkGrouping,
    ) -> Option<Self> {
        reservations.sort_by_key(|reservation| (reservation.scheduled_at, reservation.id));
        let first_start = reservations.first()?.scheduled_at;
        let last_start = reservations.last()?.scheduled_at;

        Some(Self {
            root_id,
            reservations,
            first_start,
            last_start,
            grouping,
        })
    }

    pub fn chunk_count(&self) -> usize {
        self.reservations.len()
    }

    pub fn is_approximate(&self) -> bool {
        self.grouping == WorkGrouping::Heuristic
    }
}
