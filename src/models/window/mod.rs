// Time window model
// Half-open [start, end) interval of UTC instants

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window starting at `start` and lasting `minutes`.
    ///
    /// The end saturates at the representable range, so an absurd duration
    /// from the backend gives an open-ended window instead of a panic.
    pub fn from_minutes(start: DateTime<Utc>, minutes: i64) -> Self {
        let end = Duration::try_minutes(minutes)
            .and_then(|length| start.checked_add_signed(length))
            .unwrap_or(if minutes < 0 {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            });
        Self { start, end }
    }

    /// Adjacent windows (one ends where the other starts) do not overlap.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, other: &TimeWindow) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Consecutive slices of `minutes`, the last one possibly shorter.
    ///
    /// A non-positive `minutes` yields the whole window as a single slice.
    pub fn slices(&self, minutes: i64) -> Vec<TimeWindow> {
        if self.is_empty() {
            return Vec::new();
        }
        if minutes <= 0 {
            return vec![*self];
        }

        let Some(step) = Duration::try_minutes(minutes) else {
            return vec![*self];
        };
        let mut slices = Vec::new();
        let mut cursor = self.start;
        while cursor < self.end {
            let next = cursor
                .checked_add_signed(step)
                .map_or(self.end, |next| next.min(self.end));
            slices.push(TimeWindow::new(cursor, next));
            cursor = next;
        }
        slices
    }
}
