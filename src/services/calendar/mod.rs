//! Month view aggregation.
//!
//! One fetch per calendar day, all in flight together. A reservation or
//! blocked interval crossing a day boundary comes back from more than one day
//! query, so the merge keeps only the first sighting of each id.

use std::collections::HashSet;
use std::future::Future;

use futures::future::try_join_all;

use crate::models::blocked::BlockedInterval;
use crate::models::reservation::Reservation;
use crate::services::remote::RemoteError;
use crate::utils::date::days_in_month;
use chrono::NaiveDate;

#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("Invalid month {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },

    #[error("Failed to load {date}: {source}")]
    Day {
        date: NaiveDate,
        #[source]
        source: RemoteError,
    },
}

/// What one day query returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayEntries {
    pub reservations: Vec<Reservation>,
    pub blocked: Vec<BlockedInterval>,
}

/// One renderable calendar entry.
#[derive(Debug, Clone, PartialEq)]
pub enum CalendarEntry<'a> {
    Blocked(&'a BlockedInterval),
    Reservation(&'a Reservation),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthAggregate {
    pub reservations: Vec<Reservation>,
    pub blocked: Vec<BlockedInterval>,
}

impl MonthAggregate {
    /// Merge day results in the given order, first sighting wins.
    pub fn merge(days: Vec<DayEntries>) -> Self {
        let mut seen_reservations: HashSet<i64> = HashSet::new();
        let mut seen_blocked: HashSet<i64> = HashSet::new();
        let mut aggregate = Self::default();

        for day in days {
            for reservation in day.reservations {
                if seen_reservations.insert(reservation.id) {
                    aggregate.reservations.push(reservation);
                }
            }
            for blocked in day.blocked {
                if seen_blocked.insert(blocked.id) {
                    aggregate.blocked.push(blocked);
                }
            }
        }

        aggregate
    }

    /// Blocked intervals first so they render behind reservations.
    pub fn entries(&self) -> Vec<CalendarEntry<'_>> {
        self.blocked
            .iter()
            .map(CalendarEntry::Blocked)
            .chain(self.reservations.iter().map(CalendarEntry::Reservation))
            .collect()
    }

    pub fn reservation(&self, id: i64) -> Option<&Reservation> {
        self.reservations.iter().find(|reservation| reservation.id == id)
    }

    pub fn blocked_interval(&self, id: i64) -> Option<&BlockedInterval> {
        self.blocked.iter().find(|blocked| blocked.id == id)
    }
}

/// Fetch every day of `year`-`month` concurrently and merge the results.
pub async fn aggregate_month<F, Fut>(
    year: i32,
    month: u32,
    fetch_day: F,
) -> Result<MonthAggregate, AggregateError>
where
    F: Fn(NaiveDate) -> Fut,
    Fut: Future<Output = Result<DayEntries, RemoteError>>,
{
    let days = days_in_month(year, month).ok_or(AggregateError::InvalidMonth { year, month })?;
    log::debug!("Aggregating {} days for {}-{:02}", days.len(), year, month);

    let fetches = days.into_iter().map(|date| {
        let fetch = fetch_day(date);
        async move {
            fetch
                .await
                .map_err(|source| AggregateError::Day { date, source })
        }
    });

    // try_join_all keeps input order, so merging is in day order.
    let results = try_join_all(fetches).await?;
    Ok(MonthAggregate::merge(results))
}
