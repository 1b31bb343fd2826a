//! Admin schedule orchestration.
//!
//! `ScheduleService` borrows an explicitly constructed remote client and keeps
//! the current day snapshot. Nothing is written back locally: every mutation
//! is followed by a fresh fetch of the day being shown.

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::blocked::{BlockedInterval, NewBlockedInterval};
use crate::models::reservation::ReservationStatus;
use crate::models::slot::SlotRow;
use crate::models::snapshot::DaySnapshot;
use crate::models::work::Work;
use crate::services::availability::{available_starts, AvailabilityError};
use crate::services::calendar::{aggregate_month, AggregateError, DayEntries, MonthAggregate};
use crate::services::remote::{RemoteError, ScheduleRemote};
use crate::services::reschedule::{MoveAttempt, MoveProposal, RescheduleValidator};
use crate::services::slot_grid::build_slot_grid;
use crate::services::snapshot::SnapshotStore;
use crate::services::works::group_works;
use crate::utils::date::local_date;

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error(transparent)]
    Availability(#[from] AvailabilityError),

    #[error("No schedule is loaded")]
    NotLoaded,

    #[error("Invalid blocked time: {0}")]
    InvalidBlocked(String),
}

pub struct ScheduleService<'a, R: ScheduleRemote + ?Sized> {
    remote: &'a R,
    snapshots: SnapshotStore,
}

impl<'a, R: ScheduleRemote + ?Sized> ScheduleService<'a, R> {
    pub fn new(remote: &'a R) -> Self {
        Self {
            remote,
            snapshots: SnapshotStore::new(),
        }
    }

    /// Fetch settings, reservations and blocked time for `date` together.
    pub async fn fetch_day(&self, date: NaiveDate) -> Result<DaySnapshot, RemoteError> {
        let (settings, reservations, blocked) = tokio::try_join!(
            self.remote.fetch_settings(),
            self.remote.list_reservations_by_date(date),
            self.remote.list_blocked_by_date(date),
        )?;

        if let Err(err) = settings.validate() {
            log::warn!("Operating settings are misconfigured: {}", err);
        }

        Ok(DaySnapshot::new(date, settings, reservations, blocked))
    }

    /// Load `date` as the current day.
    ///
    /// Returns `None` when a newer load finished first and this one was dropped.
    pub async fn load_day(&self, date: NaiveDate) -> Result<Option<DaySnapshot>, ScheduleError> {
        let ticket = self.snapshots.begin_fetch();
        let snapshot = self.fetch_day(date).await?;

        if self.snapshots.apply(ticket, snapshot) {
            Ok(self.snapshots.current())
        } else {
            Ok(None)
        }
    }

    pub fn current(&self) -> Option<DaySnapshot> {
        self.snapshots.current()
    }

    pub fn day_grid(&self) -> Result<Vec<SlotRow>, ScheduleError> {
        let snapshot = self.current().ok_or(ScheduleError::NotLoaded)?;
        Ok(build_slot_grid(
            snapshot.date,
            &snapshot.settings,
            &snapshot.blocked,
            &snapshot.reservations,
        ))
    }

    /// Validate a move against the candidate day and commit it if accepted.
    ///
    /// Rejections and remote failures are reported in the returned attempt;
    /// only a failed read of the candidate day is an `Err`.
    pub async fn propose_move(&self, proposal: MoveProposal) -> Result<MoveAttempt, ScheduleError> {
        let snapshot = self.snapshot_for_instant(proposal.to).await?;
        let attempt = RescheduleValidator::new(&snapshot)
            .validate_and_reschedule(self.remote, &proposal)
            .await;

        if attempt.is_committed() {
            self.refresh_after("reschedule").await;
        }

        Ok(attempt)
    }

    async fn snapshot_for_instant(&self, instant: DateTime<Utc>) -> Result<DaySnapshot, ScheduleError> {
        if let Some(current) = self.current() {
            if local_date(instant, current.settings.timezone) == current.date {
                return Ok(current);
            }
        }

        // Cross-day move: read the target day without replacing the shown one.
        let date = self.shop_date(instant).await?;
        Ok(self.fetch_day(date).await?)
    }

    /// Civil date of `instant` in the shop timezone.
    ///
    /// Uses the loaded snapshot's settings when there is one.
    pub async fn shop_date(&self, instant: DateTime<Utc>) -> Result<NaiveDate, ScheduleError> {
        let timezone = match self.current() {
            Some(snapshot) => snapshot.settings.timezone,
            None => self.remote.fetch_settings().await?.timezone,
        };
        Ok(local_date(instant, timezone))
    }

    /// Re-fetch the shown day. A failure leaves the previous snapshot in place.
    async fn refresh_after(&self, action: &str) {
        let Some(date) = self.current().map(|snapshot| snapshot.date) else {
            return;
        };

        if let Err(err) = self.load_day(date).await {
            log::warn!("Refresh after {} failed for {}: {}", action, date, err);
        }
    }

    pub async fn set_status(
        &self,
        reservation_id: i64,
        status: ReservationStatus,
    ) -> Result<(), ScheduleError> {
        self.remote.set_status(reservation_id, status).await?;
        log::info!("Reservation {} set to {}", reservation_id, status);
        self.refresh_after("set_status").await;
        Ok(())
    }

    pub async fn assign(&self, reservation_id: i64, admin_id: &str) -> Result<(), ScheduleError> {
        self.remote.assign(reservation_id, admin_id).await?;
        self.refresh_after("assign").await;
        Ok(())
    }

    pub async fn unassign(&self, reservation_id: i64) -> Result<(), ScheduleError> {
        self.remote.unassign(reservation_id).await?;
        self.refresh_after("unassign").await;
        Ok(())
    }

    pub async fn mark_completed(&self, reservation_id: i64) -> Result<(), ScheduleError> {
        self.remote.mark_completed(reservation_id).await?;
        log::info!("Reservation {} marked completed", reservation_id);
        self.refresh_after("mark_completed").await;
        Ok(())
    }

    pub async fn delete_reservation(&self, reservation_id: i64) -> Result<(), ScheduleError> {
        self.remote.delete_reservation(reservation_id).await?;
        log::info!("Reservation {} deleted", reservation_id);
        self.refresh_after("delete_reservation").await;
        Ok(())
    }

    pub async fn create_blocked(
        &self,
        blocked: NewBlockedInterval,
    ) -> Result<BlockedInterval, ScheduleError> {
        blocked.validate().map_err(ScheduleError::InvalidBlocked)?;
        let created = self.remote.create_blocked(blocked).await?;
        self.refresh_after("create_blocked").await;
        Ok(created)
    }

    pub async fn delete_blocked(&self, blocked_id: i64) -> Result<(), ScheduleError> {
        self.remote.delete_blocked(blocked_id).await?;
        self.refresh_after("delete_blocked").await;
        Ok(())
    }

    pub async fn month(&self, year: i32, month: u32) -> Result<MonthAggregate, ScheduleError> {
        let remote = self.remote;
        let aggregate = aggregate_month(year, month, move |date| async move {
            tokio::try_join!(
                remote.list_reservations_by_date(date),
                remote.list_blocked_by_date(date),
            )
            .map(|(reservations, blocked)| DayEntries {
                reservations,
                blocked,
            })
        })
        .await?;
        Ok(aggregate)
    }

    /// Works with any chunk scheduled in `[from, to]`.
    pub async fn works(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Work>, ScheduleError> {
        let (settings, reservations) = tokio::try_join!(
            self.remote.fetch_settings(),
            self.remote.list_reservations_by_range(from, to),
        )?;
        Ok(group_works(&reservations, &settings))
    }

    pub fn available_starts(
        &self,
        duration_minutes: i64,
        quantity: u32,
    ) -> Result<Vec<DateTime<Utc>>, ScheduleError> {
        let snapshot = self.current().ok_or(ScheduleError::NotLoaded)?;
        Ok(available_starts(&snapshot, duration_minutes, quantity)?)
    }
}
