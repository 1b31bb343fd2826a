//! Conflict-aware rescheduling.
//!
//! A move is a `MoveProposal` (reservation plus candidate start) checked
//! against the fetched `DaySnapshot` for the candidate's date. All checks are
//! local and advisory; the backend re-validates. An accepted move results in
//! exactly one `reschedule` call, a rejected one in none.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::fmt;

use crate::models::reservation::Reservation;
use crate::models::settings::{OperatingSettings, SettingsError};
use crate::models::snapshot::DaySnapshot;
use crate::models::window::TimeWindow;
use crate::services::capacity::CapacityEvaluator;
use crate::services::remote::ScheduleRemote;
use crate::utils::date::{at_local, local_date, local_time};

/// Why a placement was refused. `Display` is the message shown to the operator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejection {
    #[error("Multi-day reservations cannot be moved in the day schedule")]
    MultiDayNotMovable,

    #[error("A full-day job must start at opening time ({open})")]
    FullDayMustStartAtOpen { open: NaiveTime },

    #[error("The new time is not on the loaded day ({date})")]
    OtherDay { date: NaiveDate },

    #[error("The new time must fall within business hours ({open} - {close})")]
    OutsideBusinessHours { open: NaiveTime, close: NaiveTime },

    #[error(
        "The new time overlaps blocked time{}",
        .reason.as_deref().map(|r| format!(" ({})", r)).unwrap_or_default()
    )]
    BlockedTime { reason: Option<String> },

    #[error("All {lift_count} lift(s) are busy at that time ({max_concurrent} overlapping)")]
    CapacityExceeded { max_concurrent: usize, lift_count: u32 },

    #[error("Shop hours are misconfigured: {0}")]
    InvalidSettings(SettingsError),
}

impl Rejection {
    /// Terminal state this rejection puts a move in.
    pub fn state(&self) -> MoveState {
        match self {
            Self::BlockedTime { .. } => MoveState::RejectedBlocked,
            Self::CapacityExceeded { .. } => MoveState::RejectedCapacity,
            Self::MultiDayNotMovable
            | Self::FullDayMustStartAtOpen { .. }
            | Self::OtherDay { .. }
            | Self::OutsideBusinessHours { .. }
            | Self::InvalidSettings(_) => MoveState::RejectedBusinessHours,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveState {
    Dragging,
    Validating,
    Accepted,
    RejectedBusinessHours,
    RejectedBlocked,
    RejectedCapacity,
    Committing,
    Committed,
    Failed,
}

impl fmt::Display for MoveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Dragging => "dragging",
            Self::Validating => "validating",
            Self::Accepted => "accepted",
            Self::RejectedBusinessHours => "rejected (business hours)",
            Self::RejectedBlocked => "rejected (blocked time)",
            Self::RejectedCapacity => "rejected (capacity)",
            Self::Committing => "committing",
            Self::Committed => "committed",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Request to move `reservation` so it starts at `to`.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveProposal {
    pub reservation: Reservation,
    pub to: DateTime<Utc>,
}

impl MoveProposal {
    pub fn new(reservation: Reservation, to: DateTime<Utc>) -> Self {
        Self { reservation, to }
    }

    pub fn current_start(&self) -> DateTime<Utc> {
        self.reservation.scheduled_at
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    Committed,
    Rejected(Rejection),
    /// The remote call failed; carries its message verbatim.
    Failed(String),
}

/// Result of one propose-move command, with the states it went through.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveAttempt {
    pub reservation_id: i64,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub outcome: MoveOutcome,
    pub trail: Vec<MoveState>,
}

impl MoveAttempt {
    pub fn state(&self) -> MoveState {
        self.trail.last().copied().unwrap_or(MoveState::Dragging)
    }

    pub fn is_committed(&self) -> bool {
        self.outcome == MoveOutcome::Committed
    }

    /// Operator-facing explanation for anything other than a commit.
    pub fn message(&self) -> Option<String> {
        match &self.outcome {
            MoveOutcome::Committed => None,
            MoveOutcome::Rejected(rejection) => Some(rejection.to_string()),
            MoveOutcome::Failed(message) => Some(message.clone()),
        }
    }
}

/// Check hours, blocked time and capacity for `candidate` on `snapshot`.
///
/// Shared by moves and fresh-booking availability. `exclude_id` is the
/// reservation being moved, if any; `quantity` is how many lifts the
/// placement needs at once.
pub(crate) fn check_window(
    snapshot: &DaySnapshot,
    candidate: TimeWindow,
    exclude_id: Option<i64>,
    quantity: u32,
    require_business_hours: bool,
) -> Result<(), Rejection> {
    let settings = &snapshot.settings;

    if require_business_hours {
        let day = business_hours_on(candidate.start, settings);
        if !day.contains(&candidate) {
            return Err(Rejection::OutsideBusinessHours {
                open: settings.open_time,
                close: settings.close_time,
            });
        }
    }

    if let Some(blocked) = snapshot
        .blocked
        .iter()
        .find(|blocked| blocked.window().overlaps(&candidate))
    {
        return Err(Rejection::BlockedTime {
            reason: blocked.reason.clone(),
        });
    }

    let report = CapacityEvaluator::new(settings).evaluate_batch(
        candidate,
        &snapshot.reservations,
        exclude_id,
        quantity,
    );
    if !report.allowed {
        return Err(Rejection::CapacityExceeded {
            max_concurrent: report.max_concurrent,
            lift_count: settings.lift_count,
        });
    }

    Ok(())
}

/// `[open, close)` on the civil date of `instant`.
fn business_hours_on(instant: DateTime<Utc>, settings: &OperatingSettings) -> TimeWindow {
    let date = local_date(instant, settings.timezone);
    TimeWindow::new(
        at_local(date, settings.open_time, settings.timezone),
        at_local(date, settings.close_time, settings.timezone),
    )
}

pub struct RescheduleValidator<'a> {
    snapshot: &'a DaySnapshot,
}

impl<'a> RescheduleValidator<'a> {
    pub fn new(snapshot: &'a DaySnapshot) -> Self {
        Self { snapshot }
    }

    /// Run every local check; returns the candidate window when accepted.
    pub fn validate(
        &self,
        reservation: &Reservation,
        to: DateTime<Utc>,
    ) -> Result<TimeWindow, Rejection> {
        let settings = &self.snapshot.settings;
        settings.validate().map_err(Rejection::InvalidSettings)?;

        if reservation.is_day_based() {
            return Err(Rejection::MultiDayNotMovable);
        }

        if local_date(to, settings.timezone) != self.snapshot.date {
            return Err(Rejection::OtherDay {
                date: self.snapshot.date,
            });
        }

        let business_day = settings.business_day_minutes();
        if reservation.duration_minutes == business_day
            && local_time(to, settings.timezone) != settings.open_time
        {
            return Err(Rejection::FullDayMustStartAtOpen {
                open: settings.open_time,
            });
        }

        let candidate = TimeWindow::from_minutes(to, reservation.duration_minutes);
        check_window(self.snapshot, candidate, Some(reservation.id), 1, true)?;
        Ok(candidate)
    }

    /// Validate `proposal` and, when accepted, issue the single remote call.
    ///
    /// The caller re-fetches the day after a commit.
    pub async fn validate_and_reschedule<R>(&self, remote: &R, proposal: &MoveProposal) -> MoveAttempt
    where
        R: ScheduleRemote + ?Sized,
    {
        let reservation = &proposal.reservation;
        let mut trail = vec![MoveState::Dragging, MoveState::Validating];

        let attempt = |outcome: MoveOutcome, trail: Vec<MoveState>| MoveAttempt {
            reservation_id: reservation.id,
            from: proposal.current_start(),
            to: proposal.to,
            outcome,
            trail,
        };

        if let Err(rejection) = self.validate(reservation, proposal.to) {
            log::info!(
                "Move of reservation {} to {} rejected: {}",
                reservation.id,
                proposal.to,
                rejection
            );
            trail.push(rejection.state());
            return attempt(MoveOutcome::Rejected(rejection), trail);
        }

        trail.push(MoveState::Accepted);
        trail.push(MoveState::Committing);

        match remote.reschedule(reservation.id, proposal.to).await {
            Ok(()) => {
                log::info!("Reservation {} moved to {}", reservation.id, proposal.to);
                trail.push(MoveState::Committed);
                attempt(MoveOutcome::Committed, trail)
            }
            Err(err) => {
                log::warn!("Reschedule of reservation {} failed: {}", reservation.id, err);
                trail.push(MoveState::Failed);
                attempt(MoveOutcome::Failed(err.to_string()), trail)
            }
        }
    }
}
