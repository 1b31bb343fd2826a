//! Window resolution for multi-day ("workdays") reservations.
//!
//! A day-based job is not `N * 1440` contiguous minutes; it runs from open
//! time on its base date to close time `N` days later. Blocked-day skipping is
//! decided by the backend and is not modelled here.

use chrono::{Days, NaiveDate};

use crate::models::reservation::Reservation;
use crate::models::settings::OperatingSettings;
use crate::models::window::TimeWindow;
use crate::utils::date::{at_local, local_date};

/// Window of a day-based reservation, or `None` when it is not day-based.
pub fn resolve_day_based_window(
    reservation: &Reservation,
    settings: &OperatingSettings,
) -> Option<TimeWindow> {
    let days = reservation.day_count()?;
    let base = local_date(reservation.scheduled_at, settings.timezone);
    let window = day_span_from(base, days, settings);
    if window.is_none() {
        log::warn!(
            "Reservation {} spans {} days, past the end of the calendar",
            reservation.id,
            days
        );
    }
    window
}

/// `[base@open, (base + days)@close)` in the shop timezone.
///
/// `None` when the last day falls outside the calendar's range.
pub fn day_span_from(
    base: NaiveDate,
    days: i64,
    settings: &OperatingSettings,
) -> Option<TimeWindow> {
    let last = base.checked_add_days(Days::new(u64::try_from(days).ok()?))?;
    Some(TimeWindow::new(
        at_local(base, settings.open_time, settings.timezone),
        at_local(last, settings.close_time, settings.timezone),
    ))
}

/// The window used for every overlap computation.
///
/// A day-based row whose span cannot be represented falls back to its
/// literal window, which saturates.
pub fn effective_window(reservation: &Reservation, settings: &OperatingSettings) -> TimeWindow {
    resolve_day_based_window(reservation, settings)
        .unwrap_or_else(|| reservation.literal_window())
}
