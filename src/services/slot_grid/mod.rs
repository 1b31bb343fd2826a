//! Slot grid for one business day.
//!
//! Rows are aligned to open time and emitted while a whole slot still fits
//! before close. On a DST transition day the row count follows the real
//! length of the business day rather than its wall-clock span. Misconfigured settings produce an empty grid, which callers
//! treat as "no slots available".

use chrono::{Duration, NaiveDate};

use crate::models::blocked::BlockedInterval;
use crate::models::reservation::Reservation;
use crate::models::settings::OperatingSettings;
use crate::models::slot::SlotRow;
use crate::models::window::TimeWindow;
use crate::services::day_window::effective_window;
use crate::utils::date::at_local;

/// Empty slot windows covering `[open, close)` on `date`.
pub fn slot_windows(date: NaiveDate, settings: &OperatingSettings) -> Vec<TimeWindow> {
    if settings.close_time <= settings.open_time || settings.slot_minutes <= 0 {
        log::warn!(
            "No slots for {}: open {} / close {} / slot {} min",
            date,
            settings.open_time,
            settings.close_time,
            settings.slot_minutes
        );
        return Vec::new();
    }

    let Some(step) = Duration::try_minutes(settings.slot_minutes) else {
        log::warn!("No slots for {}: slot of {} min is out of range", date, settings.slot_minutes);
        return Vec::new();
    };
    let close = at_local(date, settings.close_time, settings.timezone);
    let mut windows = Vec::with_capacity(settings.slots_per_day());
    let mut cursor = at_local(date, settings.open_time, settings.timezone);

    // Stepped on real elapsed time, so every row is exactly one slot long
    // even when the day crosses a DST transition.
    while let Some(next) = cursor.checked_add_signed(step) {
        if next > close {
            break;
        }
        windows.push(TimeWindow::new(cursor, next));
        cursor = next;
    }

    windows
}

/// Build the annotated slot grid for `date`.
pub fn build_slot_grid(
    date: NaiveDate,
    settings: &OperatingSettings,
    blocked: &[BlockedInterval],
    reservations: &[Reservation],
) -> Vec<SlotRow> {
    let placed: Vec<(TimeWindow, &Reservation)> = reservations
        .iter()
        .map(|reservation| (effective_window(reservation, settings), reservation))
        .collect();

    slot_windows(date, settings)
        .into_iter()
        .map(|window| {
            let mut row = SlotRow::new(window);
            row.blocked = blocked
                .iter()
                .find(|interval| interval.window().overlaps(&window))
                .cloned();
            row.reservations = placed
                .iter()
                .filter(|(placed_window, _)| placed_window.overlaps(&window))
                .map(|(_, reservation)| (*reservation).clone())
                .collect();
            row
        })
        .collect()
}
