//! Free start times for a fresh booking on one day.
//!
//! Each slot start is tried with the same hours, blocked-time and capacity
//! checks a move goes through, with nothing excluded from capacity. A batch
//! of `quantity` vehicles needs that many free lifts at once.

use chrono::{DateTime, Utc};

use crate::models::settings::MINUTES_PER_DAY;
use crate::models::snapshot::DaySnapshot;
use crate::models::window::TimeWindow;
use crate::services::day_window::day_span_from;
use crate::services::reschedule::{check_window, Rejection};
use crate::services::slot_grid::slot_windows;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AvailabilityError {
    #[error("Quantity must be between 1 and {max}, got {requested}")]
    QuantityOutOfRange { requested: u32, max: u32 },

    #[error("Duration must be positive, got {0} minutes")]
    NonPositiveDuration(i64),

    #[error(transparent)]
    Settings(Rejection),
}

/// Slot starts at which a booking of `duration_minutes` would be accepted.
pub fn available_starts(
    snapshot: &DaySnapshot,
    duration_minutes: i64,
    quantity: u32,
) -> Result<Vec<DateTime<Utc>>, AvailabilityError> {
    let settings = &snapshot.settings;
    settings
        .validate()
        .map_err(|err| AvailabilityError::Settings(Rejection::InvalidSettings(err)))?;

    if quantity == 0 || quantity > settings.max_batch_qty {
        return Err(AvailabilityError::QuantityOutOfRange {
            requested: quantity,
            max: settings.max_batch_qty,
        });
    }
    if duration_minutes <= 0 {
        return Err(AvailabilityError::NonPositiveDuration(duration_minutes));
    }

    let day_based = duration_minutes % MINUTES_PER_DAY == 0;
    let slots = slot_windows(snapshot.date, settings);

    let starts = slots
        .iter()
        .enumerate()
        .filter_map(|(index, slot)| {
            let (candidate, within_day) = if day_based {
                // Multi-day jobs can only begin at opening time.
                if index != 0 {
                    return None;
                }
                let days = duration_minutes / MINUTES_PER_DAY;
                (day_span_from(snapshot.date, days, settings)?, false)
            } else {
                (TimeWindow::from_minutes(slot.start, duration_minutes), true)
            };

            check_window(snapshot, candidate, None, quantity, within_day)
                .ok()
                .map(|_| slot.start)
        })
        .collect();

    Ok(starts)
}
