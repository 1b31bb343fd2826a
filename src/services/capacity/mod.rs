//! Lift capacity evaluation.
//!
//! The candidate window is split into slot-sized slices and the number of
//! other capacity-consuming reservations overlapping each slice is counted.
//! The worst slice decides: a long candidate can touch different sets of
//! reservations at different times, and only the per-slice maximum reflects
//! real simultaneous load.

use crate::models::reservation::Reservation;
use crate::models::settings::OperatingSettings;
use crate::models::window::TimeWindow;
use crate::services::day_window::effective_window;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityReport {
    pub allowed: bool,
    pub max_concurrent: usize,
}

pub struct CapacityEvaluator<'a> {
    settings: &'a OperatingSettings,
}

impl<'a> CapacityEvaluator<'a> {
    pub fn new(settings: &'a OperatingSettings) -> Self {
        Self { settings }
    }

    /// Evaluate `candidate` against the configured lift count.
    ///
    /// `exclude_id` is the reservation being moved, if any; it never counts
    /// against itself.
    pub fn evaluate(
        &self,
        candidate: TimeWindow,
        reservations: &[Reservation],
        exclude_id: Option<i64>,
    ) -> CapacityReport {
        self.evaluate_batch(candidate, reservations, exclude_id, 1)
    }

    /// Evaluate `quantity` vehicles placed together in `candidate`.
    ///
    /// Each vehicle needs its own lift, so the batch fits only while
    /// `max_concurrent + quantity <= lift_count` in every slice.
    pub fn evaluate_batch(
        &self,
        candidate: TimeWindow,
        reservations: &[Reservation],
        exclude_id: Option<i64>,
        quantity: u32,
    ) -> CapacityReport {
        let max_concurrent = self.max_concurrent(candidate, reservations, exclude_id);
        let needed = max_concurrent.saturating_add(quantity as usize);
        CapacityReport {
            allowed: needed <= self.settings.lift_count as usize,
            max_concurrent,
        }
    }

    pub fn max_concurrent(
        &self,
        candidate: TimeWindow,
        reservations: &[Reservation],
        exclude_id: Option<i64>,
    ) -> usize {
        let others: Vec<TimeWindow> = reservations
            .iter()
            .filter(|reservation| reservation.consumes_capacity())
            .filter(|reservation| Some(reservation.id) != exclude_id)
            .map(|reservation| effective_window(reservation, self.settings))
            .collect();

        candidate
            .slices(self.settings.slot_minutes)
            .iter()
            .map(|slice| others.iter().filter(|other| other.overlaps(slice)).count())
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::reservation::ReservationStatus;
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, hour, minute, 0).unwrap()
    }

    fn booking(id: i64, hour: u32, minute: u32, minutes: i64) -> Reservation {
        Reservation::new(id, at(hour, minute), minutes, ReservationStatus::Confirmed)
    }

    fn settings(lifts: u32) -> OperatingSettings {
        OperatingSettings {
            lift_count: lifts,
            ..OperatingSettings::default()
        }
    }

    #[test]
    fn test_overlap_at_capacity_is_rejected() {
        let settings = settings(1);
        let evaluator = CapacityEvaluator::new(&settings);
        let existing = vec![booking(1, 10, 0, 60)];

        let report = evaluator.evaluate(TimeWindow::from_minutes(at(10, 30), 30), &existing, None);
        assert_eq!(report, CapacityReport { allowed: false, max_concurrent: 1 });

        let report = evaluator.evaluate(TimeWindow::from_minutes(at(11, 0), 30), &existing, None);
        assert_eq!(report, CapacityReport { allowed: true, max_concurrent: 0 });
    }

    #[test]
    fn test_moved_reservation_is_excluded() {
        let settings = settings(1);
        let evaluator = CapacityEvaluator::new(&settings);
        let existing = vec![booking(1, 10, 0, 60)];

        let report = evaluator.evaluate(TimeWindow::from_minutes(at(10, 30), 60), &existing, Some(1));
        assert!(report.allowed);
        assert_eq!(report.max_concurrent, 0);
    }

    #[test]
    fn test_non_consuming_statuses_are_ignored() {
        let settings = settings(1);
        let evaluator = CapacityEvaluator::new(&settings);
        let mut canceled = booking(1, 10, 0, 60);
        canceled.status = ReservationStatus::Canceled;
        let mut no_show = booking(2, 10, 0, 60);
        no_show.status = ReservationStatus::NoShow;

        let report = evaluator.evaluate(
            TimeWindow::from_minutes(at(10, 0), 60),
            &[canceled, no_show],
            None,
        );
        assert_eq!(report.max_concurrent, 0);
        assert!(report.allowed);
    }

    #[test]
    fn test_max_is_per_slice_not_whole_window() {
        // Two back-to-back bookings never run at the same time.
        let settings = settings(2);
        let evaluator = CapacityEvaluator::new(&settings);
        let existing = vec![booking(1, 10, 0, 60), booking(2, 11, 0, 60)];

        let report = evaluator.evaluate(TimeWindow::from_minutes(at(10, 0), 120), &existing, None);
        assert_eq!(report.max_concurrent, 1);
        assert!(report.allowed);
    }

    #[test]
    fn test_stacked_bookings_count_together() {
        let settings = settings(2);
        let evaluator = CapacityEvaluator::new(&settings);
        let existing = vec![booking(1, 10, 0, 60), booking(2, 10, 30, 60)];

        let report = evaluator.evaluate(TimeWindow::from_minutes(at(10, 30), 30), &existing, None);
        assert_eq!(report, CapacityReport { allowed: false, max_concurrent: 2 });
    }

    #[test]
    fn test_batch_needs_a_free_lift_per_vehicle() {
        let settings = settings(2);
        let evaluator = CapacityEvaluator::new(&settings);
        let existing = vec![booking(1, 10, 0, 60)];
        let candidate = TimeWindow::from_minutes(at(10, 0), 30);

        assert!(evaluator.evaluate_batch(candidate, &existing, None, 1).allowed);
        assert_eq!(
            evaluator.evaluate_batch(candidate, &existing, None, 2),
            CapacityReport { allowed: false, max_concurrent: 1 }
        );
        assert!(
            evaluator
                .evaluate_batch(TimeWindow::from_minutes(at(11, 0), 30), &existing, None, 2)
                .allowed
        );
    }

    #[test]
    fn test_day_based_reservation_occupies_whole_day() {
        let settings = settings(1);
        let evaluator = CapacityEvaluator::new(&settings);
        let multi_day = Reservation::new(
            9,
            Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
            2880,
            ReservationStatus::Pending,
        );

        let report = evaluator.evaluate(TimeWindow::from_minutes(at(16, 0), 30), &[multi_day], None);
        assert!(!report.allowed);
    }

    #[test]
    fn test_empty_candidate_has_no_load() {
        let settings = settings(1);
        let evaluator = CapacityEvaluator::new(&settings);
        let existing = vec![booking(1, 10, 0, 60)];

        let report = evaluator.evaluate(TimeWindow::new(at(10, 0), at(10, 0)), &existing, None);
        assert_eq!(report.max_concurrent, 0);
    }
}
