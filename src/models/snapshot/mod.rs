// Day snapshot module
// Everything fetched for one calendar date, discarded after each mutation

use chrono::NaiveDate;

use crate::models::blocked::BlockedInterval;
use crate::models::reservation::Reservation;
use crate::models::settings::OperatingSettings;

#[derive(Debug, Clone, PartialEq)]
pub struct DaySnapshot {
    pub date: NaiveDate,
    pub settings: OperatingSettings,
    pub reservations: Vec<Reservation>,
    pub blocked: Vec<BlockedInterval>,
    /// Fetch generation that produced this snapshot.
    pub generation: u64,
}

impl DaySnapshot {
    pub fn new(
        date: NaiveDate,
        settings: OperatingSettings,
        reservations: Vec<Reservation>,
        blocked: Vec<BlockedInterval>,
    ) -> Self {
        Self {
            date,
            settings,
            reservations,
            blocked,
            generation: 0,
        }
    }

    pub fn find_reservation(&self, id: i64) -> Option<&Reservation> {
        self.reservations.iter().find(|reservation| reservation.id == id)
    }
}
