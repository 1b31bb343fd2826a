// Slot row model
// One fixed-width row of the admin schedule grid, rebuilt on every fetch

use crate::models::blocked::BlockedInterval;
use crate::models::reservation::Reservation;
use crate::models::window::TimeWindow;

#[derive(Debug, Clone, PartialEq)]
pub struct SlotRow {
    pub window: TimeWindow,
    pub blocked: Option<BlockedInterval>,
    pub reservations: Vec<Reservation>,
}

impl SlotRow {
    pub fn new(window: TimeWindow) -> Self {
        Self {
            window,
            blocked: None,
            reservations: Vec::new(),
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.is_some()
    }

    /// Reservations in this row that occupy a lift.
    pub fn occupied(&self) -> usize {
        self.reservations
            .iter()
            .filter(|reservation| reservation.consumes_capacity())
            .count()
    }
}
