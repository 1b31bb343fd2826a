// Reservation module
// Read-only snapshot of a booking row owned by the backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::settings::MINUTES_PER_DAY;
use crate::models::window::TimeWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Completed,
    Canceled,
    NoShow,
}

impl ReservationStatus {
    /// Whether a reservation in this status occupies a lift.
    pub fn consumes_capacity(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed | Self::Completed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
            Self::NoShow => "no_show",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "canceled" | "cancelled" => Ok(Self::Canceled),
            "no_show" | "no-show" => Ok(Self::NoShow),
            other => Err(format!("Unknown reservation status '{}'", other)),
        }
    }
}

/// Booking row as returned by the reservation list calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i64,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i64,
    pub status: ReservationStatus,
    #[serde(default)]
    pub assigned_admin_id: Option<String>,
    #[serde(default)]
    pub completed_by: Option<String>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub root_reservation_id: Option<i64>,

    // Only read by the legacy work grouping.
    #[serde(default)]
    pub service_item_id: Option<i64>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub vehicle_number: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

impl Reservation {
    /// Create a reservation with the required fields and no optional data.
    pub fn new(
        id: i64,
        scheduled_at: DateTime<Utc>,
        duration_minutes: i64,
        status: ReservationStatus,
    ) -> Self {
        Self {
            id,
            scheduled_at,
            duration_minutes,
            status,
            assigned_admin_id: None,
            completed_by: None,
            completed_at: None,
            quantity: 1,
            root_reservation_id: None,
            service_item_id: None,
            customer_name: None,
            customer_phone: None,
            vehicle_number: None,
        }
    }

    /// Duration is a positive whole number of days.
    pub fn is_day_based(&self) -> bool {
        self.duration_minutes > 0 && self.duration_minutes % MINUTES_PER_DAY == 0
    }

    /// Number of business days for a day-based reservation.
    pub fn day_count(&self) -> Option<i64> {
        self.is_day_based()
            .then(|| self.duration_minutes / MINUTES_PER_DAY)
    }

    pub fn consumes_capacity(&self) -> bool {
        self.status.consumes_capacity()
    }

    /// `[scheduled_at, scheduled_at + duration)` taken at face value.
    pub fn literal_window(&self) -> TimeWindow {
        TimeWindow::from_minutes(self.scheduled_at, self.duration_minutes)
    }

    /// Id of the work this reservation belongs to.
    pub fn work_root(&self) -> i64 {
        self.root_reservation_id.unwrap_or(self.id)
    }
}
