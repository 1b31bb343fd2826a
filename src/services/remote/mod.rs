//! Remote collaborator seam.
//!
//! The shop backend owns every entity. This trait is the full surface the
//! schedule logic needs from it; `RestRemote` talks to the real RPC API and
//! tests substitute their own implementation.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::models::blocked::{BlockedInterval, NewBlockedInterval};
use crate::models::reservation::{Reservation, ReservationStatus};
use crate::models::settings::OperatingSettings;

pub mod rest;

pub use rest::RestRemote;

/// Failure of a remote call. The message is shown to the operator as-is.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    /// The call completed but reported that it did not succeed.
    #[error("{0}")]
    Rejected(String),

    #[error("Unexpected response from server: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Whether repeating the same read could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Rejected(_) | Self::Decode(_) => false,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScheduleRemote: Send + Sync {
    async fn fetch_settings(&self) -> Result<OperatingSettings, RemoteError>;

    async fn list_reservations_by_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, RemoteError>;

    /// Reservations scheduled on any day in `[from, to]`.
    async fn list_reservations_by_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Reservation>, RemoteError>;

    async fn list_blocked_by_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<BlockedInterval>, RemoteError>;

    async fn reschedule(
        &self,
        reservation_id: i64,
        new_start: DateTime<Utc>,
    ) -> Result<(), RemoteError>;

    async fn set_status(
        &self,
        reservation_id: i64,
        status: ReservationStatus,
    ) -> Result<(), RemoteError>;

    async fn assign(&self, reservation_id: i64, admin_id: &str) -> Result<(), RemoteError>;

    async fn unassign(&self, reservation_id: i64) -> Result<(), RemoteError>;

    async fn mark_completed(&self, reservation_id: i64) -> Result<(), RemoteError>;

    async fn delete_reservation(&self, reservation_id: i64) -> Result<(), RemoteError>;

    async fn create_blocked(
        &self,
        blocked: NewBlockedInterval,
    ) -> Result<BlockedInterval, RemoteError>;

    async fn delete_blocked(&self, blocked_id: i64) -> Result<(), RemoteError>;
}
