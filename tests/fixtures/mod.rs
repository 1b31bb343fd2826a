// Test fixtures - in-memory backend and sample data
// Shared by the integration tests

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

use shop_schedule::models::blocked::{BlockedInterval, NewBlockedInterval};
use shop_schedule::models::reservation::{Reservation, ReservationStatus};
use shop_schedule::models::settings::OperatingSettings;
use shop_schedule::models::window::TimeWindow;
use shop_schedule::services::day_window::effective_window;
use shop_schedule::services::remote::{RemoteError, ScheduleRemote};
use shop_schedule::utils::date::at_local;

/// Sample dates for testing
pub mod dates {
    use super::*;

    /// Monday June 2, 2025
    pub fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    /// `hour:minute` UTC on Monday June 2, 2025
    pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, hour, minute, 0).unwrap()
    }

    pub fn on(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, hour, minute, 0).unwrap()
    }
}

/// The 09:00-18:00, 30 minute, single lift shop
pub fn one_lift_shop() -> OperatingSettings {
    OperatingSettings::default()
}

pub fn booking(id: i64, start: DateTime<Utc>, minutes: i64) -> Reservation {
    Reservation::new(id, start, minutes, ReservationStatus::Confirmed)
}

#[derive(Debug, Default)]
struct FakeState {
    settings: OperatingSettings,
    reservations: Vec<Reservation>,
    blocked: Vec<BlockedInterval>,
    calls: Vec<String>,
    next_blocked_id: i64,
    reject_mutations: Option<String>,
}

/// In-memory backend that records every call it receives.
#[derive(Debug, Default)]
pub struct FakeRemote {
    state: Mutex<FakeState>,
}

impl FakeRemote {
    pub fn new(settings: OperatingSettings) -> Self {
        Self {
            state: Mutex::new(FakeState {
                settings,
                next_blocked_id: 100,
                ..FakeState::default()
            }),
        }
    }

    pub fn with_reservations(self, reservations: Vec<Reservation>) -> Self {
        self.state.lock().unwrap().reservations = reservations;
        self
    }

    pub fn with_blocked(self, blocked: Vec<BlockedInterval>) -> Self {
        self.state.lock().unwrap().blocked = blocked;
        self
    }

    /// Make every mutation fail with `message`, as a database rule would.
    pub fn reject_mutations(&self, message: &str) {
        self.state.lock().unwrap().reject_mutations = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls().iter().filter(|call| call.as_str() == name).count()
    }

    pub fn reservation(&self, id: i64) -> Option<Reservation> {
        self.state
            .lock()
            .unwrap()
            .reservations
            .iter()
            .find(|reservation| reservation.id == id)
            .cloned()
    }

    fn record(&self, name: &str) {
        self.state.lock().unwrap().calls.push(name.to_string());
    }

    fn civil_day(date: NaiveDate, settings: &OperatingSettings) -> TimeWindow {
        TimeWindow::new(
            at_local(date, NaiveTime::MIN, settings.timezone),
            at_local(date + Duration::days(1), NaiveTime::MIN, settings.timezone),
        )
    }

    fn mutate<F>(&self, name: &str, apply: F) -> Result<(), RemoteError>
    where
        F: FnOnce(&mut FakeState) -> Result<(), RemoteError>,
    {
        let mut state = self.state.lock().unwrap();
        state.calls.push(name.to_string());
        if let Some(message) = &state.reject_mutations {
            return Err(RemoteError::Rejected(message.clone()));
        }
        apply(&mut state)
    }

    fn update<F>(&self, name: &str, id: i64, change: F) -> Result<(), RemoteError>
    where
        F: FnOnce(&mut Reservation),
    {
        self.mutate(name, |state| {
            let reservation = state
                .reservations
                .iter_mut()
                .find(|reservation| reservation.id == id)
                .ok_or_else(|| RemoteError::Rejected(format!("Reservation {} not found", id)))?;
            change(reservation);
            Ok(())
        })
    }
}

#[async_trait]
impl ScheduleRemote for FakeRemote {
    async fn fetch_settings(&self) -> Result<OperatingSettings, RemoteError> {
        self.record("fetch_settings");
        Ok(self.state.lock().unwrap().settings.clone())
    }

    async fn list_reservations_by_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, RemoteError> {
        self.record("list_reservations_by_date");
        let state = self.state.lock().unwrap();
        let day = Self::civil_day(date, &state.settings);
        Ok(state
            .reservations
            .iter()
            .filter(|reservation| effective_window(reservation, &state.settings).overlaps(&day))
            .cloned()
            .collect())
    }

    async fn list_reservations_by_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Reservation>, RemoteError> {
        self.record("list_reservations_by_range");
        let state = self.state.lock().unwrap();
        let range = TimeWindow::new(
            Self::civil_day(from, &state.settings).start,
            Self::civil_day(to, &state.settings).end,
        );
        Ok(state
            .reservations
            .iter()
            .filter(|reservation| range.overlaps(&reservation.literal_window()))
            .cloned()
            .collect())
    }

    async fn list_blocked_by_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<BlockedInterval>, RemoteError> {
        self.record("list_blocked_by_date");
        let state = self.state.lock().unwrap();
        let day = Self::civil_day(date, &state.settings);
        Ok(state
            .blocked
            .iter()
            .filter(|blocked| blocked.window().overlaps(&day))
            .cloned()
            .collect())
    }

    async fn reschedule(
        &self,
        reservation_id: i64,
        new_start: DateTime<Utc>,
    ) -> Result<(), RemoteError> {
        self.update("reschedule", reservation_id, |reservation| {
            reservation.scheduled_at = new_start;
        })
    }

    async fn set_status(
        &self,
        reservation_id: i64,
        status: ReservationStatus,
    ) -> Result<(), RemoteError> {
        self.update("set_status", reservation_id, |reservation| {
            reservation.status = status;
        })
    }

    async fn assign(&self, reservation_id: i64, admin_id: &str) -> Result<(), RemoteError> {
        let admin_id = admin_id.to_string();
        self.update("assign", reservation_id, move |reservation| {
            reservation.assigned_admin_id = Some(admin_id);
        })
    }

    async fn unassign(&self, reservation_id: i64) -> Result<(), RemoteError> {
        self.update("unassign", reservation_id, |reservation| {
            reservation.assigned_admin_id = None;
        })
    }

    async fn mark_completed(&self, reservation_id: i64) -> Result<(), RemoteError> {
        self.update("mark_completed", reservation_id, |reservation| {
            reservation.status = ReservationStatus::Completed;
        })
    }

    async fn delete_reservation(&self, reservation_id: i64) -> Result<(), RemoteError> {
        self.mutate("delete_reservation", |state| {
            state
                .reservations
                .retain(|reservation| reservation.id != reservation_id);
            Ok(())
        })
    }

    async fn create_blocked(
        &self,
        blocked: NewBlockedInterval,
    ) -> Result<BlockedInterval, RemoteError> {
        let mut created = None;
        self.mutate("create_blocked", |state| {
            let interval = BlockedInterval {
                id: state.next_blocked_id,
                start_at: blocked.start_at,
                end_at: blocked.end_at,
                reason: blocked.reason,
            };
            state.next_blocked_id += 1;
            state.blocked.push(interval.clone());
            created = Some(interval);
            Ok(())
        })?;
        created.ok_or_else(|| RemoteError::Decode("no row returned".to_string()))
    }

    async fn delete_blocked(&self, blocked_id: i64) -> Result<(), RemoteError> {
        self.mutate("delete_blocked", |state| {
            state.blocked.retain(|blocked| blocked.id != blocked_id);
            Ok(())
        })
    }
}
