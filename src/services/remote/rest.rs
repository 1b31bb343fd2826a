// PostgREST RPC client for the shop backend
// Reads retry on transient failures; mutations are sent once

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::{RemoteError, ScheduleRemote};
use crate::config::ApiConfig;
use crate::models::blocked::{BlockedInterval, NewBlockedInterval};
use crate::models::reservation::{Reservation, ReservationStatus};
use crate::models::settings::OperatingSettings;

mod rpc {
    pub const GET_SETTINGS: &str = "get_shop_settings";
    pub const RESERVATIONS_BY_DATE: &str = "list_reservations_by_date";
    pub const RESERVATIONS_BY_RANGE: &str = "list_reservations_by_range";
    pub const BLOCKED_BY_DATE: &str = "list_blocked_times_by_date";
    pub const RESCHEDULE: &str = "admin_reschedule_reservation";
    pub const SET_STATUS: &str = "admin_set_reservation_status";
    pub const ASSIGN: &str = "admin_assign_reservation";
    pub const UNASSIGN: &str = "admin_unassign_reservation";
    pub const MARK_COMPLETED: &str = "admin_mark_reservation_completed";
    pub const DELETE_RESERVATION: &str = "admin_delete_reservation";
    pub const CREATE_BLOCKED: &str = "admin_create_blocked_time";
    pub const DELETE_BLOCKED: &str = "admin_delete_blocked_time";
}

/// Client for the backend's PostgREST RPC endpoints.
pub struct RestRemote {
    client: Client,
    base_url: String,
    api_key: String,
    read_retries: usize,
    retry_delay: Duration,
}

impl RestRemote {
    pub fn new(config: &ApiConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            read_retries: config.read_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    fn rpc_url(&self, name: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, name)
    }

    async fn call_once(&self, name: &str, body: &Value) -> Result<Value, RemoteError> {
        let response = self
            .client
            .post(self.rpc_url(name))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|err| RemoteError::Decode(err.to_string()))
    }

    /// Read call, retried on transient failures.
    async fn read<T: DeserializeOwned>(&self, name: &str, body: Value) -> Result<T, RemoteError> {
        let mut attempt = 0;
        loop {
            match self.call_once(name, &body).await {
                Ok(value) => {
                    return serde_json::from_value(value)
                        .map_err(|err| RemoteError::Decode(format!("{}: {}", name, err)));
                }
                Err(err) if attempt < self.read_retries && err.is_transient() => {
                    attempt += 1;
                    log::warn!("RPC {} attempt {} failed: {}", name, attempt, err);
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Mutating call. Sent exactly once.
    async fn mutate(&self, name: &str, body: Value) -> Result<Value, RemoteError> {
        log::debug!("RPC {} (mutation)", name);
        let value = self.call_once(name, &body).await?;
        check_ack(&value)?;
        Ok(value)
    }
}

/// Pull a human-readable message out of a PostgREST error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "Request failed".to_string()
            } else {
                trimmed.to_string()
            }
        })
}

/// Treat a falsy success indicator as a rejection.
fn check_ack(value: &Value) -> Result<(), RemoteError> {
    const DECLINED: &str = "The server declined the request";

    match value {
        Value::Bool(false) => Err(RemoteError::Rejected(DECLINED.to_string())),
        Value::Object(map) => {
            let flag = map
                .get("ok")
                .or_else(|| map.get("success"))
                .and_then(Value::as_bool);
            if flag == Some(false) {
                let message = map
                    .get("message")
                    .or_else(|| map.get("error"))
                    .and_then(Value::as_str)
                    .unwrap_or(DECLINED);
                return Err(RemoteError::Rejected(message.to_string()));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Single-row RPCs may come back as a one-element array.
fn single_row(value: Value) -> Value {
    match value {
        Value::Array(mut rows) if !rows.is_empty() => rows.swap_remove(0),
        other => other,
    }
}

#[async_trait]
impl ScheduleRemote for RestRemote {
    async fn fetch_settings(&self) -> Result<OperatingSettings, RemoteError> {
        let value: Value = self.read(rpc::GET_SETTINGS, json!({})).await?;
        serde_json::from_value(single_row(value))
            .map_err(|err| RemoteError::Decode(format!("{}: {}", rpc::GET_SETTINGS, err)))
    }

    async fn list_reservations_by_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, RemoteError> {
        self.read(rpc::RESERVATIONS_BY_DATE, json!({ "p_date": date }))
            .await
    }

    async fn list_reservations_by_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Reservation>, RemoteError> {
        self.read(
            rpc::RESERVATIONS_BY_RANGE,
            json!({ "p_from": from, "p_to": to }),
        )
        .await
    }

    async fn list_blocked_by_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<BlockedInterval>, RemoteError> {
        self.read(rpc::BLOCKED_BY_DATE, json!({ "p_date": date }))
            .await
    }

    async fn reschedule(
        &self,
        reservation_id: i64,
        new_start: DateTime<Utc>,
    ) -> Result<(), RemoteError> {
        self.mutate(
            rpc::RESCHEDULE,
            json!({ "p_reservation_id": reservation_id, "p_new_start": new_start }),
        )
        .await
        .map(|_| ())
    }

    async fn set_status(
        &self,
        reservation_id: i64,
        status: ReservationStatus,
    ) -> Result<(), RemoteError> {
        self.mutate(
            rpc::SET_STATUS,
            json!({ "p_reservation_id": reservation_id, "p_status": status }),
        )
        .await
        .map(|_| ())
    }

    async fn assign(&self, reservation_id: i64, admin_id: &str) -> Result<(), RemoteError> {
        self.mutate(
            rpc::ASSIGN,
            json!({ "p_reservation_id": reservation_id, "p_admin_id": admin_id }),
        )
        .await
        .map(|_| ())
    }

    async fn unassign(&self, reservation_id: i64) -> Result<(), RemoteError> {
        self.mutate(rpc::UNASSIGN, json!({ "p_reservation_id": reservation_id }))
            .await
            .map(|_| ())
    }

    async fn mark_completed(&self, reservation_id: i64) -> Result<(), RemoteError> {
        self.mutate(
            rpc::MARK_COMPLETED,
            json!({ "p_reservation_id": reservation_id }),
        )
        .await
        .map(|_| ())
    }

    async fn delete_reservation(&self, reservation_id: i64) -> Result<(), RemoteError> {
        self.mutate(
            rpc::DELETE_RESERVATION,
            json!({ "p_reservation_id": reservation_id }),
        )
        .await
        .map(|_| ())
    }

    async fn create_blocked(
        &self,
        blocked: NewBlockedInterval,
    ) -> Result<BlockedInterval, RemoteError> {
        blocked.validate().map_err(RemoteError::Rejected)?;

        let value = self
            .mutate(
                rpc::CREATE_BLOCKED,
                json!({
                    "p_start_at": blocked.start_at,
                    "p_end_at": blocked.end_at,
                    "p_reason": blocked.reason,
                }),
            )
            .await?;

        serde_json::from_value(single_row(value))
            .map_err(|err| RemoteError::Decode(format!("{}: {}", rpc::CREATE_BLOCKED, err)))
    }

    async fn delete_blocked(&self, blocked_id: i64) -> Result<(), RemoteError> {
        self.mutate(rpc::DELETE_BLOCKED, json!({ "p_blocked_id": blocked_id }))
            .await
            .map(|_| ())
    }
}
