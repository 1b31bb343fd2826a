// Blocked interval module
// Time the shop is unavailable; never consumes capacity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::window::TimeWindow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedInterval {
    pub id: i64,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl BlockedInterval {
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start_at, self.end_at)
    }
}

/// Payload for creating a blocked interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBlockedInterval {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub reason: Option<String>,
}

impl NewBlockedInterval {
    pub fn new(start_at: DateTime<Utc>, end_at: DateTime<Utc>) -> Self {
        Self {
            start_at,
            end_at,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        self.reason = (!reason.trim().is_empty()).then_some(reason);
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.end_at <= self.start_at {
            return Err("Blocked time end must be after its start".to_string());
        }
        Ok(())
    }
}
