// Settings module
// Shop operating settings, owned by the backend and re-read with every snapshot

use chrono::{NaiveTime, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::utils::date::{span_minutes, time_of_day};

pub const MINUTES_PER_DAY: i64 = 1440;

/// Reasons operating settings cannot produce a schedule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("close time {close} must be after open time {open}")]
    CloseNotAfterOpen { open: NaiveTime, close: NaiveTime },

    #[error("slot length must be positive, got {0} minutes")]
    NonPositiveSlot(i64),

    #[error("lift count must be at least 1")]
    NoLifts,

    #[error("maximum batch quantity must be at least 1")]
    NoBatchQuantity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingSettings {
    #[serde(with = "time_of_day")]
    pub open_time: NaiveTime,
    #[serde(with = "time_of_day")]
    pub close_time: NaiveTime,
    pub slot_minutes: i64,
    #[serde(alias = "lift")]
    pub lift_count: u32,
    pub timezone: Tz,
    #[serde(default = "default_max_batch_qty")]
    pub max_batch_qty: u32,
}

fn default_max_batch_qty() -> u32 {
    1
}

impl OperatingSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.close_time <= self.open_time {
            return Err(SettingsError::CloseNotAfterOpen {
                open: self.open_time,
                close: self.close_time,
            });
        }

        if self.slot_minutes <= 0 {
            return Err(SettingsError::NonPositiveSlot(self.slot_minutes));
        }

        if self.lift_count == 0 {
            return Err(SettingsError::NoLifts);
        }

        if self.max_batch_qty == 0 {
            return Err(SettingsError::NoBatchQuantity);
        }

        Ok(())
    }

    /// Length of one business day in minutes; 0 when misconfigured.
    pub fn business_day_minutes(&self) -> i64 {
        span_minutes(self.open_time, self.close_time)
    }

    /// Number of whole slots in a business day.
    pub fn slots_per_day(&self) -> usize {
        if self.slot_minutes <= 0 {
            return 0;
        }
        (self.business_day_minutes() / self.slot_minutes) as usize
    }

    /// Whether `time` lands on the slot grid anchored at open.
    pub fn is_slot_aligned(&self, time: NaiveTime) -> bool {
        if self.slot_minutes <= 0 || time < self.open_time || time.second() != 0 {
            return false;
        }
        (time - self.open_time).num_minutes() % self.slot_minutes == 0
    }
}

impl Default for OperatingSettings {
    fn default() -> Self {
        Self {
            open_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            close_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
            slot_minutes: 30,
            lift_count: 1,
            timezone: Tz::UTC,
            max_batch_qty: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn test_default_settings_are_valid() {
        let settings = OperatingSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.business_day_minutes(), 540);
        assert_eq!(settings.slots_per_day(), 18);
    }

    #[test]
    fn test_validate_close_before_open() {
        let settings = OperatingSettings {
            open_time: time(18, 0),
            close_time: time(9, 0),
            ..OperatingSettings::default()
        };

        assert_eq!(
            settings.validate(),
            Err(SettingsError::CloseNotAfterOpen {
                open: time(18, 0),
                close: time(9, 0),
            })
        );
        assert_eq!(settings.business_day_minutes(), 0);
        assert_eq!(settings.slots_per_day(), 0);
    }

    #[test]
    fn test_validate_zero_slot() {
        let settings = OperatingSettings {
            slot_minutes: 0,
            ..OperatingSettings::default()
        };
        assert_eq!(settings.validate(), Err(SettingsError::NonPositiveSlot(0)));
        assert_eq!(settings.slots_per_day(), 0);
    }

    #[test]
    fn test_validate_no_lifts() {
        let settings = OperatingSettings {
            lift_count: 0,
            ..OperatingSettings::default()
        };
        assert_eq!(settings.validate(), Err(SettingsError::NoLifts));
    }

    #[test]
    fn test_slot_alignment() {
        let settings = OperatingSettings::default();
        assert!(settings.is_slot_aligned(time(9, 0)));
        assert!(settings.is_slot_aligned(time(10, 30)));
        assert!(!settings.is_slot_aligned(time(10, 15)));
        assert!(!settings.is_slot_aligned(time(8, 30)));
    }

    #[test]
    fn test_deserialize_wire_shape() {
        let json = r#"{
            "open_time": "09:00",
            "close_time": "18:00:00",
            "slot_minutes": 30,
            "lift": 2,
            "timezone": "Asia/Seoul",
            "max_batch_qty": 3
        }"#;

        let settings: OperatingSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.open_time, time(9, 0));
        assert_eq!(settings.close_time, time(18, 0));
        assert_eq!(settings.lift_count, 2);
        assert_eq!(settings.timezone, chrono_tz::Asia::Seoul);
        assert_eq!(settings.max_batch_qty, 3);
    }

    #[test]
    fn test_deserialize_rejects_unknown_timezone() {
        let json = r#"{
            "open_time": "09:00",
            "close_time": "18:00",
            "slot_minutes": 30,
            "lift_count": 1,
            "timezone": "Mars/Olympus"
        }"#;

        assert!(serde_json::from_str::<OperatingSettings>(json).is_err());
    }
}
