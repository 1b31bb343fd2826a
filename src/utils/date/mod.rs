// Date utility functions
// Civil-time helpers for the shop timezone

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Resolve a civil date and time of day in `tz` to a UTC instant.
///
/// Ambiguous local times (DST fall-back) take the earlier instant. Local times
/// that do not exist (DST spring-forward gap) move forward to the first valid
/// minute after the gap.
pub fn at_local(date: NaiveDate, time: NaiveTime, tz: Tz) -> DateTime<Utc> {
    let naive = date.and_time(time);
    resolve_naive(naive, tz)
}

fn resolve_naive(naive: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    if let Some(resolved) = tz.from_local_datetime(&naive).earliest() {
        return resolved.with_timezone(&Utc);
    }

    // Gaps are at most a few hours wide in practice.
    let mut candidate = naive;
    for _ in 0..(24 * 60) {
        candidate = match candidate.checked_add_signed(Duration::minutes(1)) {
            Some(next) => next,
            None => break,
        };
        if let Some(resolved) = tz.from_local_datetime(&candidate).earliest() {
            return resolved.with_timezone(&Utc);
        }
    }

    Utc.from_utc_datetime(&naive)
}

/// Civil date of `instant` in `tz`.
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Civil time of day of `instant` in `tz`.
pub fn local_time(instant: DateTime<Utc>, tz: Tz) -> NaiveTime {
    instant.with_timezone(&tz).time()
}

/// Every calendar day of `year`-`month`, in order.
///
/// Returns `None` when the month does not exist.
pub fn days_in_month(year: i32, month: u32) -> Option<Vec<NaiveDate>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let mut days = Vec::with_capacity(31);
    let mut current = first;
    while current.month() == first.month() {
        days.push(current);
        current = current.succ_opt()?;
    }
    Some(days)
}

/// Minutes from `open` to `close` on one civil day, or 0 when `close <= open`.
pub fn span_minutes(open: NaiveTime, close: NaiveTime) -> i64 {
    if close <= open {
        0
    } else {
        (close - open).num_minutes()
    }
}

/// Serde adapter for time-of-day strings such as `09:00` or `09:00:00`.
pub mod time_of_day {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(value: &str) -> Option<NaiveTime> {
        let value = value.trim();
        NaiveTime::parse_from_str(value, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S%.f"))
            .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
            .ok()
    }

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format("%H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid time of day '{}'", raw))
        })
    }
}
