//! Grouping of day-chunk reservations into owner-facing works.
//!
//! The root reservation id is the real grouping key. Older rows were written
//! without one; for those, full-day chunks that look alike on consecutive days
//! are grouped by a best-effort heuristic. Heuristic groups are flagged and
//! carry no correctness guarantee.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;

use crate::models::reservation::Reservation;
use crate::models::settings::OperatingSettings;
use crate::models::work::{Work, WorkGrouping};
use crate::utils::date::local_date;

/// Heuristic groups smaller than this stay as singletons.
pub const MIN_HEURISTIC_GROUP: usize = 2;
/// Heuristic groups may not span more calendar days than this.
pub const MAX_HEURISTIC_SPAN_DAYS: i64 = 31;

type SimilarityKey = (i64, String, String);

pub fn group_works(reservations: &[Reservation], settings: &OperatingSettings) -> Vec<Work> {
    let roots: HashSet<i64> = reservations
        .iter()
        .filter_map(|reservation| reservation.root_reservation_id)
        .collect();

    let mut by_root: BTreeMap<i64, Vec<Reservation>> = BTreeMap::new();
    let mut loose: Vec<Reservation> = Vec::new();

    for reservation in reservations {
        if reservation.root_reservation_id.is_some() || roots.contains(&reservation.id) {
            by_root
                .entry(reservation.work_root())
                .or_default()
                .push(reservation.clone());
        } else {
            loose.push(reservation.clone());
        }
    }

    let mut works: Vec<Work> = by_root
        .into_iter()
        .filter_map(|(root_id, members)| Work::from_members(root_id, members, WorkGrouping::RootId))
        .collect();

    works.extend(group_legacy(loose, settings));
    works.sort_by_key(|work| (work.first_start, work.root_id));
    works
}

fn similarity_key(reservation: &Reservation, business_day: i64) -> Option<SimilarityKey> {
    if business_day <= 0 || reservation.duration_minutes != business_day {
        return None;
    }
    let service = reservation.service_item_id?;
    let vehicle = normalized(reservation.vehicle_number.as_deref())?;
    let phone = normalized(reservation.customer_phone.as_deref())?;
    Some((service, vehicle, phone))
}

fn normalized(value: Option<&str>) -> Option<String> {
    let value: String = value?
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_lowercase();
    (!value.is_empty()).then_some(value)
}

/// Legacy fallback for rows without a root id.
fn group_legacy(loose: Vec<Reservation>, settings: &OperatingSettings) -> Vec<Work> {
    let business_day = settings.business_day_minutes();
    let mut candidates: BTreeMap<SimilarityKey, Vec<Reservation>> = BTreeMap::new();
    let mut works = Vec::new();

    for reservation in loose {
        match similarity_key(&reservation, business_day) {
            Some(key) => candidates.entry(key).or_default().push(reservation),
            None => works.extend(single(reservation)),
        }
    }

    for (_, mut chunks) in candidates {
        chunks.sort_by_key(|reservation| (reservation.scheduled_at, reservation.id));

        let mut run: Vec<Reservation> = Vec::new();
        let mut run_start: Option<NaiveDate> = None;
        let mut last_date: Option<NaiveDate> = None;

        for chunk in chunks {
            let date = local_date(chunk.scheduled_at, settings.timezone);
            let continues = match (last_date, run_start) {
                (Some(last), Some(first)) => {
                    (date - last).num_days() == 1
                        && (date - first).num_days() < MAX_HEURISTIC_SPAN_DAYS
                }
                _ => false,
            };

            if !continues {
                works.extend(flush_run(std::mem::take(&mut run)));
                run_start = Some(date);
            }
            last_date = Some(date);
            run.push(chunk);
        }
        works.extend(flush_run(run));
    }

    works
}

fn flush_run(run: Vec<Reservation>) -> Vec<Work> {
    if run.len() >= MIN_HEURISTIC_GROUP {
        let root_id = run.iter().map(|reservation| reservation.id).min().unwrap_or_default();
        log::debug!(
            "Grouped {} legacy chunks under reservation {} by similarity",
            run.len(),
            root_id
        );
        Work::from_members(root_id, run, WorkGrouping::Heuristic)
            .into_iter()
            .collect()
    } else {
        run.into_iter().filter_map(single).collect()
    }
}

fn single(reservation: Reservation) -> Option<Work> {
    Work::from_members(reservation.id, vec![reservation], WorkGrouping::Single)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::reservation::ReservationStatus;
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn on(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, day, 9, 0, 0).unwrap()
    }

    fn chunk(id: i64, day: u32) -> Reservation {
        let mut reservation = Reservation::new(id, on(day), 540, ReservationStatus::Confirmed);
        reservation.service_item_id = Some(4);
        reservation.vehicle_number = Some("12AB 3456".to_string());
        reservation.customer_phone = Some("010-1234-5678".to_string());
        reservation
    }

    fn ids(work: &Work) -> Vec<i64> {
        work.reservations.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_groups_by_root_id() {
        let root = Reservation::new(10, on(1), 540, ReservationStatus::Confirmed);
        let mut second = Reservation::new(11, on(2), 540, ReservationStatus::Confirmed);
        second.root_reservation_id = Some(10);
        let mut third = Reservation::new(12, on(3), 540, ReservationStatus::Pending);
        third.root_reservation_id = Some(10);
        let other = Reservation::new(20, on(2), 60, ReservationStatus::Confirmed);

        let works = group_works(&[third, other, root, second], &OperatingSettings::default());

        assert_eq!(works.len(), 2);
        assert_eq!(works[0].root_id, 10);
        assert_eq!(ids(&works[0]), vec![10, 11, 12]);
        assert_eq!(works[0].first_start, on(1));
        assert_eq!(works[0].last_start, on(3));
        assert_eq!(works[0].grouping, WorkGrouping::RootId);
        assert_eq!(works[1].grouping, WorkGrouping::Single);
    }

    #[test]
    fn test_heuristic_groups_consecutive_similar_chunks() {
        let works = group_works(
            &[chunk(1, 1), chunk(2, 2), chunk(3, 3)],
            &OperatingSettings::default(),
        );

        assert_eq!(works.len(), 1);
        assert_eq!(ids(&works[0]), vec![1, 2, 3]);
        assert!(works[0].is_approximate());
    }

    #[test]
    fn test_heuristic_splits_on_gap() {
        let works = group_works(
            &[chunk(1, 1), chunk(2, 2), chunk(3, 5)],
            &OperatingSettings::default(),
        );

        assert_eq!(works.len(), 2);
        assert_eq!(ids(&works[0]), vec![1, 2]);
        assert_eq!(works[1].grouping, WorkGrouping::Single);
    }

    #[test]
    fn test_heuristic_requires_matching_fields() {
        let mut different = chunk(2, 2);
        different.vehicle_number = Some("99ZZ 0000".to_string());

        let works = group_works(&[chunk(1, 1), different], &OperatingSettings::default());

        assert_eq!(works.len(), 2);
        assert!(works.iter().all(|work| work.grouping == WorkGrouping::Single));
    }

    #[test]
    fn test_heuristic_ignores_partial_day_bookings() {
        let mut short = chunk(2, 2);
        short.duration_minutes = 60;

        let works = group_works(&[chunk(1, 1), short], &OperatingSettings::default());
        assert_eq!(works.len(), 2);
    }

    #[test]
    fn test_heuristic_caps_span() {
        let settings = OperatingSettings::default();
        let chunks: Vec<Reservation> = (1..=31)
            .map(|day| chunk(day as i64, day))
            .chain(std::iter::once({
                let mut next = chunk(32, 1);
                next.scheduled_at = Utc.with_ymd_and_hms(2025, 8, 1, 9, 0, 0).unwrap();
                next
            }))
            .collect();

        let works = group_works(&chunks, &settings);

        assert_eq!(works.len(), 2);
        assert_eq!(works[0].chunk_count(), 31);
        assert_eq!(works[1].chunk_count(), 1);
    }
}
