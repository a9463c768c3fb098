// Showroom calendar rules: bookable slots, start window and expiry

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::appointments::AppointmentStatus;

const OPENING_HOUR: u32 = 9;
const CLOSING_HOUR: u32 = 18;
const LUNCH_HOUR: u32 = 12;

/// How early a dealer may start an approved appointment
pub fn start_lead() -> Duration {
    Duration::minutes(30)
}

/// How long after the slot an approved appointment can still be started
pub fn start_grace() -> Duration {
    Duration::hours(2)
}

/// Hourly slots on `date` that are still bookable at `now`
pub fn available_slots(date: NaiveDate, now: NaiveDateTime) -> Vec<NaiveDateTime> {
    if date < now.date() {
        return Vec::new();
    }
    (OPENING_HOUR..CLOSING_HOUR)
        .filter(|hour| *hour != LUNCH_HOUR)
        .filter_map(|hour| NaiveTime::from_hms_opt(hour, 0, 0))
        .map(|time| date.and_time(time))
        .filter(|slot| *slot > now)
        .collect()
}

pub fn within_start_window(appointment_date: NaiveDateTime, now: NaiveDateTime) -> bool {
    now >= appointment_date - start_lead() && now <= appointment_date + start_grace()
}

/// Approved appointments scheduled before this instant can no longer start
pub fn approved_expiry_cutoff(now: NaiveDateTime) -> NaiveDateTime {
    now - start_grace()
}

/// Whether the expiry sweep would move this appointment to EXPIRED at `now`
pub fn is_overdue(status: AppointmentStatus, appointment_date: NaiveDateTime, now: NaiveDateTime) -> bool {
    match status {
        AppointmentStatus::Pending => appointment_date <= now,
        AppointmentStatus::Approve => appointment_date < approved_expiry_cutoff(now),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use proptest::prelude::*;

    fn at(date: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
        date.and_hms_opt(hour, minute, 0).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    #[test]
    fn test_future_day_has_all_slots() {
        let now = at(day() - Duration::days(1), 20, 0);
        let hours: Vec<u32> = available_slots(day(), now).iter().map(|s| s.hour()).collect();
        assert_eq!(hours, vec![9, 10, 11, 13, 14, 15, 16, 17]);
    }

    #[test]
    fn test_past_slots_are_dropped_today() {
        let now = at(day(), 13, 0);
        let hours: Vec<u32> = available_slots(day(), now).iter().map(|s| s.hour()).collect();
        assert_eq!(hours, vec![14, 15, 16, 17]);
    }

    #[test]
    fn test_past_day_has_no_slots() {
        let now = at(day(), 8, 0);
        assert!(available_slots(day() - Duration::days(1), now).is_empty());
    }

    #[test]
    fn test_after_closing_no_slots_today() {
        assert!(available_slots(day(), at(day(), 17, 30)).is_empty());
    }

    #[test]
    fn test_start_window_bounds() {
        let slot = at(day(), 10, 0);
        assert!(!within_start_window(slot, at(day(), 9, 29)));
        assert!(within_start_window(slot, at(day(), 9, 30)));
        assert!(within_start_window(slot, at(day(), 12, 0)));
        assert!(!within_start_window(slot, at(day(), 12, 1)));
    }

    #[test]
    fn test_expiry_cutoff_matches_window_end() {
        let slot = at(day(), 10, 0);
        let now = at(day(), 12, 1);
        assert!(slot < approved_expiry_cutoff(now));
        assert!(!within_start_window(slot, now));
    }

    #[test]
    fn test_pending_past_its_slot_is_overdue() {
        let slot = at(day(), 10, 0);
        assert!(!is_overdue(AppointmentStatus::Pending, slot, at(day(), 9, 59)));
        assert!(is_overdue(AppointmentStatus::Pending, slot, at(day(), 10, 0)));
        assert!(is_overdue(AppointmentStatus::Pending, slot, at(day(), 10, 1)));
    }

    #[test]
    fn test_approved_keeps_grace_period() {
        let slot = at(day(), 10, 0);
        assert!(!is_overdue(AppointmentStatus::Approve, slot, at(day(), 11, 0)));
        assert!(!is_overdue(AppointmentStatus::Approve, slot, at(day(), 12, 0)));
        assert!(is_overdue(AppointmentStatus::Approve, slot, at(day(), 12, 1)));
    }

    #[test]
    fn test_settled_statuses_never_overdue() {
        let slot = at(day(), 10, 0);
        let later = at(day() + Duration::days(3), 10, 0);
        for status in [
            AppointmentStatus::Running,
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::Expired,
        ] {
            assert!(!is_overdue(status, slot, later));
        }
    }

    proptest! {
        #[test]
        fn prop_slots_are_future_hourly_and_skip_lunch(
            day_offset in -3i64..3,
            minutes in 0i64..(24 * 60),
        ) {
            let now = day().and_hms_opt(0, 0, 0).unwrap() + Duration::minutes(minutes);
            let date = day() + Duration::days(day_offset);
            for slot in available_slots(date, now) {
                prop_assert!(slot > now);
                prop_assert_eq!(slot.date(), date);
                prop_assert_eq!(slot.minute(), 0);
                prop_assert!(slot.hour() >= 9 && slot.hour() < 18 && slot.hour() != 12);
            }
        }
    }
}
