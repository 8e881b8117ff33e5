use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};

use crate::models::{TimeSlot, SLOT_MINUTES};

pub const OPENING_MINUTE: u32 = 9 * 60;
pub const CLOSING_MINUTE: u32 = 17 * 60 + 30;

const BASE_UNAVAILABLE_DRAWS: u64 = 5;
const SLOT_MODULUS: u64 = 17;
const PEAK_HOURS: RangeInclusive<u32> = 11..=14;
const PEAK_THRESHOLD: f64 = 0.3;

/// Sum of the UTF-16 code units of the barber's name.
pub fn barber_seed(name: &str) -> u64 {
    name.encode_utf16().map(u64::from).sum()
}

/// Slot ids blocked for every day. Draws that land on the same id collapse,
/// so fewer than five ids may come back.
pub fn base_unavailable_ids(seed: u64) -> BTreeSet<u32> {
    (1..=BASE_UNAVAILABLE_DRAWS)
        .map(|draw| (seed.wrapping_mul(draw) % SLOT_MODULUS) as u32 + 1)
        .collect()
}

fn is_peak_day(date: Option<NaiveDate>) -> bool {
    matches!(
        date.map(|date| date.weekday()),
        Some(Weekday::Fri | Weekday::Sat)
    )
}

fn is_busy_at_peak(seed: u64, id: u32) -> bool {
    (seed.wrapping_mul(u64::from(id)) as f64).sin() > PEAK_THRESHOLD
}

pub fn format_clock(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

fn clock_label(minute_of_day: u32) -> String {
    NaiveTime::from_num_seconds_from_midnight_opt(minute_of_day * 60, 0)
        .map(format_clock)
        .unwrap_or_default()
}

/// Builds the day's slots for `barber_name`, from 09:00 up to but not
/// including 17:30. The result depends only on its arguments.
pub fn generate_time_slots(barber_name: &str, selected_date: Option<NaiveDate>) -> Vec<TimeSlot> {
    let seed = barber_seed(barber_name);
    let mut unavailable = base_unavailable_ids(seed);
    let peak_day = is_peak_day(selected_date);

    let mut slots = Vec::new();
    let mut minute = OPENING_MINUTE;
    let mut id = 1;
    while minute < CLOSING_MINUTE {
        let hour = minute / 60;
        if peak_day && PEAK_HOURS.contains(&hour) && is_busy_at_peak(seed, id) {
            unavailable.insert(id);
        }
        slots.push(TimeSlot {
            id,
            time: clock_label(minute),
            available: !unavailable.contains(&id),
            duration_minutes: SLOT_MINUTES,
        });
        minute += SLOT_MINUTES;
        id += 1;
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unavailable(slots: &[TimeSlot]) -> Vec<u32> {
        slots.iter().filter(|s| !s.available).map(|s| s.id).collect()
    }

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn day_has_seventeen_half_hour_slots() {
        let slots = generate_time_slots("Sam L.", None);
        assert_eq!(slots.len(), 17);
        assert_eq!(slots[0].time, "9:00 AM");
        assert_eq!(slots[6].time, "12:00 PM");
        assert_eq!(slots[16].time, "5:00 PM");
        assert!(slots.iter().all(|s| s.duration_minutes == 30));
        let ids: Vec<_> = slots.iter().map(|s| s.id).collect();
        assert_eq!(ids, (1..=17).collect::<Vec<_>>());
    }

    #[test]
    fn seed_sums_code_units() {
        assert_eq!(barber_seed(""), 0);
        assert_eq!(barber_seed("Tony F."), 574);
        assert_eq!(barber_seed("David J."), 640);
    }

    #[test]
    fn empty_name_only_blocks_first_slot() {
        for selected in [None, date(2026, 10, 16), date(2026, 10, 17), date(2026, 10, 19)] {
            let slots = generate_time_slots("", selected);
            assert_eq!(unavailable(&slots), vec![1]);
        }
    }

    #[test]
    fn tony_without_a_date() {
        let slots = generate_time_slots("Tony F.", None);
        assert_eq!(unavailable(&slots), vec![2, 6, 10, 14, 15]);
        assert_eq!(slots.iter().filter(|s| s.available).count(), 12);
    }

    #[test]
    fn colliding_draws_collapse() {
        // 17 * k always lands on id 1
        assert_eq!(base_unavailable_ids(34).into_iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn friday_adds_peak_unavailability() {
        let friday = generate_time_slots("Tony F.", date(2026, 10, 16));
        assert_eq!(unavailable(&friday), vec![2, 6, 9, 10, 12, 14, 15]);
        let saturday = generate_time_slots("Tony F.", date(2026, 10, 17));
        assert_eq!(unavailable(&saturday), unavailable(&friday));
    }

    #[test]
    fn weekday_matches_no_date() {
        let monday = generate_time_slots("Sam L.", date(2026, 10, 19));
        assert_eq!(monday, generate_time_slots("Sam L.", None));
    }

    #[test]
    fn peak_rule_stays_inside_peak_hours() {
        let none = generate_time_slots("Sam L.", None);
        let friday = generate_time_slots("Sam L.", date(2026, 10, 16));
        for (plain, peak) in none.iter().zip(&friday) {
            if plain.available != peak.available {
                assert!((5..=12).contains(&plain.id), "slot {} changed", plain.id);
            }
        }
        assert_eq!(unavailable(&friday), vec![2, 3, 4, 5, 6, 10, 12]);
    }

    #[test]
    fn generation_is_deterministic() {
        let selected = date(2026, 10, 16);
        assert_eq!(
            generate_time_slots("David J.", selected),
            generate_time_slots("David J.", selected)
        );
    }
}
