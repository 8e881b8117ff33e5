use chrono::{Datelike, Duration, NaiveDateTime, Timelike, Weekday};

use crate::slots::{format_clock, CLOSING_MINUTE, OPENING_MINUTE};

fn skip_weekend(mut at: NaiveDateTime) -> NaiveDateTime {
    while matches!(at.weekday(), Weekday::Sat | Weekday::Sun) {
        at += Duration::days(1);
    }
    at
}

fn at_opening(at: NaiveDateTime) -> NaiveDateTime {
    at.date()
        .and_hms_opt(OPENING_MINUTE / 60, OPENING_MINUTE % 60, 0)
        .unwrap_or(at)
}

/// Next moment a barber can take a client, `offset_days` after `now`.
///
/// Weekends are skipped. Once the shop has closed for the day the opening
/// rolls to the next business morning, and before opening it is clamped to
/// 09:00.
pub fn next_availability(now: NaiveDateTime, offset_days: i64) -> NaiveDateTime {
    let minute_of_day = now.hour() * 60 + now.minute();
    let next = skip_weekend(now + Duration::days(offset_days));
    if minute_of_day >= CLOSING_MINUTE {
        skip_weekend(at_opening(next + Duration::days(1)))
    } else if minute_of_day < OPENING_MINUTE {
        at_opening(next)
    } else {
        next
    }
}

pub fn availability_label(now: NaiveDateTime, offset_days: i64) -> String {
    let next = next_availability(now, offset_days);
    format!(
        "Available {} at {}",
        next.format("%a, %b %-d"),
        format_clock(next.time())
    )
}
