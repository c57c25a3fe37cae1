//! Date arithmetic shared by extraction and evaluation.
//!
//! Everything here is plain integer arithmetic on proleptic Gregorian dates, so
//! the evaluator never has to go through a fallible date constructor.

use chrono::Weekday;

use crate::model::WeekOfMonth;

pub const DAYS_PER_WEEK: u32 = 7;

const DAYS_IN_MONTH_NORMAL_YEAR: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Weekdays indexed by days from Monday.
const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Check if a year is a leap year.
pub fn is_leap_year(year: i32) -> bool {
    year % 400 == 0 || (year % 4 == 0 && year % 100 != 0)
}

/// Number of the last day of `month` (1-12) in `year`: 28, 29, 30 or 31.
pub fn last_day_of_month(year: i32, month: u32) -> u32 {
    let index = (month.clamp(1, 12) - 1) as usize;
    if month == 2 && is_leap_year(year) {
        29
    } else {
        DAYS_IN_MONTH_NORMAL_YEAR[index]
    }
}

/// Map a compact weekday index (Monday = 0 ... Sunday = 6) to a [`Weekday`].
pub fn weekday_from_index(index: u8) -> Option<Weekday> {
    WEEKDAYS.get(index as usize).copied()
}

/// Weekday of the given calendar date.
pub fn weekday_of(year: i32, month: u32, day: u32) -> Weekday {
    // 1970-01-01 was a Thursday (3 days from Monday).
    let index = (days_since_unix_epoch(year, month, day) + 3).rem_euclid(DAYS_PER_WEEK as i64);
    WEEKDAYS[index as usize]
}

/// Day of the month on which the `week`-th `weekday` of `month` falls.
///
/// For [`WeekOfMonth::Last`] the result is the last matching day, whatever the
/// month length; for the ordinals it is the first occurrence advanced by whole
/// weeks, which always stays within day 28.
pub fn nth_weekday_of_month(year: i32, month: u32, week: WeekOfMonth, weekday: Weekday) -> u32 {
    let target = weekday.num_days_from_monday();
    match week {
        WeekOfMonth::Last => {
            let last_day = last_day_of_month(year, month);
            let last_weekday = weekday_of(year, month, last_day).num_days_from_monday();
            last_day - (DAYS_PER_WEEK + last_weekday - target) % DAYS_PER_WEEK
        }
        _ => {
            let first_weekday = weekday_of(year, month, 1).num_days_from_monday();
            let first_occurrence = 1 + (DAYS_PER_WEEK + target - first_weekday) % DAYS_PER_WEEK;
            first_occurrence + (week.index() as u32 - 1) * DAYS_PER_WEEK
        }
    }
}

/// Ordinal occurrence (1-5) of the weekday that `day` falls on, counted from day 1.
pub fn ordinal_of_day(day: u32) -> u32 {
    (day - 1) / DAYS_PER_WEEK + 1
}

/// Whether `day` is the last occurrence of its weekday in `month`.
pub fn is_last_occurrence(year: i32, month: u32, day: u32) -> bool {
    day + DAYS_PER_WEEK > last_day_of_month(year, month)
}

/// Days elapsed since 1970-01-01 (negative before it).
pub(crate) fn days_since_unix_epoch(year: i32, month: u32, day: u32) -> i64 {
    let year = year as i64 - (month <= 2) as i64;
    let month = month as i64;
    let era = year.div_euclid(400);
    let year_of_era = year - era * 400;
    let month_index = if month > 2 { month - 3 } else { month + 9 };
    let day_of_year = (153 * month_index + 2) / 5 + day as i64 - 1;
    let day_of_era = year_of_era * 365 + year_of_era / 4 - year_of_era / 100 + day_of_year;
    era * 146_097 + day_of_era - 719_468
}
