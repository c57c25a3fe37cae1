//! Transition evaluation: UTC offset and DST status for a local wall-clock time.
//!
//! Rules are materialized for the calendar year of the query and compared
//! against it as a half-open window `[start, end)`. The comparison works on the
//! local value as given, so the skipped hour at DST start and the repeated
//! hour at DST end get no special treatment.

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::model::{Hemisphere, TransitionRule, ZoneRule};

/// A rule materialized for one year, as `(month, day, hour)` on the local clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Boundary {
    month: u32,
    day: u32,
    hour: u32,
}

impl Boundary {
    fn materialize(rule: &TransitionRule, year: i32) -> Self {
        Self {
            month: rule.month(),
            day: rule.day_in(year),
            hour: rule.hour(),
        }
    }

    /// Whether `local` is at or after this boundary. The boundary sits on
    /// `hour:00:00`, so minutes and seconds never decide the comparison.
    fn reached_by(&self, local: &NaiveDateTime) -> bool {
        let key = Self {
            month: local.month(),
            day: local.day(),
            hour: local.hour(),
        };
        key >= *self
    }
}

/// UTC offset in minutes and DST status that `rule` assigns to `local`.
pub fn offset_and_dst(rule: &ZoneRule, local: NaiveDateTime) -> (i32, bool) {
    if is_dst_active(rule, local) {
        (rule.dst_offset_minutes(), true)
    } else {
        (rule.std_offset_minutes(), false)
    }
}

/// Whether DST is in effect at `local` under `rule`.
pub fn is_dst_active(rule: &ZoneRule, local: NaiveDateTime) -> bool {
    let Some((start, end)) = rule.boundaries() else {
        return false;
    };

    let year = local.year();
    let start = Boundary::materialize(&start, year);
    let end = Boundary::materialize(&end, year);

    let after_start = start.reached_by(&local);
    let before_end = !end.reached_by(&local);

    match rule.hemisphere() {
        Hemisphere::South => after_start || before_end,
        Hemisphere::North => after_start && before_end,
        Hemisphere::None => false,
    }
}

/// Render an offset the way a `tzname` would: `UTC+9:30`, `UTC-5`, `UTC+0`.
pub fn format_utc_offset(offset_minutes: i32) -> String {
    let sign = if offset_minutes < 0 { '-' } else { '+' };
    let hours = offset_minutes.abs() / 60;
    let minutes = offset_minutes.abs() % 60;
    if minutes == 0 {
        format!("UTC{}{}", sign, hours)
    } else {
        format!("UTC{}{}:{:02}", sign, hours, minutes)
    }
}

impl ZoneRule {
    /// See [`offset_and_dst`].
    pub fn offset_and_dst(&self, local: NaiveDateTime) -> (i32, bool) {
        offset_and_dst(self, local)
    }

    /// See [`is_dst_active`].
    pub fn is_dst_active(&self, local: NaiveDateTime) -> bool {
        is_dst_active(self, local)
    }

    pub fn utc_offset_minutes(&self, local: NaiveDateTime) -> i32 {
        offset_and_dst(self, local).0
    }

    /// Amount DST adds at `local`: zero in standard time.
    pub fn dst_delta_minutes(&self, local: NaiveDateTime) -> i32 {
        match offset_and_dst(self, local) {
            (offset, true) => offset - self.std_offset_minutes(),
            (_, false) => 0,
        }
    }

    /// Offset name at `local`, e.g. `UTC+10:30`.
    pub fn utc_offset_name(&self, local: NaiveDateTime) -> String {
        format_utc_offset(self.utc_offset_minutes(local))
    }
}
