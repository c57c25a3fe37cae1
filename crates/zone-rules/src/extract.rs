//! Rule extraction: generalize observed DST transitions into a [`ZoneRule`].
//!
//! Each transition is stated on the local clock under the offset in effect
//! before it, then described as month, weekday, hour and the set of week
//! encodings that match its day. A boundary is accepted only if every sampled
//! year agrees, or if at least the two most recent consecutive years do; the
//! older samples are then dropped. Anything else is an irregular schedule.

use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use tracing::{debug, warn};

use crate::calendar;
use crate::error::{Result, ZoneRuleError};
use crate::model::{TransitionRule, WeekOfMonth, ZoneRule};
use crate::source::{OffsetTransition, TransitionSource};

/// Minimum number of agreeing years needed to trust a rule.
pub const MIN_STABLE_YEARS: usize = 2;

/// The default horizon: the three most recent full years, the current year
/// and one year ahead to catch announced rule changes.
pub fn default_sample_years(current_year: i32) -> RangeInclusive<i32> {
    (current_year - 3)..=(current_year + 1)
}

/// Extract the rule for `zone_id` from the transitions `source` reports over
/// `sample_years`.
///
/// # Errors
/// - `ZoneRuleError::UnknownZone` if the source does not know the zone.
/// - `ZoneRuleError::InsufficientHistory` if fewer than two years are sampled,
///   or a DST boundary was observed fewer than two times.
/// - `ZoneRuleError::IrregularSchedule` if the transitions do not follow one
///   stable `(month, week, weekday, hour)` rule.
pub fn extract<S: TransitionSource + ?Sized>(
    source: &S,
    zone_id: &str,
    sample_years: RangeInclusive<i32>,
) -> Result<ZoneRule> {
    let sampled = (*sample_years.end() as i64 - *sample_years.start() as i64 + 1).max(0) as usize;
    if sampled < MIN_STABLE_YEARS {
        return Err(ZoneRuleError::InsufficientHistory {
            zone: zone_id.to_string(),
            years: sampled,
        });
    }

    let last_year = *sample_years.end();
    let history = source.history(zone_id, sample_years)?;

    let Some(last) = history.transitions.last() else {
        debug!(
            zone = zone_id,
            offset = history.initial_offset_minutes,
            "no transitions in horizon"
        );
        return Ok(ZoneRule::fixed(history.initial_offset_minutes));
    };

    // A recurring boundary shows up in every sampled year, the last one
    // included. A quiet final year means DST was abandoned (or the offset
    // changed once) and the final offset holds from then on.
    let quiet_years = last_year - last.local_before().year();
    if quiet_years > 0 {
        let offset = history.final_offset_minutes();
        debug!(
            zone = zone_id,
            offset,
            quiet_years,
            "no transitions in recent years"
        );
        return Ok(ZoneRule::fixed(offset));
    }

    let (starts, ends): (Vec<&OffsetTransition>, Vec<&OffsetTransition>) =
        history.transitions.iter().partition(|t| t.is_forward());

    let start = generalize(zone_id, "start", &starts, last_year)?;
    let end = generalize(zone_id, "end", &ends, last_year)?;

    let std_offset = start.offset_before;
    let dst_offset = start.offset_after;
    if end.offset_before != dst_offset || end.offset_after != std_offset {
        return Err(irregular(
            zone_id,
            format!(
                "DST start moves {} -> {} but DST end moves {} -> {}",
                start.offset_before, start.offset_after, end.offset_before, end.offset_after
            ),
        ));
    }

    let rule = ZoneRule::with_dst(std_offset, dst_offset, start.rule, end.rule)
        .map_err(|e| irregular(zone_id, e.to_string()))?;

    debug!(
        zone = zone_id,
        std = std_offset,
        dst = dst_offset,
        hemisphere = %rule.hemisphere(),
        "extracted rule"
    );
    Ok(rule)
}

fn irregular(zone_id: &str, reason: String) -> ZoneRuleError {
    ZoneRuleError::IrregularSchedule {
        zone: zone_id.to_string(),
        reason,
    }
}

/// Set of [`WeekOfMonth`] encodings, one bit per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WeekSet(u8);

impl WeekSet {
    const EMPTY: Self = Self(0);

    fn insert(&mut self, week: WeekOfMonth) {
        self.0 |= 1 << (week.index() - 1);
    }

    fn contains(self, week: WeekOfMonth) -> bool {
        self.0 & (1 << (week.index() - 1)) != 0
    }

    fn intersect(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// `Last` wins whenever it fits: it stays correct when the month has a
    /// fifth occurrence in some future year.
    fn preferred(self) -> Option<WeekOfMonth> {
        if self.contains(WeekOfMonth::Last) {
            return Some(WeekOfMonth::Last);
        }
        (1..=4)
            .filter_map(WeekOfMonth::from_index)
            .find(|week| self.contains(*week))
    }
}

/// A transition described in rule terms.
#[derive(Debug, Clone, Copy)]
struct Observation {
    local: NaiveDateTime,
    year: i32,
    month: u32,
    weekday: Weekday,
    hour: u32,
    on_the_hour: bool,
    weeks: WeekSet,
    offset_before: i32,
    offset_after: i32,
}

impl Observation {
    fn new(transition: &OffsetTransition) -> Self {
        let local = transition.local_before();
        let (year, month, day) = (local.year(), local.month(), local.day());

        let mut weeks = WeekSet::EMPTY;
        let ordinal = calendar::ordinal_of_day(day);
        if ordinal <= 4 {
            if let Some(week) = WeekOfMonth::from_index(ordinal as u8) {
                weeks.insert(week);
            }
        }
        if calendar::is_last_occurrence(year, month, day) {
            weeks.insert(WeekOfMonth::Last);
        }

        Self {
            local,
            year,
            month,
            weekday: local.weekday(),
            hour: local.hour(),
            on_the_hour: local.minute() == 0 && local.second() == 0,
            weeks,
            offset_before: transition.offset_before_minutes,
            offset_after: transition.offset_after_minutes,
        }
    }

    /// Whether `self` describes the same boundary as `other`, ignoring weeks.
    fn same_shape(&self, other: &Self) -> bool {
        self.on_the_hour
            && self.month == other.month
            && self.weekday == other.weekday
            && self.hour == other.hour
            && self.offset_before == other.offset_before
            && self.offset_after == other.offset_after
    }
}

/// A validated DST boundary with the offsets it switches between.
struct Generalized {
    rule: TransitionRule,
    offset_before: i32,
    offset_after: i32,
}

fn generalize(
    zone_id: &str,
    kind: &str,
    samples: &[&OffsetTransition],
    last_year: i32,
) -> Result<Generalized> {
    if samples.len() < MIN_STABLE_YEARS {
        return Err(ZoneRuleError::InsufficientHistory {
            zone: zone_id.to_string(),
            years: samples.len(),
        });
    }

    let observations: Vec<Observation> = samples.iter().map(|t| Observation::new(t)).collect();
    let mut newest_first = observations.iter().rev();
    let Some(newest) = newest_first.next() else {
        return Err(ZoneRuleError::InsufficientHistory {
            zone: zone_id.to_string(),
            years: 0,
        });
    };
    if newest.year < last_year {
        return Err(irregular(
            zone_id,
            format!(
                "DST {} last observed in {}, not in the final sampled year {}",
                kind, newest.year, last_year
            ),
        ));
    }
    if !newest.on_the_hour {
        return Err(irregular(
            zone_id,
            format!("DST {} at {} is not on the hour", kind, newest.local),
        ));
    }

    let mut weeks = newest.weeks;
    let mut tail = 1;
    let mut tail_year = newest.year;
    let mut break_year = None;
    for older in newest_first {
        let joined = weeks.intersect(older.weeks);
        if older.year + 1 != tail_year || !older.same_shape(newest) || joined.is_empty() {
            break_year = Some(older.year);
            break;
        }
        weeks = joined;
        tail_year = older.year;
        tail += 1;
    }

    if let Some(break_year) = break_year {
        if tail < MIN_STABLE_YEARS {
            return Err(irregular(
                zone_id,
                format!(
                    "DST {} in {} does not match {} and no later rule is stable for {} years",
                    kind, break_year, newest.year, MIN_STABLE_YEARS
                ),
            ));
        }
        warn!(
            zone = zone_id,
            kind,
            discarded = observations.len() - tail,
            since = tail_year,
            "rule changed within the horizon; keeping the stable tail"
        );
    }

    let week = weeks
        .preferred()
        .ok_or_else(|| irregular(zone_id, format!("DST {} has no consistent week", kind)))?;
    let rule = TransitionRule::new(newest.month, week, newest.weekday, newest.hour)
        .map_err(|e| irregular(zone_id, e.to_string()))?;

    debug!(zone = zone_id, kind, rule = %rule, samples = tail, "generalized DST boundary");
    Ok(Generalized {
        rule,
        offset_before: newest.offset_before,
        offset_after: newest.offset_after,
    })
}
