//! Sources of historical UTC-offset transitions.
//!
//! The extraction engine only sees the [`TransitionSource`] trait. The
//! [`ChronoTzSource`] implementation reads the IANA database compiled into
//! `chrono-tz`; [`MemorySource`] serves histories held in memory.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::trace;

use crate::error::{Result, ZoneRuleError};

const SECONDS_PER_DAY: i64 = 86_400;

/// One change of UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetTransition {
    /// The instant the new offset takes effect.
    pub utc: DateTime<Utc>,
    pub offset_before_minutes: i32,
    pub offset_after_minutes: i32,
}

impl OffsetTransition {
    pub fn new(utc: DateTime<Utc>, offset_before_minutes: i32, offset_after_minutes: i32) -> Self {
        Self {
            utc,
            offset_before_minutes,
            offset_after_minutes,
        }
    }

    /// Build a transition from the local wall-clock time it is announced in,
    /// which is the time under the offset in effect before it.
    pub fn from_local(
        local_before: NaiveDateTime,
        offset_before_minutes: i32,
        offset_after_minutes: i32,
    ) -> Self {
        let utc = (local_before - Duration::minutes(offset_before_minutes as i64)).and_utc();
        Self::new(utc, offset_before_minutes, offset_after_minutes)
    }

    /// Wall-clock time of the transition under the pre-transition offset.
    pub fn local_before(&self) -> NaiveDateTime {
        self.utc.naive_utc() + Duration::minutes(self.offset_before_minutes as i64)
    }

    /// True when the clocks move forward (into a larger offset).
    pub fn is_forward(&self) -> bool {
        self.offset_after_minutes > self.offset_before_minutes
    }
}

/// Transitions of one zone within a sampled horizon.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ZoneHistory {
    /// Offset in effect at the start of the horizon.
    pub initial_offset_minutes: i32,
    /// Chronological transitions inside the horizon.
    pub transitions: Vec<OffsetTransition>,
}

impl ZoneHistory {
    pub fn fixed(offset_minutes: i32) -> Self {
        Self {
            initial_offset_minutes: offset_minutes,
            transitions: Vec::new(),
        }
    }

    /// Offset in effect at the end of the horizon.
    pub fn final_offset_minutes(&self) -> i32 {
        self.transitions
            .last()
            .map(|t| t.offset_after_minutes)
            .unwrap_or(self.initial_offset_minutes)
    }
}

/// Access to real transition data, keyed by zone identifier.
pub trait TransitionSource {
    /// Transitions of `zone_id` from the start of the first year in `years`
    /// up to the end of the last one, both in UTC.
    ///
    /// # Errors
    /// `ZoneRuleError::UnknownZone` when the identifier is not known.
    fn history(&self, zone_id: &str, years: RangeInclusive<i32>) -> Result<ZoneHistory>;
}

impl<S: TransitionSource + ?Sized> TransitionSource for &S {
    fn history(&self, zone_id: &str, years: RangeInclusive<i32>) -> Result<ZoneHistory> {
        (**self).history(zone_id, years)
    }
}

/// UTC bounds `[start, end)` of a sampled horizon.
pub(crate) fn horizon_bounds(years: &RangeInclusive<i32>) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    if years.is_empty() {
        return Err(ZoneRuleError::InvalidHorizon(format!(
            "{}..={} is empty",
            years.start(),
            years.end()
        )));
    }
    let year_start = |year: i32| {
        NaiveDate::from_ymd_opt(year, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
            .ok_or_else(|| ZoneRuleError::InvalidHorizon(format!("year {} is out of range", year)))
    };
    let end_year = years.end().checked_add(1).ok_or_else(|| {
        ZoneRuleError::InvalidHorizon(format!("year {} is out of range", years.end()))
    })?;
    Ok((year_start(*years.start())?, year_start(end_year)?))
}

/// Transition source backed by the IANA database compiled into `chrono-tz`.
///
/// `chrono-tz` answers offset queries but does not list transitions, so the
/// horizon is sampled once per day and every change is bisected down to the
/// second. Two transitions less than a day apart would be missed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChronoTzSource;

impl ChronoTzSource {
    /// Every zone identifier in the compiled database, in database order.
    pub fn zone_ids(&self) -> impl Iterator<Item = &'static str> {
        chrono_tz::TZ_VARIANTS.iter().map(|tz| tz.name())
    }

    fn lookup(&self, zone_id: &str) -> Result<Tz> {
        zone_id
            .parse::<Tz>()
            .map_err(|_| ZoneRuleError::UnknownZone(zone_id.to_string()))
    }
}

/// UTC offset of `tz` at the Unix timestamp `seconds`, in minutes.
fn offset_at(tz: &Tz, seconds: i64) -> Result<i32> {
    let utc = DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
        ZoneRuleError::InvalidHorizon(format!("timestamp {} is out of range", seconds))
    })?;
    let offset = tz.offset_from_utc_datetime(&utc.naive_utc()).fix();
    Ok(offset.local_minus_utc() / 60)
}

impl TransitionSource for ChronoTzSource {
    fn history(&self, zone_id: &str, years: RangeInclusive<i32>) -> Result<ZoneHistory> {
        let tz = self.lookup(zone_id)?;
        let (start, end) = horizon_bounds(&years)?;
        let (start, end) = (start.timestamp(), end.timestamp());

        let initial_offset_minutes = offset_at(&tz, start)?;
        let mut transitions = Vec::new();
        let mut current = initial_offset_minutes;
        let mut day_start = start;

        while day_start < end {
            let day_end = (day_start + SECONDS_PER_DAY).min(end);
            let next = offset_at(&tz, day_end)?;

            if next != current {
                // offset(lo) == current, offset(hi) != current
                let (mut lo, mut hi) = (day_start, day_end);
                while hi - lo > 1 {
                    let mid = lo + (hi - lo) / 2;
                    if offset_at(&tz, mid)? == current {
                        lo = mid;
                    } else {
                        hi = mid;
                    }
                }
                let after = offset_at(&tz, hi)?;
                let utc = DateTime::from_timestamp(hi, 0).ok_or_else(|| {
                    ZoneRuleError::InvalidHorizon(format!("timestamp {} is out of range", hi))
                })?;
                let transition = OffsetTransition::new(utc, current, after);
                trace!(
                    zone = zone_id,
                    utc = %transition.utc,
                    before = current,
                    after,
                    "offset transition"
                );
                transitions.push(transition);
                current = after;
            }
            day_start = day_end;
        }

        Ok(ZoneHistory {
            initial_offset_minutes,
            transitions,
        })
    }
}

/// Transition source serving histories held in memory.
///
/// Each zone is stored as its full known history; `history` windows it to the
/// requested horizon.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    zones: BTreeMap<String, ZoneHistory>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a zone's full history.
    pub fn with_zone(mut self, zone_id: impl Into<String>, history: ZoneHistory) -> Self {
        self.zones.insert(zone_id.into(), history);
        self
    }
}

impl TransitionSource for MemorySource {
    fn history(&self, zone_id: &str, years: RangeInclusive<i32>) -> Result<ZoneHistory> {
        let full = self
            .zones
            .get(zone_id)
            .ok_or_else(|| ZoneRuleError::UnknownZone(zone_id.to_string()))?;
        let (start, end) = horizon_bounds(&years)?;

        let initial_offset_minutes = full
            .transitions
            .iter()
            .take_while(|t| t.utc <= start)
            .last()
            .map(|t| t.offset_after_minutes)
            .unwrap_or(full.initial_offset_minutes);

        let transitions = full
            .transitions
            .iter()
            .filter(|t| t.utc > start && t.utc < end)
            .copied()
            .collect();

        Ok(ZoneHistory {
            initial_offset_minutes,
            transitions,
        })
    }
}
