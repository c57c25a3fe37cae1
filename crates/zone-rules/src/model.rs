//! Shared data model: transition rules and per-zone records.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::error::{Result, ZoneRuleError};

/// Which occurrence of a weekday within a month a rule refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WeekOfMonth {
    First,
    Second,
    Third,
    Fourth,
    /// The last occurrence, whether the month has four or five of that weekday.
    Last,
}

impl WeekOfMonth {
    /// Decode the compact index: 1-4 for the ordinals, 5 for "last".
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(Self::First),
            2 => Some(Self::Second),
            3 => Some(Self::Third),
            4 => Some(Self::Fourth),
            5 => Some(Self::Last),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
            Self::Third => 3,
            Self::Fourth => 4,
            Self::Last => 5,
        }
    }
}

/// Hemisphere of a zone's DST window, derived from its month ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hemisphere {
    /// DST starts and ends within one calendar year.
    North,
    /// DST wraps the December to January boundary.
    South,
    /// The zone observes no DST.
    None,
}

impl Hemisphere {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::South => "south",
            Self::None => "none",
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Hemisphere {
    type Err = ZoneRuleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "north" => Ok(Self::North),
            "south" => Ok(Self::South),
            "none" => Ok(Self::None),
            other => Err(ZoneRuleError::InvalidRule(format!(
                "unknown hemisphere '{}'",
                other
            ))),
        }
    }
}

/// One recurring DST boundary: the `week`-th `weekday` of `month` at `hour:00`
/// local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTransitionRule", into = "RawTransitionRule")]
pub struct TransitionRule {
    month: u8,
    week: WeekOfMonth,
    weekday: Weekday,
    hour: u8,
}

impl TransitionRule {
    /// Build a rule, rejecting a month outside 1-12 or an hour outside 0-23.
    pub fn new(month: u32, week: WeekOfMonth, weekday: Weekday, hour: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(ZoneRuleError::InvalidRule(format!(
                "month {} is outside 1-12",
                month
            )));
        }
        if hour > 23 {
            return Err(ZoneRuleError::InvalidRule(format!(
                "hour {} is outside 0-23",
                hour
            )));
        }
        Ok(Self {
            month: month as u8,
            week,
            weekday,
            hour: hour as u8,
        })
    }

    /// Decode the compact `(month, week, weekday, hour)` form, where week 5 means
    /// "last" and weekday 0 is Monday.
    pub fn from_compact((month, week, weekday, hour): (u8, u8, u8, u8)) -> Result<Self> {
        let week = WeekOfMonth::from_index(week).ok_or_else(|| {
            ZoneRuleError::InvalidRule(format!("week {} is outside 1-5", week))
        })?;
        let weekday = calendar::weekday_from_index(weekday).ok_or_else(|| {
            ZoneRuleError::InvalidRule(format!("weekday {} is outside 0-6", weekday))
        })?;
        Self::new(month as u32, week, weekday, hour as u32)
    }

    pub fn to_compact(&self) -> (u8, u8, u8, u8) {
        (
            self.month,
            self.week.index(),
            self.weekday_index(),
            self.hour,
        )
    }

    pub fn month(&self) -> u32 {
        self.month as u32
    }

    pub fn week(&self) -> WeekOfMonth {
        self.week
    }

    pub fn weekday(&self) -> Weekday {
        self.weekday
    }

    /// Weekday as days from Monday (Monday = 0 ... Sunday = 6).
    pub fn weekday_index(&self) -> u8 {
        self.weekday.num_days_from_monday() as u8
    }

    pub fn hour(&self) -> u32 {
        self.hour as u32
    }

    /// Day of the month this rule lands on in `year`.
    pub fn day_in(&self, year: i32) -> u32 {
        calendar::nth_weekday_of_month(year, self.month(), self.week, self.weekday)
    }

    /// Concrete date of this rule in `year`, `None` outside chrono's range.
    pub fn date_in(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month(), self.day_in(year))
    }

    /// Concrete local boundary (`hour:00:00`) of this rule in `year`.
    pub fn datetime_in(&self, year: i32) -> Option<NaiveDateTime> {
        self.date_in(year)?.and_hms_opt(self.hour(), 0, 0)
    }
}

impl fmt::Display for TransitionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (month, week, weekday, hour) = self.to_compact();
        write!(f, "({}, {}, {}, {})", month, week, weekday, hour)
    }
}

/// Serde shape of a [`TransitionRule`]: the four compact indices.
#[derive(Serialize, Deserialize)]
struct RawTransitionRule {
    month: u8,
    week: u8,
    weekday: u8,
    hour: u8,
}

impl TryFrom<RawTransitionRule> for TransitionRule {
    type Error = ZoneRuleError;

    fn try_from(raw: RawTransitionRule) -> Result<Self> {
        Self::from_compact((raw.month, raw.week, raw.weekday, raw.hour))
    }
}

impl From<TransitionRule> for RawTransitionRule {
    fn from(rule: TransitionRule) -> Self {
        let (month, week, weekday, hour) = rule.to_compact();
        Self {
            month,
            week,
            weekday,
            hour,
        }
    }
}

/// The pair of boundaries delimiting a zone's DST window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct DstSchedule {
    start: TransitionRule,
    end: TransitionRule,
}

/// Per-zone record: standard offset, DST offset and the DST schedule, if any.
///
/// Fields are private so every value upholds the invariants: a schedule has
/// two distinct boundaries in different months, and the hemisphere always
/// follows from their order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawZoneRule", into = "RawZoneRule")]
pub struct ZoneRule {
    std_offset_minutes: i32,
    dst_offset_minutes: i32,
    schedule: Option<DstSchedule>,
}

impl ZoneRule {
    /// A zone that observes no DST.
    pub fn fixed(offset_minutes: i32) -> Self {
        Self {
            std_offset_minutes: offset_minutes,
            dst_offset_minutes: offset_minutes,
            schedule: None,
        }
    }

    /// A zone with a recurring DST window from `start` to `end`.
    pub fn with_dst(
        std_offset_minutes: i32,
        dst_offset_minutes: i32,
        start: TransitionRule,
        end: TransitionRule,
    ) -> Result<Self> {
        if std_offset_minutes == dst_offset_minutes {
            return Err(ZoneRuleError::InvalidRule(format!(
                "DST offset equals standard offset ({} minutes)",
                std_offset_minutes
            )));
        }
        if start == end {
            return Err(ZoneRuleError::InvalidRule(format!(
                "DST start and end are the same boundary {}",
                start
            )));
        }
        if start.month == end.month {
            return Err(ZoneRuleError::InvalidRule(format!(
                "DST start {} and end {} share month {}",
                start, end, start.month
            )));
        }
        Ok(Self {
            std_offset_minutes,
            dst_offset_minutes,
            schedule: Some(DstSchedule { start, end }),
        })
    }

    pub fn std_offset_minutes(&self) -> i32 {
        self.std_offset_minutes
    }

    /// Offset while DST is active; equal to the standard offset without DST.
    pub fn dst_offset_minutes(&self) -> i32 {
        self.dst_offset_minutes
    }

    pub fn has_dst(&self) -> bool {
        self.schedule.is_some()
    }

    pub fn dst_start(&self) -> Option<TransitionRule> {
        self.schedule.map(|s| s.start)
    }

    pub fn dst_end(&self) -> Option<TransitionRule> {
        self.schedule.map(|s| s.end)
    }

    pub fn hemisphere(&self) -> Hemisphere {
        match self.schedule {
            None => Hemisphere::None,
            Some(s) if s.start.month < s.end.month => Hemisphere::North,
            Some(_) => Hemisphere::South,
        }
    }

    pub(crate) fn boundaries(&self) -> Option<(TransitionRule, TransitionRule)> {
        self.schedule.map(|s| (s.start, s.end))
    }
}

/// Flat serde shape of a [`ZoneRule`], mirroring the compact tuple's fields.
#[derive(Serialize, Deserialize)]
struct RawZoneRule {
    std_offset_minutes: i32,
    dst_offset_minutes: i32,
    has_dst: bool,
    hemisphere: Hemisphere,
    dst_start: Option<TransitionRule>,
    dst_end: Option<TransitionRule>,
}

impl TryFrom<RawZoneRule> for ZoneRule {
    type Error = ZoneRuleError;

    fn try_from(raw: RawZoneRule) -> Result<Self> {
        Self::from_parts(
            raw.std_offset_minutes,
            raw.dst_offset_minutes,
            raw.has_dst,
            raw.hemisphere,
            raw.dst_start,
            raw.dst_end,
        )
    }
}

impl From<ZoneRule> for RawZoneRule {
    fn from(rule: ZoneRule) -> Self {
        Self {
            std_offset_minutes: rule.std_offset_minutes,
            dst_offset_minutes: rule.dst_offset_minutes,
            has_dst: rule.has_dst(),
            hemisphere: rule.hemisphere(),
            dst_start: rule.dst_start(),
            dst_end: rule.dst_end(),
        }
    }
}

impl ZoneRule {
    /// Rebuild a rule from all six record fields, checking that the redundant
    /// ones (`has_dst`, `hemisphere`) agree with the rest.
    pub(crate) fn from_parts(
        std_offset_minutes: i32,
        dst_offset_minutes: i32,
        has_dst: bool,
        hemisphere: Hemisphere,
        dst_start: Option<TransitionRule>,
        dst_end: Option<TransitionRule>,
    ) -> Result<Self> {
        let rule = match (has_dst, dst_start, dst_end) {
            (false, None, None) => {
                if dst_offset_minutes != std_offset_minutes {
                    return Err(ZoneRuleError::InvalidRule(format!(
                        "zone without DST has distinct offsets {} and {}",
                        std_offset_minutes, dst_offset_minutes
                    )));
                }
                Self::fixed(std_offset_minutes)
            }
            (true, Some(start), Some(end)) => {
                Self::with_dst(std_offset_minutes, dst_offset_minutes, start, end)?
            }
            (true, _, _) => {
                return Err(ZoneRuleError::InvalidRule(
                    "zone with DST needs both a start and an end rule".to_string(),
                ))
            }
            (false, _, _) => {
                return Err(ZoneRuleError::InvalidRule(
                    "zone without DST cannot carry transition rules".to_string(),
                ))
            }
        };

        if rule.hemisphere() != hemisphere {
            return Err(ZoneRuleError::InvalidRule(format!(
                "hemisphere '{}' contradicts the DST months (expected '{}')",
                hemisphere,
                rule.hemisphere()
            )));
        }
        Ok(rule)
    }
}
