//! Read-only mapping from zone identifier to [`ZoneRule`].
//!
//! A registry is built once, from extraction results, a generated table or a
//! generated `static` slice, and is never modified afterwards. A process-wide
//! registry fits in a `LazyLock`:
//!
//! ```rust
//! use std::sync::LazyLock;
//! use chrono::NaiveDate;
//! use zone_rules::{offset_and_dst_for, ZoneRegistry};
//!
//! static REGISTRY: LazyLock<ZoneRegistry> = LazyLock::new(|| {
//!     ZoneRegistry::from_table(r#""Australia/Adelaide": (570, 630, true, south, (10, 1, 6, 2), (4, 1, 6, 3))"#)
//!         .expect("embedded table is valid")
//! });
//!
//! let summer = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(12, 0, 0).unwrap();
//! assert_eq!(offset_and_dst_for(&REGISTRY, "Australia/Adelaide", summer).unwrap(), (630, true));
//! ```

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::encoding::{self, CompactRule};
use crate::error::{Result, ZoneRuleError};
use crate::evaluate;
use crate::model::ZoneRule;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneRegistry {
    zones: BTreeMap<String, ZoneRule>,
}

impl ZoneRegistry {
    /// Load a generated `static` slice of compact records.
    pub fn from_compact(entries: &[(&str, CompactRule)]) -> Result<Self> {
        entries
            .iter()
            .map(|(zone_id, compact)| -> Result<(String, ZoneRule)> {
                Ok((zone_id.to_string(), ZoneRule::from_compact(*compact)?))
            })
            .collect()
    }

    /// Load the textual table produced by [`ZoneRegistry::to_table`].
    pub fn from_table(text: &str) -> Result<Self> {
        encoding::parse_table(text)
    }

    pub fn to_table(&self) -> String {
        encoding::render_table(self)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn get(&self, zone_id: &str) -> Option<&ZoneRule> {
        self.zones.get(zone_id)
    }

    /// Like [`ZoneRegistry::get`], failing with `ZoneRuleError::UnknownZone`.
    pub fn lookup(&self, zone_id: &str) -> Result<&ZoneRule> {
        self.get(zone_id)
            .ok_or_else(|| ZoneRuleError::UnknownZone(zone_id.to_string()))
    }

    pub fn contains(&self, zone_id: &str) -> bool {
        self.zones.contains_key(zone_id)
    }

    /// Zone identifiers in sorted order.
    pub fn zone_ids(&self) -> impl Iterator<Item = &str> {
        self.zones.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ZoneRule)> {
        self.zones.iter().map(|(id, rule)| (id.as_str(), rule))
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

impl FromIterator<(String, ZoneRule)> for ZoneRegistry {
    fn from_iter<I: IntoIterator<Item = (String, ZoneRule)>>(iter: I) -> Self {
        Self {
            zones: iter.into_iter().collect(),
        }
    }
}

/// Offset and DST status of `local` in the registry's `zone_id`.
///
/// # Errors
/// `ZoneRuleError::UnknownZone` if the registry has no such zone.
pub fn offset_and_dst_for(
    registry: &ZoneRegistry,
    zone_id: &str,
    local: NaiveDateTime,
) -> Result<(i32, bool)> {
    let rule = registry.lookup(zone_id)?;
    Ok(evaluate::offset_and_dst(rule, local))
}
