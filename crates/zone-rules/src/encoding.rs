//! Compact encoding of zone rules.
//!
//! A rule is a fixed-arity record
//! `(std_offset_minutes, dst_offset_minutes, has_dst, hemisphere, dst_start, dst_end)`
//! where each transition is `(month, week, weekday, hour)` or absent. Three
//! renderings share that shape:
//!
//! - the textual table, one `"Zone/Id": (...)` line per zone, `-` marking an
//!   absent transition;
//! - a generated Rust module holding a `static` slice of [`CompactRule`]s;
//! - JSON, through the serde implementations on the model types.
//!
//! Zones are always written in identifier order so regenerating an unchanged
//! set of zones yields byte-identical output.

use crate::error::{Result, ZoneRuleError};
use crate::model::{Hemisphere, TransitionRule, ZoneRule};
use crate::registry::ZoneRegistry;

/// `(month, week, weekday, hour)`; week 5 is "last", weekday 0 is Monday.
pub type CompactTransition = (u8, u8, u8, u8);

/// `(std_offset_minutes, dst_offset_minutes, has_dst, hemisphere, dst_start, dst_end)`.
pub type CompactRule = (
    i32,
    i32,
    bool,
    Hemisphere,
    Option<CompactTransition>,
    Option<CompactTransition>,
);

const ABSENT: &str = "-";

const FIELD_LEGEND: &str = "(std_offset_minutes, dst_offset_minutes, has_dst, hemisphere, dst_start, dst_end)";
const TRANSITION_LEGEND: &str =
    "dst_start/dst_end: (month, week, weekday, hour); week 1-4 or 5 = last, weekday 0 = Mon ... 6 = Sun";

impl ZoneRule {
    pub fn to_compact(&self) -> CompactRule {
        (
            self.std_offset_minutes(),
            self.dst_offset_minutes(),
            self.has_dst(),
            self.hemisphere(),
            self.dst_start().map(|r| r.to_compact()),
            self.dst_end().map(|r| r.to_compact()),
        )
    }

    /// Rebuild a rule from its compact record, validating every field.
    pub fn from_compact(compact: CompactRule) -> Result<Self> {
        let (std_offset, dst_offset, has_dst, hemisphere, start, end) = compact;
        Self::from_parts(
            std_offset,
            dst_offset,
            has_dst,
            hemisphere,
            start.map(TransitionRule::from_compact).transpose()?,
            end.map(TransitionRule::from_compact).transpose()?,
        )
    }
}

/// Encode one rule as its textual tuple, e.g.
/// `(570, 630, true, south, (10, 1, 6, 2), (4, 1, 6, 3))`.
pub fn encode_rule(rule: &ZoneRule) -> String {
    let transition = |t: Option<TransitionRule>| match t {
        Some(t) => t.to_string(),
        None => ABSENT.to_string(),
    };
    format!(
        "({}, {}, {}, {}, {}, {})",
        rule.std_offset_minutes(),
        rule.dst_offset_minutes(),
        rule.has_dst(),
        rule.hemisphere(),
        transition(rule.dst_start()),
        transition(rule.dst_end())
    )
}

/// Decode a textual tuple produced by [`encode_rule`].
pub fn decode_rule(text: &str) -> Result<ZoneRule> {
    parse_rule(text.trim(), 1)
}

/// Render a registry as the textual table.
pub fn render_table(registry: &ZoneRegistry) -> String {
    let mut out = String::new();
    out.push_str("# zone-rules table, generated from the IANA tz database. Do not edit.\n");
    out.push_str(&format!("# {}\n", FIELD_LEGEND));
    out.push_str(&format!("# {}\n", TRANSITION_LEGEND));
    for (zone_id, rule) in registry.iter() {
        out.push_str(&format!("\"{}\": {}\n", zone_id, encode_rule(rule)));
    }
    out
}

/// Parse the textual table. Blank lines and `#` comments are ignored.
///
/// # Errors
/// `ZoneRuleError::TableParse` with the 1-based line number of the first
/// malformed line, invalid rule or duplicate zone identifier.
pub fn parse_table(text: &str) -> Result<ZoneRegistry> {
    let mut entries: Vec<(String, ZoneRule)> = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (zone_id, rest) = parse_zone_id(trimmed, line)?;
        let rest = rest
            .trim_start()
            .strip_prefix(':')
            .ok_or_else(|| parse_error(line, format!("expected ':' after \"{}\"", zone_id)))?;
        let rule = parse_rule(rest.trim(), line)?;

        if entries.iter().any(|(id, _)| id == zone_id) {
            return Err(parse_error(line, format!("duplicate zone \"{}\"", zone_id)));
        }
        entries.push((zone_id.to_string(), rule));
    }

    Ok(entries.into_iter().collect())
}

/// Render a registry as a Rust module exposing `pub static ZONES`, to be
/// loaded with [`ZoneRegistry::from_compact`].
pub fn render_rust_module(registry: &ZoneRegistry) -> String {
    let mut out = String::new();
    out.push_str("// Generated by tzgen from the IANA tz database. Do not edit.\n");
    out.push_str(&format!("// {}\n", FIELD_LEGEND));
    out.push_str(&format!("// {}\n", TRANSITION_LEGEND));
    out.push('\n');
    out.push_str("use zone_rules::{CompactRule, Hemisphere};\n\n");
    out.push_str("pub static ZONES: &[(&str, CompactRule)] = &[\n");
    for (zone_id, rule) in registry.iter() {
        let (std_offset, dst_offset, has_dst, hemisphere, start, end) = rule.to_compact();
        let hemisphere = match hemisphere {
            Hemisphere::North => "Hemisphere::North",
            Hemisphere::South => "Hemisphere::South",
            Hemisphere::None => "Hemisphere::None",
        };
        out.push_str(&format!(
            "    ({:?}, ({}, {}, {}, {}, {}, {})),\n",
            zone_id,
            std_offset,
            dst_offset,
            has_dst,
            hemisphere,
            rust_transition(start),
            rust_transition(end)
        ));
    }
    out.push_str("];\n");
    out
}

fn rust_transition(transition: Option<CompactTransition>) -> String {
    match transition {
        Some((month, week, weekday, hour)) => {
            format!("Some(({}, {}, {}, {}))", month, week, weekday, hour)
        }
        None => "None".to_string(),
    }
}

fn parse_error(line: usize, message: String) -> ZoneRuleError {
    ZoneRuleError::TableParse { line, message }
}

/// Split a leading `"Zone/Id"` off `text`.
fn parse_zone_id(text: &str, line: usize) -> Result<(&str, &str)> {
    let inner = text
        .strip_prefix('"')
        .ok_or_else(|| parse_error(line, "expected a quoted zone identifier".to_string()))?;
    let close = inner
        .find('"')
        .ok_or_else(|| parse_error(line, "unterminated zone identifier".to_string()))?;
    let zone_id = &inner[..close];
    if zone_id.is_empty() {
        return Err(parse_error(line, "empty zone identifier".to_string()));
    }
    Ok((zone_id, &inner[close + 1..]))
}

/// Contents of a `( ... )` group, split on the commas at its own depth.
fn split_tuple(text: &str, line: usize) -> Result<Vec<&str>> {
    let inner = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .ok_or_else(|| parse_error(line, format!("expected a parenthesized tuple, got '{}'", text)))?;

    let mut fields = Vec::new();
    let mut depth = 0usize;
    let mut field_start = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| parse_error(line, "unbalanced ')'".to_string()))?;
            }
            ',' if depth == 0 => {
                fields.push(inner[field_start..i].trim());
                field_start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(parse_error(line, "unbalanced '('".to_string()));
    }
    fields.push(inner[field_start..].trim());
    Ok(fields)
}

fn parse_int<T: std::str::FromStr>(field: &str, name: &str, line: usize) -> Result<T> {
    field
        .parse()
        .map_err(|_| parse_error(line, format!("invalid {} '{}'", name, field)))
}

fn parse_transition(field: &str, name: &str, line: usize) -> Result<Option<TransitionRule>> {
    if field == ABSENT {
        return Ok(None);
    }
    let parts = split_tuple(field, line)?;
    let [month, week, weekday, hour] = parts.as_slice() else {
        return Err(parse_error(
            line,
            format!("{} needs 4 fields, got {}", name, parts.len()),
        ));
    };
    let compact = (
        parse_int(month, "month", line)?,
        parse_int(week, "week", line)?,
        parse_int(weekday, "weekday", line)?,
        parse_int(hour, "hour", line)?,
    );
    TransitionRule::from_compact(compact)
        .map(Some)
        .map_err(|e| parse_error(line, format!("{}: {}", name, e)))
}

fn parse_rule(text: &str, line: usize) -> Result<ZoneRule> {
    let fields = split_tuple(text, line)?;
    let [std_offset, dst_offset, has_dst, hemisphere, start, end] = fields.as_slice() else {
        return Err(parse_error(
            line,
            format!("zone record needs 6 fields, got {}", fields.len()),
        ));
    };

    let has_dst = match *has_dst {
        "true" => true,
        "false" => false,
        other => return Err(parse_error(line, format!("invalid has_dst '{}'", other))),
    };
    let hemisphere: Hemisphere = hemisphere
        .parse()
        .map_err(|e: ZoneRuleError| parse_error(line, e.to_string()))?;

    ZoneRule::from_parts(
        parse_int(std_offset, "std_offset_minutes", line)?,
        parse_int(dst_offset, "dst_offset_minutes", line)?,
        has_dst,
        hemisphere,
        parse_transition(start, "dst_start", line)?,
        parse_transition(end, "dst_end", line)?,
    )
    .map_err(|e| parse_error(line, e.to_string()))
}
