//! # zone-rules
//!
//! Compact DST rules for memory-constrained runtimes.
//!
//! At build time the Rule Extraction Engine reads real UTC-offset transitions
//! (from the IANA database compiled into `chrono-tz`, or any other
//! [`TransitionSource`]) and generalizes them into one
//! `(month, week, weekday, hour)` rule per DST boundary, validated across
//! several sampled years. At run time the Transition Evaluation Engine turns
//! such a rule back into concrete dates for any year and answers "what is the
//! UTC offset, and is DST active" for a local wall-clock time.
//!
//! ## Quick start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use zone_rules::{extract, ChronoTzSource};
//!
//! let rule = extract(&ChronoTzSource, "Australia/Adelaide", 2023..=2027).unwrap();
//! let january = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap().and_hms_opt(12, 0, 0).unwrap();
//! assert_eq!(rule.offset_and_dst(january), (630, true));
//! assert_eq!(zone_rules::encode_rule(&rule), "(570, 630, true, south, (10, 1, 6, 2), (4, 1, 6, 3))");
//! ```
//!
//! ## Modules
//!
//! - [`model`]: `TransitionRule`, `ZoneRule`, `Hemisphere`, `WeekOfMonth`
//! - [`calendar`]: nth-weekday-of-month and month-length arithmetic
//! - [`extract`]: transitions → validated `ZoneRule`
//! - [`evaluate`]: `ZoneRule` + local time → `(offset, is_dst)`
//! - [`encoding`]: compact tuple, textual table and Rust module renderings
//! - [`registry`]: read-only zone id → rule mapping
//! - [`source`]: `TransitionSource` trait, `chrono-tz` and in-memory sources
//! - [`error`]: Error types

pub mod calendar;
pub mod encoding;
pub mod error;
pub mod evaluate;
pub mod extract;
pub mod model;
pub mod registry;
pub mod source;

pub use encoding::{
    decode_rule, encode_rule, parse_table, render_rust_module, render_table, CompactRule,
    CompactTransition,
};
pub use error::ZoneRuleError;
pub use evaluate::{format_utc_offset, is_dst_active, offset_and_dst};
pub use extract::{default_sample_years, extract};
pub use model::{Hemisphere, TransitionRule, WeekOfMonth, ZoneRule};
pub use registry::{offset_and_dst_for, ZoneRegistry};
pub use source::{ChronoTzSource, MemorySource, OffsetTransition, TransitionSource, ZoneHistory};
