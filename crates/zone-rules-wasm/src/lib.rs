//! WASM bindings for zone-rules.
//!
//! Exposes rule evaluation to JavaScript via `wasm-bindgen`. Rules and results
//! cross the boundary as JSON strings; local times as `YYYY-MM-DDTHH:MM[:SS]`.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p zone-rules-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir pkg/ \
//!   target/wasm32-unknown-unknown/release/zone_rules_wasm.wasm
//! ```

use chrono::NaiveDateTime;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use zone_rules::{ZoneRegistry, ZoneRule};

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, PartialEq)]
struct OffsetDto {
    offset_minutes: i32,
    is_dst: bool,
    /// e.g. "UTC+10:30"
    name: String,
}

impl OffsetDto {
    fn evaluate(rule: &ZoneRule, local: NaiveDateTime) -> Self {
        let (offset_minutes, is_dst) = rule.offset_and_dst(local);
        Self {
            offset_minutes,
            is_dst,
            name: zone_rules::format_utc_offset(offset_minutes),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
//
// These return `String` errors so they can be exercised off-wasm; the exports
// convert at the boundary.
// ---------------------------------------------------------------------------

fn parse_local(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .map_err(|e| format!("Invalid local datetime '{}': {}", s, e))
}

fn to_json(dto: &OffsetDto) -> Result<String, String> {
    serde_json::to_string(dto).map_err(|e| format!("Serialization error: {}", e))
}

fn evaluate_in(registry: &ZoneRegistry, zone: &str, local: &str) -> Result<String, String> {
    let rule = registry.lookup(zone).map_err(|e| e.to_string())?;
    to_json(&OffsetDto::evaluate(rule, parse_local(local)?))
}

fn evaluate_rule_json(rule_json: &str, local: &str) -> Result<String, String> {
    let rule: ZoneRule =
        serde_json::from_str(rule_json).map_err(|e| format!("Invalid rule JSON: {}", e))?;
    to_json(&OffsetDto::evaluate(&rule, parse_local(local)?))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// A read-only set of zone rules loaded from a generated table.
#[wasm_bindgen]
pub struct ZoneTable {
    registry: ZoneRegistry,
}

#[wasm_bindgen]
impl ZoneTable {
    /// Load the textual table written by `tzgen generate`.
    #[wasm_bindgen(js_name = "fromTable")]
    pub fn from_table(text: &str) -> Result<ZoneTable, JsValue> {
        ZoneRegistry::from_table(text)
            .map(|registry| ZoneTable { registry })
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Load the JSON written by `tzgen generate --format json`.
    #[wasm_bindgen(js_name = "fromJson")]
    pub fn from_json(json: &str) -> Result<ZoneTable, JsValue> {
        ZoneRegistry::from_json(json)
            .map(|registry| ZoneTable { registry })
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Offset and DST status of a local wall-clock time.
    ///
    /// Returns a JSON string `{offset_minutes, is_dst, name}`.
    #[wasm_bindgen(js_name = "offsetAndDst")]
    pub fn offset_and_dst(&self, zone: &str, local: &str) -> Result<String, JsValue> {
        evaluate_in(&self.registry, zone, local).map_err(|e| JsValue::from_str(&e))
    }

    /// Sorted zone identifiers as a JSON array string.
    #[wasm_bindgen(js_name = "zoneIds")]
    pub fn zone_ids(&self) -> Result<String, JsValue> {
        let ids: Vec<&str> = self.registry.zone_ids().collect();
        serde_json::to_string(&ids)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    #[wasm_bindgen(getter)]
    pub fn size(&self) -> usize {
        self.registry.len()
    }
}

/// Evaluate a single rule given as JSON (one value of `tzgen generate --format json`).
///
/// Returns a JSON string `{offset_minutes, is_dst, name}`.
#[wasm_bindgen(js_name = "ruleOffsetAndDst")]
pub fn rule_offset_and_dst(rule_json: &str, local: &str) -> Result<String, JsValue> {
    evaluate_rule_json(rule_json, local).map_err(|e| JsValue::from_str(&e))
}
