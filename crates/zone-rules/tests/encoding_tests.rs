//! Tests for the compact encoding: tuples, the textual table and the Rust module.

use zone_rules::{
    decode_rule, encode_rule, parse_table, render_rust_module, render_table, Hemisphere,
    ZoneRegistry, ZoneRule, ZoneRuleError,
};

fn sample_registry() -> ZoneRegistry {
    [
        ("UTC", ZoneRule::fixed(0)),
        (
            "Australia/Adelaide",
            ZoneRule::from_compact((570, 630, true, Hemisphere::South, Some((10, 1, 6, 2)), Some((4, 1, 6, 3))))
                .unwrap(),
        ),
        ("Australia/Brisbane", ZoneRule::fixed(600)),
        (
            "Europe/London",
            ZoneRule::from_compact((0, 60, true, Hemisphere::North, Some((3, 5, 6, 1)), Some((10, 5, 6, 2))))
                .unwrap(),
        ),
    ]
    .into_iter()
    .map(|(id, rule)| (id.to_string(), rule))
    .collect()
}

// ---------------------------------------------------------------------------
// Single records
// ---------------------------------------------------------------------------

#[test]
fn encode_fixed_and_dst_records() {
    assert_eq!(encode_rule(&ZoneRule::fixed(600)), "(600, 600, false, none, -, -)");
    let registry = sample_registry();
    assert_eq!(
        encode_rule(registry.get("Australia/Adelaide").unwrap()),
        "(570, 630, true, south, (10, 1, 6, 2), (4, 1, 6, 3))"
    );
}

#[test]
fn decode_tolerates_whitespace() {
    let rule = decode_rule("  ( -300 ,-240,true , north,(3,2,6,2),  (11, 1, 6, 2) )  ").unwrap();
    assert_eq!(rule.std_offset_minutes(), -300);
    assert_eq!(rule.dst_offset_minutes(), -240);
    assert_eq!(rule.hemisphere(), Hemisphere::North);
    assert_eq!(rule.dst_end().unwrap().to_compact(), (11, 1, 6, 2));
}

#[test]
fn compact_tuple_round_trip() {
    let compact = (570, 630, true, Hemisphere::South, Some((10, 1, 6, 2)), Some((4, 1, 6, 3)));
    assert_eq!(ZoneRule::from_compact(compact).unwrap().to_compact(), compact);
}

#[test]
fn decode_rejects_contradicting_hemisphere() {
    // October -> April wraps the year, so "north" is inconsistent.
    let err = decode_rule("(570, 630, true, north, (10, 1, 6, 2), (4, 1, 6, 3))").unwrap_err();
    assert!(matches!(err, ZoneRuleError::TableParse { line: 1, .. }));
}

#[test]
fn decode_rejects_out_of_range_fields() {
    for text in [
        "(0, 60, true, north, (3, 6, 6, 2), (10, 5, 6, 3))",
        "(0, 60, true, north, (3, 5, 7, 2), (10, 5, 6, 3))",
        "(0, 60, true, north, (13, 5, 6, 2), (10, 5, 6, 3))",
        "(0, 60, true, north, (3, 5, 6, 24), (10, 5, 6, 3))",
        "(0, 60, true, north, (3, 5, 6, 2), -)",
        "(0, 60, false, none, -, -)",
        "(0, 0, maybe, none, -, -)",
        "(0, 0, false, none, -)",
    ] {
        assert!(decode_rule(text).is_err(), "{} should be rejected", text);
    }
}

// ---------------------------------------------------------------------------
// Textual table
// ---------------------------------------------------------------------------

#[test]
fn table_is_sorted_by_zone_id() {
    let table = render_table(&sample_registry());
    let ids: Vec<&str> = table
        .lines()
        .filter(|l| !l.starts_with('#'))
        .map(|l| l.split('"').nth(1).unwrap())
        .collect();
    assert_eq!(
        ids,
        vec!["Australia/Adelaide", "Australia/Brisbane", "Europe/London", "UTC"]
    );
}

#[test]
fn table_lines_match_expected_layout() {
    let table = render_table(&sample_registry());
    assert!(table.starts_with('#'));
    assert!(table.contains(
        "\"Australia/Adelaide\": (570, 630, true, south, (10, 1, 6, 2), (4, 1, 6, 3))\n"
    ));
    assert!(table.contains("\"UTC\": (0, 0, false, none, -, -)\n"));
}

#[test]
fn table_round_trips_and_is_stable() {
    let registry = sample_registry();
    let table = render_table(&registry);
    let parsed = parse_table(&table).unwrap();
    assert_eq!(parsed, registry);
    assert_eq!(render_table(&parsed), table);
}

#[test]
fn table_parse_errors_carry_line_numbers() {
    let text = "# header\n\"UTC\": (0, 0, false, none, -, -)\n\n\"Bad/Zone\" (0, 0, false, none, -, -)\n";
    let err = parse_table(text).unwrap_err();
    assert!(
        matches!(err, ZoneRuleError::TableParse { line: 4, .. }),
        "got {:?}",
        err
    );
}

#[test]
fn table_rejects_duplicate_zones() {
    let text = "\"UTC\": (0, 0, false, none, -, -)\n\"UTC\": (60, 60, false, none, -, -)\n";
    let err = parse_table(text).unwrap_err();
    assert!(matches!(err, ZoneRuleError::TableParse { line: 2, .. }));
}

#[test]
fn empty_table_is_an_empty_registry() {
    assert!(parse_table("# nothing here\n\n").unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Rust module and JSON
// ---------------------------------------------------------------------------

#[test]
fn rust_module_lists_compact_records() {
    let module = render_rust_module(&sample_registry());
    assert!(module.contains("pub static ZONES: &[(&str, CompactRule)] = &["));
    assert!(module.contains(
        "    (\"Australia/Adelaide\", (570, 630, true, Hemisphere::South, Some((10, 1, 6, 2)), Some((4, 1, 6, 3)))),"
    ));
    assert!(module.contains("    (\"UTC\", (0, 0, false, Hemisphere::None, None, None)),"));
    assert!(module.trim_end().ends_with("];"));
}

#[test]
fn json_round_trip_revalidates() {
    let registry = sample_registry();
    let json = registry.to_json().unwrap();
    assert!(json.contains("\"hemisphere\": \"south\""));
    assert_eq!(ZoneRegistry::from_json(&json).unwrap(), registry);

    let tampered = json.replacen("\"south\"", "\"north\"", 1);
    assert!(matches!(
        ZoneRegistry::from_json(&tampered),
        Err(ZoneRuleError::Json(_))
    ));
}
