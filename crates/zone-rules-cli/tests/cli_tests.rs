//! Integration tests for the `tzgen` CLI binary.
//!
//! These run the actual binary through `assert_cmd`. Extraction uses the
//! database compiled into the binary, with pinned sample years so the output
//! does not depend on the current date.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn tzgen() -> Command {
    let mut cmd = Command::cargo_bin("tzgen").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

/// `tzgen generate` with the horizon pinned to 2023..=2027.
fn generate() -> Command {
    let mut cmd = tzgen();
    cmd.args(["generate", "--from-year", "2023", "--to-year", "2027"]);
    cmd
}

const ADELAIDE_LINE: &str =
    "\"Australia/Adelaide\": (570, 630, true, south, (10, 1, 6, 2), (4, 1, 6, 3))";
const BERLIN_LINE: &str =
    "\"Europe/Berlin\": (60, 120, true, north, (3, 5, 6, 2), (10, 5, 6, 3))";
const UTC_LINE: &str = "\"UTC\": (0, 0, false, none, -, -)";

// ─────────────────────────────────────────────────────────────────────────────
// generate
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn generate_table_to_stdout_includes_utc() {
    generate()
        .arg("Australia/Adelaide")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("#"))
        .stdout(predicate::str::contains(ADELAIDE_LINE))
        .stdout(predicate::str::contains(UTC_LINE))
        .stderr(predicate::str::contains("Processing 2 timezone(s)"))
        .stderr(predicate::str::contains("  Australia/Adelaide: +9.5h (DST)"))
        .stderr(predicate::str::contains("  UTC: +0.0h (no DST)"));
}

#[test]
fn generate_from_config_file() {
    let output = generate()
        .args(["--config", &fixture("zones.txt")])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let zone_lines: Vec<&str> = stdout.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(
        zone_lines,
        vec![
            ADELAIDE_LINE,
            "\"Asia/Tokyo\": (540, 540, false, none, -, -)",
            BERLIN_LINE,
            UTC_LINE,
        ]
    );
}

#[test]
fn arguments_and_config_are_merged_without_duplicates() {
    generate()
        .args(["Europe/Berlin", "America/New_York", "--config", &fixture("zones.txt")])
        .assert()
        .success()
        .stderr(predicate::str::contains("Processing 5 timezone(s)"))
        .stdout(predicate::str::contains("\"America/New_York\": (-300, -240"));
}

#[test]
fn generate_is_byte_stable() {
    let first = generate().args(["Europe/Berlin", "Australia/Adelaide"]).output().unwrap();
    let second = generate().args(["Australia/Adelaide", "Europe/Berlin"]).output().unwrap();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn generate_rust_module() {
    generate()
        .args(["Australia/Adelaide", "--format", "rust"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pub static ZONES: &[(&str, CompactRule)] = &["))
        .stdout(predicate::str::contains(
            "(\"Australia/Adelaide\", (570, 630, true, Hemisphere::South, Some((10, 1, 6, 2)), Some((4, 1, 6, 3)))),",
        ))
        .stdout(predicate::str::contains(
            "(\"UTC\", (0, 0, false, Hemisphere::None, None, None)),",
        ));
}

#[test]
fn generate_json() {
    let output = generate()
        .args(["Europe/Berlin", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["Europe/Berlin"]["std_offset_minutes"], 60);
    assert_eq!(value["Europe/Berlin"]["hemisphere"], "north");
    assert_eq!(value["UTC"]["has_dst"], false);
}

#[test]
fn generate_to_output_file() {
    let dir = std::env::temp_dir().join(format!("tzgen-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("zones.tzr");

    generate()
        .args(["Europe/Berlin", "-o", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("with 2 timezone(s)"));

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains(BERLIN_LINE));
    assert!(written.contains(UTC_LINE));
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn unknown_zone_is_skipped_with_warning() {
    generate()
        .args(["Europe/Berlin", "Mars/Olympus_Mons"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Warning: skipping Mars/Olympus_Mons"))
        .stdout(predicate::str::contains(BERLIN_LINE))
        .stdout(predicate::str::contains("Mars").not());
}

#[test]
fn strict_mode_aborts_on_failure() {
    generate()
        .args(["--strict", "Europe/Berlin", "Mars/Olympus_Mons"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Mars/Olympus_Mons"))
        .stdout(predicate::str::is_empty());
}

#[test]
fn no_zones_is_an_error() {
    generate()
        .assert()
        .failure()
        .stderr(predicate::str::contains("No timezones specified"));
}

#[test]
fn missing_config_file_is_an_error() {
    generate()
        .args(["--config", &fixture("does-not-exist.txt")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn reversed_horizon_is_an_error() {
    tzgen()
        .args(["generate", "UTC", "--from-year", "2027", "--to-year", "2023"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--from-year 2027 is after --to-year 2023"));
}

#[test]
fn verbose_flag_enables_debug_logs() {
    generate()
        .args(["-v", "Europe/Berlin"])
        .assert()
        .success()
        .stderr(predicate::str::contains("DEBUG"));
}

// ─────────────────────────────────────────────────────────────────────────────
// list
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn list_groups_by_region() {
    tzgen()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Available timezones ("))
        .stdout(predicate::str::contains("Australia:\n"))
        .stdout(predicate::str::contains("  Australia/Adelaide\n"))
        .stdout(predicate::str::contains("Other:\n"))
        .stdout(predicate::str::contains("  UTC\n"));
}

#[test]
fn list_single_region() {
    tzgen()
        .args(["list", "Australia"])
        .assert()
        .success()
        .stdout(predicate::str::contains("  Australia/Adelaide"))
        .stdout(predicate::str::contains("Europe/Berlin").not());
}

#[test]
fn list_unknown_region() {
    tzgen()
        .args(["list", "Atlantis"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown region"));
}

// ─────────────────────────────────────────────────────────────────────────────
// query
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn query_against_table() {
    tzgen()
        .args(["query", "Australia/Adelaide", "2024-01-15T12:00", "--table", &fixture("rules.tzr")])
        .assert()
        .success()
        .stdout("Australia/Adelaide  UTC+10:30 (DST)\n");

    tzgen()
        .args(["query", "Europe/Berlin", "2024-01-15T12:00:00", "--table", &fixture("rules.tzr")])
        .assert()
        .success()
        .stdout("Europe/Berlin  UTC+1 (standard)\n");
}

#[test]
fn query_without_table_extracts_on_the_fly() {
    tzgen()
        .args(["query", "Australia/Adelaide", "2024-07-15T12:00"])
        .assert()
        .success()
        .stdout("Australia/Adelaide  UTC+9:30 (standard)\n");
}

#[test]
fn query_zone_missing_from_table() {
    tzgen()
        .args(["query", "Asia/Tokyo", "2024-01-15T12:00", "--table", &fixture("rules.tzr")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown timezone: Asia/Tokyo"));
}

#[test]
fn query_invalid_datetime() {
    tzgen()
        .args(["query", "UTC", "next tuesday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid local date-time"));
}

#[test]
fn query_reports_table_parse_errors_with_line() {
    tzgen()
        .args(["query", "UTC", "2024-01-15T12:00", "--table", &fixture("broken.tzr")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2"));
}

// ─────────────────────────────────────────────────────────────────────────────
// No subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn no_subcommand_shows_help() {
    tzgen()
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}
