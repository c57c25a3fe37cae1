//! `tzgen` CLI: generate compact DST rule tables from the IANA tz database.
//!
//! ## Usage
//!
//! ```sh
//! # Rules for a few zones (UTC is always included), table on stdout
//! tzgen generate Australia/Adelaide Europe/Berlin
//!
//! # Zones from a config file, Rust module written to a file
//! tzgen generate -c zones.txt --format rust -o src/zones.rs
//!
//! # Abort on the first zone whose schedule cannot be expressed
//! tzgen generate --strict America/Sao_Paulo
//!
//! # Browse the database
//! tzgen list Australia
//!
//! # Evaluate a local wall-clock time against a generated table
//! tzgen query Australia/Adelaide 2024-01-15T12:00 --table zones.tzr
//! ```

mod tracer;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zone_rules::{ChronoTzSource, ZoneRegistry, ZoneRule};

/// Always present in generated tables.
const ALWAYS_INCLUDED: &str = "UTC";

#[derive(Parser)]
#[command(
    name = "tzgen",
    version,
    about = "Extract compact DST rules from the IANA tz database"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Print debug logs to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract rules for the selected zones and write a rule table
    Generate {
        /// Zone identifiers, e.g. Australia/Adelaide
        zones: Vec<String>,
        /// File with one zone identifier per line (`#` starts a comment)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Artifact format
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
        /// First sampled year (defaults to three years before the current one)
        #[arg(long)]
        from_year: Option<i32>,
        /// Last sampled year (defaults to the year after the current one)
        #[arg(long)]
        to_year: Option<i32>,
        /// Fail instead of skipping zones that cannot be extracted
        #[arg(long)]
        strict: bool,
    },
    /// List the zones known to the database, grouped by region
    List {
        /// Only show this region, e.g. Europe
        region: Option<String>,
    },
    /// Show the UTC offset and DST status of a local date-time
    Query {
        /// Zone identifier
        zone: String,
        /// Local wall-clock time, YYYY-MM-DDTHH:MM[:SS]
        datetime: String,
        /// Generated rule table to evaluate against (extracts on the fly if omitted)
        #[arg(short, long)]
        table: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Line-oriented text table
    Table,
    /// Rust source exposing `pub static ZONES`
    Rust,
    /// JSON object keyed by zone identifier
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracer::StderrTracer::register(cli.verbose).context("Failed to install logger")?;

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            Cli::parse_from(["tzgen", "--help"]);
            unreachable!();
        }
    };

    match command {
        Commands::Generate {
            zones,
            config,
            output,
            format,
            from_year,
            to_year,
            strict,
        } => generate(
            &zones,
            config.as_deref(),
            output.as_deref(),
            format,
            sample_years(from_year, to_year)?,
            strict,
        )?,
        Commands::List { region } => list(region.as_deref())?,
        Commands::Query {
            zone,
            datetime,
            table,
        } => {
            let local = parse_local(&datetime)?;
            let rule = match table {
                Some(path) => {
                    let text = read_file(&path)?;
                    let registry = ZoneRegistry::from_table(&text)
                        .with_context(|| format!("Failed to parse table: {}", path.display()))?;
                    *registry.lookup(&zone)?
                }
                None => zone_rules::extract(&ChronoTzSource, &zone, sample_years(None, None)?)
                    .with_context(|| format!("Failed to extract rule for {}", zone))?,
            };
            let (offset, is_dst) = rule.offset_and_dst(local);
            println!(
                "{}  {} ({})",
                zone,
                zone_rules::format_utc_offset(offset),
                if is_dst { "DST" } else { "standard" }
            );
        }
    }

    Ok(())
}

fn generate(
    zones: &[String],
    config: Option<&Path>,
    output: Option<&Path>,
    format: Format,
    years: RangeInclusive<i32>,
    strict: bool,
) -> Result<()> {
    let selected = select_zones(zones, config)?;
    eprintln!("Processing {} timezone(s)...", selected.len());
    debug!(from = *years.start(), to = *years.end(), "sample horizon");

    let mut extracted = Vec::with_capacity(selected.len());
    for zone in &selected {
        match zone_rules::extract(&ChronoTzSource, zone, years.clone()) {
            Ok(rule) => {
                eprintln!("  {}", summarize(zone, &rule));
                extracted.push((zone.clone(), rule));
            }
            Err(err) if strict => {
                return Err(err).with_context(|| format!("Failed to extract rule for {}", zone));
            }
            Err(err) => {
                warn!(zone = %zone, error = %err, "skipping zone");
                eprintln!("  Warning: skipping {}: {}", zone, err);
            }
        }
    }

    let registry: ZoneRegistry = extracted.into_iter().collect();
    let rendered = match format {
        Format::Table => registry.to_table(),
        Format::Rust => zone_rules::render_rust_module(&registry),
        Format::Json => registry.to_json().context("Failed to serialize rules")? + "\n",
    };
    write_output(output, &rendered)?;

    let destination = output.map_or_else(|| "stdout".to_string(), |p| p.display().to_string());
    eprintln!(
        "Generated {} with {} timezone(s)",
        destination,
        registry.len()
    );
    Ok(())
}

fn list(region: Option<&str>) -> Result<()> {
    let mut regions: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for zone in ChronoTzSource.zone_ids() {
        let group = zone.split_once('/').map_or("Other", |(group, _)| group);
        regions.entry(group).or_default().push(zone);
    }

    if let Some(wanted) = region {
        regions.retain(|group, _| *group == wanted);
        if regions.is_empty() {
            anyhow::bail!("Unknown region: '{}'", wanted);
        }
    }

    let total: usize = regions.values().map(Vec::len).sum();
    println!("Available timezones ({} total):", total);
    for (group, mut zones) in regions {
        zones.sort_unstable();
        println!();
        println!("{}:", group);
        for zone in zones {
            println!("  {}", zone);
        }
    }
    Ok(())
}

/// Zones from the arguments and the config file, deduplicated and sorted,
/// plus [`ALWAYS_INCLUDED`].
fn select_zones(zones: &[String], config: Option<&Path>) -> Result<BTreeSet<String>> {
    let mut selected: BTreeSet<String> = zones.iter().cloned().collect();
    if let Some(path) = config {
        let text = read_file(path)?;
        selected.extend(parse_config(&text));
    }
    if selected.is_empty() {
        anyhow::bail!("No timezones specified. Pass zone identifiers or --config FILE");
    }
    selected.insert(ALWAYS_INCLUDED.to_string());
    Ok(selected)
}

fn parse_config(text: &str) -> impl Iterator<Item = String> + '_ {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
}

fn sample_years(from_year: Option<i32>, to_year: Option<i32>) -> Result<RangeInclusive<i32>> {
    let defaults = zone_rules::default_sample_years(Utc::now().year());
    let from = from_year.unwrap_or(*defaults.start());
    let to = to_year.unwrap_or(*defaults.end());
    if from > to {
        anyhow::bail!("--from-year {} is after --to-year {}", from, to);
    }
    Ok(from..=to)
}

fn parse_local(text: &str) -> Result<NaiveDateTime> {
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .with_context(|| format!("Invalid local date-time '{}', expected YYYY-MM-DDTHH:MM[:SS]", text))
}

/// `Australia/Adelaide: +9.5h (DST)`
fn summarize(zone: &str, rule: &ZoneRule) -> String {
    let hours = f64::from(rule.std_offset_minutes()) / 60.0;
    format!(
        "{}: {:+.1}h ({})",
        zone,
        hours,
        if rule.has_dst() { "DST" } else { "no DST" }
    )
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path.display()))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
