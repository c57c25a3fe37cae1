//! A small `tracing` subscriber that prints events to stderr.
//!
//! Filtering follows `RUST_LOG`: a comma-separated list of `level`, `target`
//! or `target=level` entries. Without `RUST_LOG` nothing is printed unless
//! `--verbose` asked for debug output.

use std::env;
use std::fmt::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_core::span::{Attributes, Id, Record};

struct StringVisitor<'a> {
    string: &'a mut String,
}

impl Visit for StringVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.string, "{:?} ", value);
        } else {
            let _ = write!(self.string, "{} = {:?}; ", field.name(), value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            let _ = write!(self.string, "{} ", value);
        } else {
            let _ = write!(self.string, "{} = {}; ", field.name(), value);
        }
    }
}

struct LogFilter {
    target: Option<String>,
    level: Option<Level>,
}

impl LogFilter {
    fn matches(&self, metadata: &Metadata<'_>) -> bool {
        let level_ok = self.level.is_none_or(|level| *metadata.level() <= level);
        let target_ok = self
            .target
            .as_deref()
            .is_none_or(|target| metadata.target().starts_with(target));
        level_ok && target_ok
    }
}

fn string_to_level(string: &str) -> Option<Level> {
    match string.to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

fn parse_filters(directives: &str) -> Vec<LogFilter> {
    directives
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((target, level)) => LogFilter {
                target: Some(target.to_string()),
                level: string_to_level(level),
            },
            None => match string_to_level(entry) {
                Some(level) => LogFilter {
                    target: None,
                    level: Some(level),
                },
                None => LogFilter {
                    target: Some(entry.to_string()),
                    level: None,
                },
            },
        })
        .collect()
}

pub struct StderrTracer {
    filters: Vec<LogFilter>,
}

impl StderrTracer {
    /// Install the tracer as the global default.
    pub fn register(verbose: bool) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
        let filters = match env::var("RUST_LOG") {
            Ok(directives) => parse_filters(&directives),
            Err(_) if verbose => parse_filters("debug"),
            Err(_) => Vec::new(),
        };
        tracing::subscriber::set_global_default(StderrTracer { filters })
    }
}

static NEXT_SPAN_ID: AtomicU64 = AtomicU64::new(1);

impl Subscriber for StderrTracer {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.filters.iter().any(|filter| filter.matches(metadata))
    }

    fn new_span(&self, _span: &Attributes<'_>) -> Id {
        Id::from_u64(NEXT_SPAN_ID.fetch_add(1, Ordering::Relaxed))
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let metadata = event.metadata();
        let mut text = String::new();
        event.record(&mut StringVisitor { string: &mut text });
        eprintln!("{} {}: {}", metadata.level(), metadata.target(), text.trim_end());
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}
