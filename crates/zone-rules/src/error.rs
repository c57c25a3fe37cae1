//! Error types for zone-rules operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZoneRuleError {
    #[error("Unknown timezone: {0}")]
    UnknownZone(String),

    #[error("Irregular DST schedule for {zone}: {reason}")]
    IrregularSchedule { zone: String, reason: String },

    #[error("Insufficient history for {zone}: {years} sampled year(s), at least 2 required")]
    InsufficientHistory { zone: String, years: usize },

    #[error("Invalid sample horizon: {0}")]
    InvalidHorizon(String),

    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    /// Includes the 1-based line number where the error was detected.
    #[error("Table parse error at line {line}: {message}")]
    TableParse { line: usize, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ZoneRuleError>;
