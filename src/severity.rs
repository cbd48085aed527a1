//! Log severity levels.
//!
//! # Responsibilities
//! - Define the ordered severity domain (DEBUG through CRITICAL)
//! - Provide the upper-case wire names used by Cloud Logging
//! - Parse severities from configuration strings
//!
//! # Design Decisions
//! - Ordering is derived from the discriminants; a message at severity S
//!   is emitted only if S >= the configured minimum
//! - Parsing is case-insensitive so env-driven config stays forgiving

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Ordinal log importance level.
///
/// Discriminants match the wire ordering: `Debug` is the most verbose,
/// `Critical` the most important.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Severity {
    Debug = 0,
    Info = 1,
    Warning = 2,
    Error = 3,
    Critical = 4,
}

impl Severity {
    /// The upper-case name rendered into log records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }

    /// Reconstruct a severity from its stored discriminant.
    ///
    /// Only used to read back the atomic cell in `LogConfig`; values
    /// outside the domain clamp to `Critical`.
    pub(crate) fn from_u8(value: u8) -> Severity {
        match value {
            0 => Severity::Debug,
            1 => Severity::Info,
            2 => Severity::Warning,
            3 => Severity::Error,
            _ => Severity::Critical,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a severity string is not in the known domain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown severity level: {0:?}")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Severity::Debug),
            "INFO" => Ok(Severity::Info),
            "WARNING" => Ok(Severity::Warning),
            "ERROR" => Ok(Severity::Error),
            "CRITICAL" => Ok(Severity::Critical),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}
