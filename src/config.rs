//! Logger configuration.
//!
//! # Responsibilities
//! - Hold the project ID, debug flag, and minimum severity
//! - Validate configuration at construction (project ID is mandatory)
//! - Expose the severity gate consulted on every emission
//!
//! # Design Decisions
//! - Config is an explicit object owned by the `Logger` (shared via `Arc`),
//!   not process-wide globals; construction happens once at startup
//! - The administrative knobs (debug flag, minimum severity) are atomics:
//!   last-writer-wins, no lock on the hot read path
//! - The builder can pick up `GCPLOG_DEBUG` / `GCPLOG_MIN_SEVERITY` from
//!   the environment so deployments tune verbosity without code changes

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use thiserror::Error;

use crate::severity::{ParseSeverityError, Severity};

/// Environment variable enabling text rendering on the default surface.
pub const ENV_DEBUG: &str = "GCPLOG_DEBUG";

/// Environment variable overriding the minimum severity.
pub const ENV_MIN_SEVERITY: &str = "GCPLOG_MIN_SEVERITY";

/// Error type for logger configuration.
///
/// Every log line renders a `projects/<id>/traces/<id>` field, so a logger
/// without a project ID cannot produce correct output; callers are expected
/// to treat these as fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("project ID is required")]
    MissingProjectId,

    #[error("span label is required")]
    MissingLabel,

    #[error("invalid {var}: {source}")]
    InvalidEnv {
        var: &'static str,
        #[source]
        source: ParseSeverityError,
    },
}

/// Validated logger configuration.
///
/// Immutable except for the two administrative knobs, which are plain
/// atomic cells. Concurrent mutation during steady state is a caller
/// error, not a supported race-free path.
#[derive(Debug)]
pub struct LogConfig {
    project_id: String,
    debug: AtomicBool,
    min_severity: AtomicU8,
}

impl LogConfig {
    /// Start building a configuration.
    pub fn builder() -> LogConfigBuilder {
        LogConfigBuilder::default()
    }

    /// The Google Cloud project ID rendered into every trace field.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Whether the default surface renders text instead of JSON.
    pub fn debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    /// Toggle text rendering on the default surface.
    pub fn set_debug(&self, on: bool) {
        self.debug.store(on, Ordering::Relaxed);
    }

    /// Current minimum severity.
    pub fn min_severity(&self) -> Severity {
        Severity::from_u8(self.min_severity.load(Ordering::Relaxed))
    }

    /// Raise or lower the minimum severity. Last writer wins.
    pub fn set_min_severity(&self, level: Severity) {
        self.min_severity.store(level as u8, Ordering::Relaxed);
    }

    /// Severity gate: true iff `level` is at or above the minimum.
    pub fn should_emit(&self, level: Severity) -> bool {
        level >= self.min_severity()
    }
}

/// Builder for [`LogConfig`].
#[derive(Debug, Clone)]
pub struct LogConfigBuilder {
    project_id: Option<String>,
    debug: bool,
    min_severity: Severity,
}

impl Default for LogConfigBuilder {
    fn default() -> Self {
        Self {
            project_id: None,
            debug: false,
            // Most permissive until explicitly raised.
            min_severity: Severity::Debug,
        }
    }
}

impl LogConfigBuilder {
    /// Set the mandatory project ID.
    pub fn project_id(mut self, id: impl Into<String>) -> Self {
        self.project_id = Some(id.into());
        self
    }

    /// Set the initial debug flag.
    pub fn debug(mut self, on: bool) -> Self {
        self.debug = on;
        self
    }

    /// Set the initial minimum severity.
    pub fn min_severity(mut self, level: Severity) -> Self {
        self.min_severity = level;
        self
    }

    /// Overlay `GCPLOG_DEBUG` and `GCPLOG_MIN_SEVERITY` from the
    /// environment. Unset variables leave the builder untouched; a
    /// malformed severity is a configuration error.
    pub fn from_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(value) = std::env::var(ENV_DEBUG) {
            self.debug = matches!(value.as_str(), "1" | "true" | "TRUE" | "yes");
        }
        if let Ok(value) = std::env::var(ENV_MIN_SEVERITY) {
            self.min_severity = value.parse().map_err(|source| ConfigError::InvalidEnv {
                var: ENV_MIN_SEVERITY,
                source,
            })?;
        }
        Ok(self)
    }

    /// Validate and produce the configuration.
    pub fn build(self) -> Result<LogConfig, ConfigError> {
        let project_id = match self.project_id {
            Some(id) if !id.is_empty() => id,
            _ => return Err(ConfigError::MissingProjectId),
        };

        Ok(LogConfig {
            project_id,
            debug: AtomicBool::new(self.debug),
            min_severity: AtomicU8::new(self.min_severity as u8),
        })
    }
}
