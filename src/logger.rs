//! Logger facade: three API surfaces over one synchronized writer.
//!
//! # Responsibilities
//! - Gate every emission on the configured minimum severity before any
//!   formatting work happens
//! - Dispatch to the text, default-JSON, or structured-JSON rendering
//! - Expose the administrative knobs (debug flag, minimum severity)
//!
//! # Data Flow
//! ```text
//! handler code
//!     → Logger (severity gate)
//!     → LogWriter (lock, render, write)
//!     → stdout (one line per call)
//! ```
//!
//! # Design Decisions
//! - The default surface is JSON (text when the debug flag is set); the
//!   `.text()` and `.structured()` accessors expose the other surfaces
//! - CRITICAL bypasses the severity gate on every surface: critical
//!   failures are never silently dropped, whatever the configured minimum
//! - Entry points take `fmt::Arguments` so suppressed calls pay no
//!   formatting cost: `logger.info(&ctx, format_args!("up in {n}ms"))`

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::config::LogConfig;
use crate::severity::Severity;
use crate::trace::TraceContext;
use crate::writer::LogWriter;

/// The logging facade. Cheap to clone; clones share the config and the
/// synchronized writer.
#[derive(Debug, Clone)]
pub struct Logger {
    config: Arc<LogConfig>,
    writer: Arc<LogWriter>,
}

impl Logger {
    /// Logger writing to stdout.
    pub fn new(config: LogConfig) -> Logger {
        Logger::with_writer(config, LogWriter::stdout())
    }

    /// Logger writing to a caller-supplied sink.
    pub fn with_writer(config: LogConfig, writer: LogWriter) -> Logger {
        Logger {
            config: Arc::new(config),
            writer: Arc::new(writer),
        }
    }

    /// The configuration this logger renders with.
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Toggle text rendering on the default surface. Process-wide for
    /// every clone of this logger.
    pub fn set_debug(&self, on: bool) {
        self.config.set_debug(on);
    }

    /// Raise or lower the minimum severity for every clone of this logger.
    pub fn set_min_severity(&self, level: Severity) {
        self.config.set_min_severity(level);
    }

    /// The always-text surface.
    pub fn text(&self) -> Text<'_> {
        Text { logger: self }
    }

    /// The arbitrary-payload JSON surface.
    pub fn structured(&self) -> Structured<'_> {
        Structured { logger: self }
    }

    // Default surface: JSON, or text when the debug flag is set.

    pub fn debug(&self, ctx: &TraceContext, args: fmt::Arguments<'_>) {
        self.emit_default(Severity::Debug, ctx, args);
    }

    pub fn info(&self, ctx: &TraceContext, args: fmt::Arguments<'_>) {
        self.emit_default(Severity::Info, ctx, args);
    }

    pub fn warning(&self, ctx: &TraceContext, args: fmt::Arguments<'_>) {
        self.emit_default(Severity::Warning, ctx, args);
    }

    pub fn error(&self, ctx: &TraceContext, args: fmt::Arguments<'_>) {
        self.emit_default(Severity::Error, ctx, args);
    }

    pub fn critical(&self, ctx: &TraceContext, args: fmt::Arguments<'_>) {
        self.emit_default(Severity::Critical, ctx, args);
    }

    /// Severity gate shared by all surfaces. CRITICAL always passes.
    fn gate(&self, severity: Severity) -> bool {
        severity == Severity::Critical || self.config.should_emit(severity)
    }

    fn emit_default(&self, severity: Severity, ctx: &TraceContext, args: fmt::Arguments<'_>) {
        if !self.gate(severity) {
            return;
        }
        if self.config.debug() {
            self.writer.write_text(severity, args);
        } else {
            self.writer
                .write_json(self.config.project_id(), ctx, severity, args);
        }
    }

    fn emit_text(&self, severity: Severity, args: fmt::Arguments<'_>) {
        if !self.gate(severity) {
            return;
        }
        self.writer.write_text(severity, args);
    }

    fn emit_structured<T: Serialize>(&self, severity: Severity, ctx: &TraceContext, payload: &T) {
        if !self.gate(severity) {
            return;
        }
        self.writer
            .write_structured(self.config.project_id(), ctx, severity, payload);
    }
}

/// The plain-text surface. Renders `<SEVERITY>: <message>` regardless of
/// the debug flag; the trace context is accepted for signature parity but
/// not rendered in this format.
#[derive(Debug, Clone, Copy)]
pub struct Text<'a> {
    logger: &'a Logger,
}

impl Text<'_> {
    pub fn debug(&self, _ctx: &TraceContext, args: fmt::Arguments<'_>) {
        self.logger.emit_text(Severity::Debug, args);
    }

    pub fn info(&self, _ctx: &TraceContext, args: fmt::Arguments<'_>) {
        self.logger.emit_text(Severity::Info, args);
    }

    pub fn warning(&self, _ctx: &TraceContext, args: fmt::Arguments<'_>) {
        self.logger.emit_text(Severity::Warning, args);
    }

    pub fn error(&self, _ctx: &TraceContext, args: fmt::Arguments<'_>) {
        self.logger.emit_text(Severity::Error, args);
    }

    pub fn critical(&self, _ctx: &TraceContext, args: fmt::Arguments<'_>) {
        self.logger.emit_text(Severity::Critical, args);
    }
}

/// The structured surface. Always JSON; the caller value lands under the
/// `structure` field as nested JSON, ignoring the debug flag.
#[derive(Debug, Clone, Copy)]
pub struct Structured<'a> {
    logger: &'a Logger,
}

impl Structured<'_> {
    pub fn debug<T: Serialize>(&self, ctx: &TraceContext, payload: &T) {
        self.logger.emit_structured(Severity::Debug, ctx, payload);
    }

    pub fn info<T: Serialize>(&self, ctx: &TraceContext, payload: &T) {
        self.logger.emit_structured(Severity::Info, ctx, payload);
    }

    pub fn warning<T: Serialize>(&self, ctx: &TraceContext, payload: &T) {
        self.logger.emit_structured(Severity::Warning, ctx, payload);
    }

    pub fn error<T: Serialize>(&self, ctx: &TraceContext, payload: &T) {
        self.logger.emit_structured(Severity::Error, ctx, payload);
    }

    pub fn critical<T: Serialize>(&self, ctx: &TraceContext, payload: &T) {
        self.logger.emit_structured(Severity::Critical, ctx, payload);
    }
}
