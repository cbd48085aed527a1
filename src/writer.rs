//! Output rendering and the synchronized sink.
//!
//! # Responsibilities
//! - Render text, JSON, and structured-JSON records
//! - Serialize all output through one lock so concurrent callers never
//!   interleave mid-line
//!
//! # Design Decisions
//! - One mutex covers every severity and every surface; line atomicity is
//!   the contract, a single contention point is the accepted cost
//! - Encoding and write failures are swallowed: logging must never crash
//!   or block the caller's request path
//! - Output is line-delimited and unbuffered across calls; the sink
//!   (stdout in production, a capture buffer in tests) supplies any
//!   timestamp prefix for the text format

use std::fmt;
use std::io::{self, Write};
use std::sync::Mutex;

use serde::Serialize;

use crate::severity::Severity;
use crate::trace::TraceContext;

/// Default-surface wire record.
#[derive(Serialize)]
struct JsonRecord<'a> {
    severity: &'a str,
    message: String,
    #[serde(rename = "logging.googleapis.com/trace")]
    trace: String,
    #[serde(rename = "logging.googleapis.com/spanId")]
    span_id: &'a str,
}

/// Structured-surface wire record: same envelope, arbitrary payload.
#[derive(Serialize)]
struct StructuredRecord<'a, T: Serialize> {
    severity: &'a str,
    structure: &'a T,
    #[serde(rename = "logging.googleapis.com/trace")]
    trace: String,
    #[serde(rename = "logging.googleapis.com/spanId")]
    span_id: &'a str,
}

fn trace_field(project_id: &str, ctx: &TraceContext) -> String {
    // Absent context renders empty-string IDs, never omitted fields.
    format!("projects/{}/traces/{}", project_id, ctx.trace_id)
}

/// The synchronized output sink shared by all logger surfaces.
pub struct LogWriter {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl LogWriter {
    /// Writer over the process's standard output stream.
    pub fn stdout() -> LogWriter {
        LogWriter::with_sink(Box::new(io::stdout()))
    }

    /// Writer over an arbitrary sink. Used by tests to capture output.
    pub fn with_sink(sink: Box<dyn Write + Send>) -> LogWriter {
        LogWriter {
            sink: Mutex::new(sink),
        }
    }

    /// Write one full line while holding the lock. Failures are dropped.
    fn write_line(&self, line: fmt::Arguments<'_>) {
        // A poisoned lock means another logging call panicked mid-write;
        // the sink itself is still usable.
        let mut sink = match self.sink.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let _ = writeln!(sink, "{}", line);
        let _ = sink.flush();
    }

    /// Render the text format: `<SEVERITY>: <message>`.
    pub(crate) fn write_text(&self, severity: Severity, args: fmt::Arguments<'_>) {
        self.write_line(format_args!("{}: {}", severity, args));
    }

    /// Render the default JSON format with trace correlation fields.
    pub(crate) fn write_json(
        &self,
        project_id: &str,
        ctx: &TraceContext,
        severity: Severity,
        args: fmt::Arguments<'_>,
    ) {
        let record = JsonRecord {
            severity: severity.as_str(),
            message: args.to_string(),
            trace: trace_field(project_id, ctx),
            span_id: &ctx.span_id,
        };
        if let Ok(line) = serde_json::to_string(&record) {
            self.write_line(format_args!("{}", line));
        }
    }

    /// Render the structured JSON format with an arbitrary payload.
    pub(crate) fn write_structured<T: Serialize>(
        &self,
        project_id: &str,
        ctx: &TraceContext,
        severity: Severity,
        payload: &T,
    ) {
        let record = StructuredRecord {
            severity: severity.as_str(),
            structure: payload,
            trace: trace_field(project_id, ctx),
            span_id: &ctx.span_id,
        };
        // Payloads that fail to encode are silently discarded.
        if let Ok(line) = serde_json::to_string(&record) {
            self.write_line(format_args!("{}", line));
        }
    }
}

impl fmt::Debug for LogWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogWriter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Capture {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn ctx() -> TraceContext {
        TraceContext {
            trace_id: "abc123".into(),
            span_id: "def456".into(),
        }
    }

    #[test]
    fn test_text_format() {
        let capture = Capture::default();
        let writer = LogWriter::with_sink(Box::new(capture.clone()));
        writer.write_text(Severity::Info, format_args!("hello {}", 42));
        assert_eq!(capture.contents(), "INFO: hello 42\n");
    }

    #[test]
    fn test_json_format_carries_trace_fields() {
        let capture = Capture::default();
        let writer = LogWriter::with_sink(Box::new(capture.clone()));
        writer.write_json(
            "proj1",
            &ctx(),
            Severity::Error,
            format_args!("boom {}", "now"),
        );

        let line = capture.contents();
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["severity"], "ERROR");
        assert_eq!(value["message"], "boom now");
        assert_eq!(
            value["logging.googleapis.com/trace"],
            "projects/proj1/traces/abc123"
        );
        assert_eq!(value["logging.googleapis.com/spanId"], "def456");
    }

    #[test]
    fn test_empty_context_renders_empty_ids() {
        let capture = Capture::default();
        let writer = LogWriter::with_sink(Box::new(capture.clone()));
        writer.write_json(
            "proj1",
            &TraceContext::default(),
            Severity::Info,
            format_args!("untraced"),
        );

        let line = capture.contents();
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["logging.googleapis.com/trace"], "projects/proj1/traces/");
        assert_eq!(value["logging.googleapis.com/spanId"], "");
    }

    #[test]
    fn test_structured_payload_nested_not_flattened() {
        let capture = Capture::default();
        let writer = LogWriter::with_sink(Box::new(capture.clone()));
        let payload = serde_json::json!({"x": 1, "y": [2, 3]});
        writer.write_structured("proj1", &ctx(), Severity::Warning, &payload);

        let line = capture.contents();
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["structure"], payload);
        assert!(value.get("message").is_none());
    }

    #[test]
    fn test_one_line_per_call() {
        let capture = Capture::default();
        let writer = LogWriter::with_sink(Box::new(capture.clone()));
        writer.write_text(Severity::Info, format_args!("first"));
        writer.write_json("proj1", &ctx(), Severity::Info, format_args!("second"));

        let contents = capture.contents();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.ends_with('\n'));
    }
}
