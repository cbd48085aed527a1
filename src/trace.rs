//! Trace context derivation and propagation.
//!
//! # Responsibilities
//! - Parse inbound trace-propagation headers (`X-Cloud-Trace-Context`,
//!   with W3C `traceparent` as a fallback)
//! - Start a request span: child of the remote parent when one is
//!   present, fresh root otherwise
//! - Guarantee the span is ended exactly once on every exit path
//!
//! # Design Decisions
//! - The context is an explicit value threaded through call sites (and
//!   stored in request extensions by the middleware), never ambient state
//! - Span completion is RAII: dropping the `RequestSpan` ends it, which
//!   covers normal return, early return, and unwind alike
//! - This is not a tracing system: no sampling decisions, no exporter;
//!   span boundaries are surfaced as `tracing` events for the host
//!   application's subscriber

use std::time::Instant;

use axum::http::HeaderMap;
use rand::Rng;
use uuid::Uuid;

/// Google Cloud trace propagation header: `TRACE_ID/SPAN_ID[;o=FLAGS]`.
pub const CLOUD_TRACE_HEADER: &str = "x-cloud-trace-context";

/// W3C trace propagation header: `00-TRACE_ID-SPAN_ID-FLAGS`.
pub const TRACEPARENT_HEADER: &str = "traceparent";

/// Trace identifiers attached to every log record.
///
/// The default value carries empty IDs; renderers emit those as
/// empty-string fields so logging keeps working on untraced code paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceContext {
    /// 32-character lowercase hex trace ID.
    pub trace_id: String,
    /// 16-character lowercase hex span ID.
    pub span_id: String,
}

impl TraceContext {
    /// True when no span has been established for this context.
    pub fn is_empty(&self) -> bool {
        self.trace_id.is_empty() && self.span_id.is_empty()
    }

    /// Parse-only view of the inbound propagation headers: the remote
    /// parent's identifiers, without starting a span.
    pub fn from_headers(headers: &HeaderMap) -> Option<TraceContext> {
        remote_parent(headers)
    }
}

/// Trace/span identifiers inherited from an upstream caller.
fn remote_parent(headers: &HeaderMap) -> Option<TraceContext> {
    if let Some(value) = header_str(headers, CLOUD_TRACE_HEADER) {
        if let Some(parent) = parse_cloud_trace(value) {
            return Some(parent);
        }
    }
    if let Some(value) = header_str(headers, TRACEPARENT_HEADER) {
        if let Some(parent) = parse_traceparent(value) {
            return Some(parent);
        }
    }
    None
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Parse `X-Cloud-Trace-Context: TRACE_ID/SPAN_ID[;o=FLAGS]`.
///
/// The span component is decimal in this format; it identifies the remote
/// parent and is normalized to 16-char hex for consistency with the log
/// field encoding.
fn parse_cloud_trace(value: &str) -> Option<TraceContext> {
    let (trace_id, rest) = value.split_once('/')?;
    if !is_valid_trace_id(trace_id) {
        return None;
    }
    let span_part = rest.split(';').next().unwrap_or(rest);
    let span: u64 = span_part.parse().ok()?;
    Some(TraceContext {
        trace_id: trace_id.to_ascii_lowercase(),
        span_id: format!("{:016x}", span),
    })
}

/// Parse `traceparent: 00-TRACE_ID-SPAN_ID-FLAGS` (W3C Trace Context).
fn parse_traceparent(value: &str) -> Option<TraceContext> {
    let mut pieces = value.split('-');
    let version = pieces.next()?;
    let trace_id = pieces.next()?;
    let span_id = pieces.next()?;
    let _flags = pieces.next()?;
    if version != "00" || !is_valid_trace_id(trace_id) || !is_valid_span_id(span_id) {
        return None;
    }
    Some(TraceContext {
        trace_id: trace_id.to_ascii_lowercase(),
        span_id: span_id.to_ascii_lowercase(),
    })
}

fn is_valid_trace_id(id: &str) -> bool {
    id.len() == 32 && id.chars().all(|c| c.is_ascii_hexdigit()) && !id.chars().all(|c| c == '0')
}

fn is_valid_span_id(id: &str) -> bool {
    id.len() == 16 && id.chars().all(|c| c.is_ascii_hexdigit()) && !id.chars().all(|c| c == '0')
}

fn new_trace_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn new_span_id() -> String {
    // Zero is reserved as "invalid" by both propagation formats.
    let id: u64 = rand::thread_rng().gen_range(1..u64::MAX);
    format!("{:016x}", id)
}

/// A request-scoped span.
///
/// Acquired at request entry; the span is closed when the value is
/// dropped, or earlier via [`RequestSpan::end`]. Either way it closes
/// exactly once.
#[derive(Debug)]
pub struct RequestSpan {
    ctx: TraceContext,
    label: String,
    started: Instant,
    ended: bool,
}

impl RequestSpan {
    /// Start a span for an inbound request.
    ///
    /// A valid propagation header links the span to the upstream caller's
    /// trace (inherited trace ID, fresh span ID); otherwise a new root
    /// span is started under `label`.
    pub fn derive(headers: &HeaderMap, label: &str) -> RequestSpan {
        let ctx = match remote_parent(headers) {
            Some(parent) => {
                tracing::debug!(
                    label,
                    trace_id = %parent.trace_id,
                    parent_span_id = %parent.span_id,
                    "span started with remote parent"
                );
                TraceContext {
                    trace_id: parent.trace_id,
                    span_id: new_span_id(),
                }
            }
            None => {
                let ctx = TraceContext {
                    trace_id: new_trace_id(),
                    span_id: new_span_id(),
                };
                tracing::debug!(label, trace_id = %ctx.trace_id, "root span started");
                ctx
            }
        };

        RequestSpan {
            ctx,
            label: label.to_string(),
            started: Instant::now(),
            ended: false,
        }
    }

    /// The identifiers carried by this span.
    pub fn context(&self) -> &TraceContext {
        &self.ctx
    }

    /// Close the span explicitly. Dropping the value does the same.
    pub fn end(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        tracing::debug!(
            label = %self.label,
            trace_id = %self.ctx.trace_id,
            span_id = %self.ctx.span_id,
            elapsed_us = self.started.elapsed().as_micros() as u64,
            "span ended"
        );
    }
}

impl Drop for RequestSpan {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(name: &'static str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_cloud_trace_header_parsed() {
        let headers = headers_with(
            CLOUD_TRACE_HEADER,
            "105445aa7843bc8bf206b12000100000/255;o=1",
        );
        let parent = TraceContext::from_headers(&headers).unwrap();
        assert_eq!(parent.trace_id, "105445aa7843bc8bf206b12000100000");
        assert_eq!(parent.span_id, "00000000000000ff");
    }

    #[test]
    fn test_cloud_trace_header_without_options() {
        let headers = headers_with(CLOUD_TRACE_HEADER, "105445aa7843bc8bf206b12000100000/1");
        assert!(TraceContext::from_headers(&headers).is_some());
    }

    #[test]
    fn test_malformed_cloud_trace_header_rejected() {
        for value in [
            "not-a-trace",
            "105445aa7843bc8bf206b12000100000",     // no span
            "105445aa/1;o=1",                        // short trace ID
            "00000000000000000000000000000000/1",    // all-zero trace ID
            "105445aa7843bc8bf206b12000100000/abc",  // non-decimal span
        ] {
            let headers = headers_with(CLOUD_TRACE_HEADER, value);
            assert!(
                TraceContext::from_headers(&headers).is_none(),
                "should reject {value:?}"
            );
        }
    }

    #[test]
    fn test_traceparent_fallback() {
        let headers = headers_with(
            TRACEPARENT_HEADER,
            "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01",
        );
        let parent = TraceContext::from_headers(&headers).unwrap();
        assert_eq!(parent.trace_id, "0af7651916cd43dd8448eb211c80319c");
        assert_eq!(parent.span_id, "b7ad6b7169203331");
    }

    #[test]
    fn test_cloud_trace_header_wins_over_traceparent() {
        let mut headers = headers_with(
            CLOUD_TRACE_HEADER,
            "105445aa7843bc8bf206b12000100000/1;o=1",
        );
        headers.insert(
            TRACEPARENT_HEADER,
            HeaderValue::from_static("00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01"),
        );
        let parent = TraceContext::from_headers(&headers).unwrap();
        assert_eq!(parent.trace_id, "105445aa7843bc8bf206b12000100000");
    }

    #[test]
    fn test_derive_inherits_remote_trace() {
        let headers = headers_with(
            CLOUD_TRACE_HEADER,
            "105445aa7843bc8bf206b12000100000/255;o=1",
        );
        let span = RequestSpan::derive(&headers, "test-app");
        assert_eq!(span.context().trace_id, "105445aa7843bc8bf206b12000100000");
        // Child gets its own span ID, not the parent's.
        assert_ne!(span.context().span_id, "00000000000000ff");
        assert!(is_valid_span_id(&span.context().span_id));
    }

    #[test]
    fn test_derive_root_span_generates_well_formed_ids() {
        let span = RequestSpan::derive(&HeaderMap::new(), "test-app");
        assert!(is_valid_trace_id(&span.context().trace_id));
        assert!(is_valid_span_id(&span.context().span_id));
    }

    #[test]
    fn test_distinct_spans_get_distinct_ids() {
        let a = RequestSpan::derive(&HeaderMap::new(), "test-app");
        let b = RequestSpan::derive(&HeaderMap::new(), "test-app");
        assert_ne!(a.context().trace_id, b.context().trace_id);
        assert_ne!(a.context().span_id, b.context().span_id);
    }

    #[test]
    fn test_end_then_drop_is_single_completion() {
        let span = RequestSpan::derive(&HeaderMap::new(), "test-app");
        // end() consumes the span; Drop must not double-finish.
        span.end();
    }

    #[test]
    fn test_empty_context() {
        let ctx = TraceContext::default();
        assert!(ctx.is_empty());
        assert_eq!(ctx.trace_id, "");
        assert_eq!(ctx.span_id, "");
    }
}
