//! Diagnostic stack capture.
//!
//! # Responsibilities
//! - Snapshot the current call stack up to a fixed depth
//! - Resolve frames to (short name, file, line) lazily, at render time
//! - Render one `at <name> (<file>:<line>)` line per frame
//!
//! # Design Decisions
//! - Capture stores raw program counters only; symbol resolution is the
//!   expensive part and is deferred until the trace is actually rendered
//! - Frames that cannot be resolved degrade to `"unknown"` placeholders
//! - Each capture is a fresh snapshot; nothing is cached or shared

use std::fmt;

/// Frames belonging to the capture machinery itself, skipped so the
/// rendered trace starts at the caller.
const SKIP_FRAMES: usize = 2;

/// Upper bound on captured frames; bounds the allocation per capture.
const MAX_FRAMES: usize = 32;

/// One resolved stack frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Function name with the module path and symbol hash stripped.
    pub name: String,
    /// Source file path, or `"unknown"`.
    pub file: String,
    /// Line number, or 0 when unresolved.
    pub line: u32,
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at {} ({}:{})", self.name, self.file, self.line)
    }
}

/// A captured call stack, most recent call first.
#[derive(Debug, Clone)]
pub struct StackTrace {
    frames: Vec<backtrace::Frame>,
}

impl StackTrace {
    /// Capture the current call stack.
    ///
    /// Cheap: walks at most [`MAX_FRAMES`] program counters without
    /// resolving symbols.
    pub fn capture() -> StackTrace {
        let mut frames = Vec::with_capacity(MAX_FRAMES);
        let mut skipped = 0;
        backtrace::trace(|frame| {
            if skipped < SKIP_FRAMES {
                skipped += 1;
                return true;
            }
            frames.push(frame.clone());
            frames.len() < MAX_FRAMES
        });
        StackTrace { frames }
    }

    /// Number of captured frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Resolve every frame. This is where symbolication cost is paid.
    pub fn frames(&self) -> Vec<StackFrame> {
        self.frames.iter().map(resolve_frame).collect()
    }
}

impl fmt::Display for StackTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for frame in self.frames() {
            if !first {
                writeln!(f)?;
            }
            write!(f, "{}", frame)?;
            first = false;
        }
        Ok(())
    }
}

fn resolve_frame(frame: &backtrace::Frame) -> StackFrame {
    let mut resolved = None;
    backtrace::resolve_frame(frame, |symbol| {
        // Inlined functions can yield several symbols per frame; keep the
        // innermost one, which is reported first.
        if resolved.is_some() {
            return;
        }
        resolved = Some(StackFrame {
            name: symbol
                .name()
                .map(|n| short_name(&n.to_string()))
                .unwrap_or_else(|| "unknown".to_string()),
            file: symbol
                .filename()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            line: symbol.lineno().unwrap_or(0),
        });
    });
    resolved.unwrap_or_else(|| StackFrame {
        name: "unknown".to_string(),
        file: "unknown".to_string(),
        line: 0,
    })
}

/// Strip the module path and trailing symbol hash from a mangled-ish
/// symbol name: `gcplog::stack::capture::h1a2b3c4d` becomes `capture`.
fn short_name(full: &str) -> String {
    let base = match full.rfind("::h") {
        Some(idx) if full[idx + 3..].chars().all(|c| c.is_ascii_hexdigit()) => &full[..idx],
        _ => full,
    };
    base.rsplit("::").next().unwrap_or(base).to_string()
}
