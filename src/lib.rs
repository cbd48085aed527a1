//! Leveled logging with Google Cloud trace correlation.
//!
//! Every log line carries the trace and span IDs of the request that
//! produced it, so Cloud Logging groups log lines under their request
//! trace. Output is line-delimited JSON for ingestion, or plain text for
//! local development.
//!
//! # Architecture Overview
//!
//! ```text
//!     Inbound request
//!     ────────────────▶ middleware (TraceContextLayer)
//!                          │  derive span: remote parent or fresh root
//!                          │  TraceContext into request extensions
//!                          ▼
//!                       handler code
//!                          │  logger.info(&ctx, format_args!(...))
//!                          ▼
//!                       Logger (severity gate, surface selection)
//!                          │
//!                          ▼
//!                       LogWriter (one lock, render, write)
//!                          │
//!                          ▼
//!                       stdout — one JSON object or text line per call
//! ```
//!
//! # Surfaces
//!
//! - default: JSON (`message` field), text when the debug flag is set
//! - [`Logger::text`]: always `"<SEVERITY>: <message>"`
//! - [`Logger::structured`]: always JSON, arbitrary payload under
//!   `structure`
//!
//! # Usage
//!
//! ```no_run
//! use axum::{routing::get, Router};
//! use gcplog::{LogConfig, Logger, TraceContext};
//!
//! # fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = LogConfig::builder().project_id("my-project").build()?;
//! let logger = Logger::new(config);
//! let layer = gcplog::initialize("my-app", "my-project")?;
//!
//! let app: Router = Router::new()
//!     .route(
//!         "/",
//!         get(move |ctx: TraceContext| {
//!             let logger = logger.clone();
//!             async move {
//!                 logger.info(&ctx, format_args!("handling request"));
//!                 "ok"
//!             }
//!         }),
//!     )
//!     .layer(layer);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod logger;
pub mod middleware;
pub mod severity;
pub mod stack;
pub mod trace;
pub mod writer;

pub use config::{ConfigError, LogConfig, LogConfigBuilder};
pub use logger::Logger;
pub use middleware::{initialize, TraceContextLayer};
pub use severity::Severity;
pub use stack::{StackFrame, StackTrace};
pub use trace::{RequestSpan, TraceContext};
pub use writer::LogWriter;
