//! Minimal axum service wired up with gcplog.
//!
//! Run with `cargo run --example server`, then:
//!
//! ```text
//! curl localhost:8080/
//! curl -H 'x-cloud-trace-context: 105445aa7843bc8bf206b12000100000/1;o=1' localhost:8080/
//! ```

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gcplog::{LogConfig, Logger, Severity, StackTrace, TraceContext};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gcplog=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = LogConfig::builder()
        .project_id("demo-project")
        .min_severity(Severity::Debug)
        .from_env()?
        .build()?;
    let logger = Logger::new(config);
    let layer = gcplog::initialize("demo-server", "demo-project")?;

    let app = Router::new()
        .route("/", {
            let logger = logger.clone();
            get(move |ctx: TraceContext| {
                let logger = logger.clone();
                async move {
                    logger.info(&ctx, format_args!("handling /"));
                    logger.structured().info(
                        &ctx,
                        &serde_json::json!({"path": "/", "outcome": "ok"}),
                    );
                    "ok\n"
                }
            })
        })
        .route("/fail", {
            let logger = logger.clone();
            get(move |ctx: TraceContext| {
                let logger = logger.clone();
                async move {
                    logger.error(&ctx, format_args!("simulated failure"));
                    logger
                        .text()
                        .debug(&ctx, format_args!("{}", StackTrace::capture()));
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            })
        })
        .layer(layer);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
    tracing::info!(address = %listener.local_addr()?, "demo server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
