//! Request-scoped trace context middleware.
//!
//! # Responsibilities
//! - Derive a span per inbound request (remote parent or fresh root)
//! - Make the `TraceContext` available to handlers via request extensions
//! - End the span when request handling completes, on every exit path
//!
//! # Design Decisions
//! - Implemented as a tower `Layer`/`Service` pair so it composes with
//!   the rest of an axum middleware stack
//! - The span guard is owned by the response future; dropping the future
//!   (normal completion, cancellation, or unwind) closes the span
//! - Handlers extract `TraceContext` directly as an axum extractor; a
//!   request that never went through the layer yields the empty context

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use crate::config::ConfigError;
use crate::trace::{RequestSpan, TraceContext};

/// Build the request-wrapping middleware.
///
/// `label` names the root spans this process starts; `project_id` is the
/// Google Cloud project the logger renders trace fields against. Both are
/// startup preconditions: an empty value is a configuration error and the
/// caller should not continue serving requests.
pub fn initialize(label: &str, project_id: &str) -> Result<TraceContextLayer, ConfigError> {
    if project_id.is_empty() {
        return Err(ConfigError::MissingProjectId);
    }
    if label.is_empty() {
        return Err(ConfigError::MissingLabel);
    }
    tracing::info!(label, project_id, "trace context middleware initialized");
    Ok(TraceContextLayer {
        label: Arc::from(label),
    })
}

/// Layer attaching a [`TraceContext`] to every request.
#[derive(Debug, Clone)]
pub struct TraceContextLayer {
    label: Arc<str>,
}

impl<S> Layer<S> for TraceContextLayer {
    type Service = TraceContextService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TraceContextService {
            inner,
            label: self.label.clone(),
        }
    }
}

/// Service produced by [`TraceContextLayer`].
#[derive(Debug, Clone)]
pub struct TraceContextService<S> {
    inner: S,
    label: Arc<str>,
}

impl<S> Service<Request<Body>> for TraceContextService<S>
where
    S: Service<Request<Body>, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let span = RequestSpan::derive(req.headers(), &self.label);
        req.extensions_mut().insert(span.context().clone());

        let future = self.inner.call(req);
        Box::pin(async move {
            let response = future.await;
            // The span guard lives until here; an unwind inside the inner
            // future still ends it via Drop.
            span.end();
            response
        })
    }
}

impl<S> FromRequestParts<S> for TraceContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<TraceContext>()
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_rejects_empty_project_id() {
        assert!(matches!(
            initialize("app", ""),
            Err(ConfigError::MissingProjectId)
        ));
    }

    #[test]
    fn test_initialize_rejects_empty_label() {
        assert!(matches!(
            initialize("", "proj1"),
            Err(ConfigError::MissingLabel)
        ));
    }

    #[test]
    fn test_initialize_accepts_valid_arguments() {
        assert!(initialize("app", "proj1").is_ok());
    }
}
