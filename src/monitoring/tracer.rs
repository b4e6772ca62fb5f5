/*!
 * Tracing
 * Subscriber setup and spans for long-running mount operations
 */

use std::time::{Duration, Instant};

use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use uuid::Uuid;

/// Operations slower than this are reported at warn level
const SLOW_OPERATION: Duration = Duration::from_millis(500);

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - VFS_TRACE_JSON: Enable JSON output (default: false)
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("VFS_TRACE_JSON")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .init();
        info!("tracing initialized with JSON output");
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_names(true)
                    .compact(),
            )
            .init();
        debug!("tracing initialized");
    }
}

/// Span around one mount operation, reporting its duration on drop
pub struct OperationSpan {
    span: tracing::Span,
    start: Instant,
    trace_id: String,
}

impl OperationSpan {
    pub fn new(operation: &'static str, path: &impl std::fmt::Display) -> Self {
        let trace_id = Uuid::new_v4().to_string();
        let span = span!(
            Level::DEBUG,
            "vfs_operation",
            trace_id = %trace_id,
            operation,
            path = %path,
            duration_ms = tracing::field::Empty,
            items = tracing::field::Empty,
            error = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            trace_id,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn record_items(&self, count: usize) {
        self.span.record("items", count);
    }

    pub fn record_error(&self, error: &dyn std::fmt::Display) {
        self.span.record("error", tracing::field::display(error));
    }

    /// Pass a result through, recording its error on the span
    pub fn observe<T, E: std::fmt::Display>(&self, result: Result<T, E>) -> Result<T, E> {
        if let Err(e) = &result {
            self.record_error(e);
            debug!(trace_id = %self.trace_id, error = %e, "operation failed");
        }
        result
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for OperationSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();
        self.span.record("duration_ms", duration.as_millis() as u64);

        if duration > SLOW_OPERATION {
            warn!(
                trace_id = %self.trace_id,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow operation"
            );
        } else {
            debug!(
                trace_id = %self.trace_id,
                duration_us = duration.as_micros() as u64,
                "operation completed"
            );
        }
    }
}

/// Start an operation span
pub fn span_operation(operation: &'static str, path: &impl std::fmt::Display) -> OperationSpan {
    OperationSpan::new(operation, path)
}
