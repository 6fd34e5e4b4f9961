/*!
 * Structured Tracing
 * Subscriber setup and timed spans for pool operations
 */

use crate::core::limits::SLOW_OPERATION_US;
use std::time::Instant;
use tracing::{debug, info, span, warn, Level, Span};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - POOL_TRACE_JSON: Enable JSON output (default: false)
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("POOL_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
    };

    if installed.is_ok() {
        info!(json = use_json, "structured tracing initialized");
    }
}

/// Timed span around one pool operation
///
/// Logs the duration on drop, at warn level when the operation was slow.
pub struct OperationSpan {
    span: Span,
    start: Instant,
    operation: &'static str,
}

impl OperationSpan {
    pub fn new(operation: &'static str) -> Self {
        let span = span!(
            Level::DEBUG,
            "pool_op",
            operation,
            pool = tracing::field::Empty,
            duration_us = tracing::field::Empty,
            result = tracing::field::Empty,
        );
        Self {
            span,
            start: Instant::now(),
            operation,
        }
    }

    /// Attach the pool the operation targets
    pub fn with_pool(self, pool: impl std::fmt::Display) -> Self {
        self.span.record("pool", tracing::field::display(pool));
        self
    }

    /// Record the outcome of the operation
    pub fn record_result<T, E: std::fmt::Display>(&self, result: &Result<T, E>) {
        match result {
            Ok(_) => self.span.record("result", "ok"),
            Err(e) => self.span.record("result", tracing::field::display(e)),
        };
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for OperationSpan {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed().as_micros();
        self.span.record("duration_us", elapsed as u64);
        let _entered = self.span.enter();

        if elapsed > SLOW_OPERATION_US {
            warn!(
                operation = self.operation,
                duration_us = elapsed as u64,
                slow = true,
                "slow pool operation"
            );
        } else {
            debug!(
                operation = self.operation,
                duration_us = elapsed as u64,
                "pool operation completed"
            );
        }
    }
}

/// Start a timed span for a pool operation
pub fn span_operation(operation: &'static str) -> OperationSpan {
    OperationSpan::new(operation)
}
