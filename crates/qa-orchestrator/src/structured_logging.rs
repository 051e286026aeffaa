//! A thin run-scoped `tracing` span, standing in for the teacher's much
//! larger `legacy-resilience::structured_logging` (JSON sink, log rotation,
//! correlation-id propagation across services). A single in-process request
//! processor has no services to correlate across, so only the one thing
//! every component downstream already assumes — a `run_id` carried on every
//! event for the duration of one `answer()` call — is kept (see DESIGN.md).

use tracing::Span;
use uuid::Uuid;

/// Opens the span every `answer()` call runs inside of. Every `info!`/
/// `debug!`/`warn!`/`error!` emitted by `qa-nlp`, `qa-planner`,
/// `qa-resource`, `qa-executor`, `qa-confidence`, and `qa-synthesis` during
/// the call is nested under it, so log aggregation can group one run's
/// events by `run_id` alone.
pub fn run_span(run_id: &str, question: &str) -> Span {
    tracing::info_span!("qa_run", run_id = %run_id, question = %question)
}

pub fn new_run_id() -> String {
    Uuid::new_v4().to_string()
}

/// Initializes a process-wide `tracing` subscriber from `RUST_LOG`
/// (default `info`), matching the teacher's `tracing_subscriber::fmt`
/// bootstrap. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
