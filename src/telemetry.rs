use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::lifecycle::Phase;

/// Initialize structured JSON logging.
/// The filter comes from `RUST_LOG` with `info` as the default level.
pub fn init_telemetry() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true),
        )
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init()?;

    tracing::info!("Service manager telemetry initialized with structured logging");
    Ok(())
}

/// Generate a correlation ID for linking the logs of one phase
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create the span a manager phase runs in
pub fn create_phase_span(phase: Phase, service_count: usize, correlation_id: &str) -> tracing::Span {
    tracing::info_span!(
        "service_manager_phase",
        phase = phase.name(),
        services = service_count,
        correlation.id = correlation_id,
        otel.kind = "internal"
    )
}

/// Shutdown telemetry gracefully
pub fn shutdown_telemetry() {
    // For structured logging, no explicit shutdown needed
    tracing::info!("Service manager telemetry shutdown complete");
}
