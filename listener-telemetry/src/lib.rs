//! Telemetry for the listener: structured logging through `tracing` and a Prometheus exporter.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;
