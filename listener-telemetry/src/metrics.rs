use std::net::{Ipv4Addr, SocketAddr};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use tracing::info;

/// Installs the global Prometheus recorder and serves `/metrics` on `0.0.0.0:{port}`.
///
/// Must be called from within a Tokio runtime since the HTTP listener is spawned on it. Calling it
/// twice fails because only one global recorder can be installed.
pub fn init_metrics(port: u16, slot_name: Option<&str>) -> Result<(), BuildError> {
    let address = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let mut builder = PrometheusBuilder::new().with_http_listener(address);

    if let Some(slot_name) = slot_name {
        builder = builder.add_global_label("slot", slot_name);
    }

    builder.install()?;

    info!(%address, "prometheus exporter listening");

    Ok(())
}
