use std::sync::Arc;

use listener_config::Environment;
use listener_config::shared::ListenerConfig;
use listener_telemetry::init_tracing;
use tracing::{error, info};

use crate::config::load_listener_config;
use crate::core::start_listener_with_config;

mod config;
mod core;

fn main() -> anyhow::Result<()> {
    let listener_config = load_listener_config()?;

    // Every log line carries the slot name to tell listeners apart.
    let slot_name = listener_config.replication.slot_name.clone();
    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME"), Some(slot_name))?;

    // Sentry must be initialized before the runtime starts.
    let _sentry_guard = init_sentry(&listener_config)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(listener_config))?;

    Ok(())
}

async fn async_main(listener_config: ListenerConfig) -> anyhow::Result<()> {
    if let Err(err) = start_listener_with_config(listener_config).await {
        let report: &(dyn std::error::Error + Send + Sync) = err.as_ref();
        sentry::capture_error(report);
        error!("an error occurred in the listener: {err:#}");

        return Err(err);
    }

    Ok(())
}

/// Initializes Sentry when a DSN is configured.
///
/// Events are tagged with the `listener` service and the replication slot, and panics are
/// captured.
fn init_sentry(config: &ListenerConfig) -> anyhow::Result<Option<sentry::ClientInitGuard>> {
    let Some(sentry_config) = &config.sentry else {
        info!("sentry not configured for listener, skipping initialization");

        return Ok(None);
    };

    info!("initializing sentry with supplied dsn");

    let environment = Environment::load()?;
    let guard = sentry::init(sentry::ClientOptions {
        dsn: Some(sentry_config.dsn.parse()?),
        environment: Some(environment.to_string().into()),
        integrations: vec![Arc::new(
            sentry::integrations::panic::PanicIntegration::new(),
        )],
        ..Default::default()
    });

    let slot_name = config.replication.slot_name.clone();
    sentry::configure_scope(|scope| {
        scope.set_tag("service", "listener");
        scope.set_tag("slot", slot_name);
    });

    Ok(Some(guard))
}
