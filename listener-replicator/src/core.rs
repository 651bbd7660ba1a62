use std::time::Duration;

use listener::listener::Listener;
use listener::publisher::base::EventPublisher;
use listener::publisher::kafka::KafkaPublisher;
use listener::publisher::memory::MemoryPublisher;
use listener_config::shared::{
    DeliveryConfig, ExtractionConfig, ListenerConfig, MetricsConfig, PgConnectionConfig,
    PublisherConfig, ReplicationConfig,
};
use listener_telemetry::init_metrics;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, info, warn};

/// Upper bound on the time spent delivering queued Kafka messages on exit.
const KAFKA_FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// Starts the listener service with the provided configuration.
///
/// Installs the metrics exporter when enabled, builds the configured publisher and runs the
/// listener until it fails or a termination signal is received.
pub async fn start_listener_with_config(listener_config: ListenerConfig) -> anyhow::Result<()> {
    info!("starting listener service");

    log_config(&listener_config);

    if listener_config.metrics.enabled {
        init_metrics(
            listener_config.metrics.port,
            Some(&listener_config.replication.slot_name),
        )?;
    }

    // Static dispatch over the publishers, one arm each.
    match listener_config.publisher.clone() {
        PublisherConfig::Memory => {
            let listener = Listener::new(listener_config, MemoryPublisher::new());
            start_listener(listener).await?;
        }
        PublisherConfig::Kafka {
            brokers,
            topic_suffix,
            message_timeout_ms,
        } => {
            let publisher = KafkaPublisher::new(&brokers, topic_suffix, message_timeout_ms)?;

            let listener = Listener::new(listener_config, publisher.clone());
            let result = start_listener(listener).await;

            if let Err(err) = publisher.flush(KAFKA_FLUSH_TIMEOUT) {
                warn!(error = %err, "failed to flush kafka producer");
            }
            result?;
        }
    }

    info!("listener service stopped");

    Ok(())
}

fn log_config(config: &ListenerConfig) {
    log_pg_connection_config(&config.pg_connection);
    log_replication_config(&config.replication);
    log_extraction_config(&config.extraction);
    log_delivery_config(&config.delivery);
    log_publisher_config(&config.publisher);
    log_metrics_config(&config.metrics);
}

fn log_pg_connection_config(config: &PgConnectionConfig) {
    debug!(
        host = config.host,
        port = config.port,
        dbname = config.name,
        username = config.username,
        "source postgres connection config",
    );
}

fn log_replication_config(config: &ReplicationConfig) {
    debug!(
        slot_name = config.slot_name,
        start_lsn = config.start_lsn(),
        table_names = config.table_names.as_deref(),
        write_in_chunks = config.write_in_chunks,
        "replication config"
    );
}

fn log_extraction_config(config: &ExtractionConfig) {
    debug!(
        topic_column = config.topic_column,
        payload_column = config.payload_column,
        "extraction config"
    );
}

fn log_delivery_config(config: &DeliveryConfig) {
    debug!(retry_delay_ms = config.retry_delay_ms, "delivery config");
}

fn log_publisher_config(config: &PublisherConfig) {
    match config {
        PublisherConfig::Memory => {
            debug!("using memory publisher config");
        }
        PublisherConfig::Kafka {
            brokers,
            topic_suffix,
            message_timeout_ms,
        } => {
            debug!(
                brokers = brokers.join(","),
                topic_suffix = topic_suffix.as_deref(),
                message_timeout_ms,
                "using kafka publisher config"
            )
        }
    }
}

fn log_metrics_config(config: &MetricsConfig) {
    debug!(
        enabled = config.enabled,
        port = config.port,
        "metrics config"
    );
}

/// Runs a listener and triggers its graceful shutdown on SIGTERM or SIGINT.
#[tracing::instrument(skip(listener))]
async fn start_listener<P>(mut listener: Listener<P>) -> anyhow::Result<()>
where
    P: EventPublisher + Clone,
{
    // SIGTERM is what process supervisors send before killing the process.
    let mut sigterm = signal(SignalKind::terminate())?;

    let shutdown_tx = listener.shutdown_tx();
    let shutdown_handle = tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("SIGINT (Ctrl+C) received, shutting down listener");
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down listener");
            }
        }

        if let Err(e) = shutdown_tx.shutdown() {
            warn!("failed to send shutdown signal: {:?}", e);
        }
    });

    let result = listener.run().await;

    // The listener may have stopped on its own, the signal task is not needed anymore.
    shutdown_handle.abort();
    let _ = shutdown_handle.await;

    result?;

    Ok(())
}
