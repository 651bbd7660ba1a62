//! Helpers for testing the listener without a Postgres server or a broker.

use listener_config::shared::{
    DeliveryConfig, ExtractionConfig, ListenerConfig, MetricsConfig, PgConnectionConfig,
    PublisherConfig, ReplicationConfig,
};

pub mod publisher;
pub mod source;

/// Configuration of a listener using the memory publisher and the given retry delay.
pub fn test_listener_config(retry_delay_ms: u64) -> ListenerConfig {
    ListenerConfig {
        pg_connection: PgConnectionConfig {
            host: "localhost".to_owned(),
            port: 5432,
            name: "postgres".to_owned(),
            username: "postgres".to_owned(),
            password: None,
        },
        replication: ReplicationConfig {
            slot_name: "test_slot".to_owned(),
            start_lsn: None,
            table_names: None,
            write_in_chunks: None,
        },
        extraction: ExtractionConfig::default(),
        delivery: DeliveryConfig { retry_delay_ms },
        publisher: PublisherConfig::Memory,
        metrics: MetricsConfig {
            enabled: false,
            ..MetricsConfig::default()
        },
        sentry: None,
    }
}
