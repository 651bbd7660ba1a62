use serde::Deserialize;

use crate::Config;
use crate::shared::{
    DeliveryConfig, ExtractionConfig, MetricsConfig, PgConnectionConfig, PublisherConfig,
    ReplicationConfig, SentryConfig, ValidationError,
};

/// Complete configuration of the listener service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListenerConfig {
    /// Postgres server holding the replication slot.
    pub pg_connection: PgConnectionConfig,
    /// Replication slot and `wal2json` plugin options.
    pub replication: ReplicationConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    /// Broker receiving the extracted events.
    pub publisher: PublisherConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// Optional Sentry integration, disabled when absent.
    #[serde(default)]
    pub sentry: Option<SentryConfig>,
}

impl ListenerConfig {
    /// Rejects configurations the listener cannot start with.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.replication.slot_name.trim().is_empty() {
            return Err(ValidationError::MissingSlotName);
        }

        if let PublisherConfig::Kafka { brokers, .. } = &self.publisher
            && brokers.iter().all(|broker| broker.trim().is_empty())
        {
            return Err(ValidationError::MissingKafkaBrokers);
        }

        if self.extraction.topic_column == self.extraction.payload_column {
            return Err(ValidationError::SameTopicAndPayloadColumn(
                self.extraction.topic_column.clone(),
            ));
        }

        Ok(())
    }
}

impl Config for ListenerConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &["publisher.kafka.brokers"];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::DEFAULT_START_LSN;

    fn parse(json: &str) -> ListenerConfig {
        serde_json::from_str(json).unwrap()
    }

    const MINIMAL: &str = r#"{
        "pg_connection": { "host": "localhost", "port": 5432, "name": "postgres", "username": "postgres" },
        "replication": { "slot_name": "pg_listener" },
        "publisher": { "kafka": { "brokers": ["localhost:9092"] } }
    }"#;

    #[test]
    fn defaults_are_applied() {
        let config = parse(MINIMAL);

        assert!(config.validate().is_ok());
        assert_eq!(config.replication.start_lsn(), DEFAULT_START_LSN);
        assert_eq!(config.extraction.topic_column, "topic");
        assert_eq!(config.extraction.payload_column, "payload");
        assert_eq!(config.delivery.retry_delay_ms, 3_000);
        assert_eq!(config.metrics.port, 9938);
        assert!(config.metrics.enabled);
        assert!(config.sentry.is_none());
        assert!(config.pg_connection.password.is_none());

        let PublisherConfig::Kafka {
            brokers,
            topic_suffix,
            message_timeout_ms,
        } = config.publisher
        else {
            panic!("expected a kafka publisher");
        };
        assert_eq!(brokers, vec!["localhost:9092".to_string()]);
        assert_eq!(topic_suffix, None);
        assert_eq!(message_timeout_ms, 30_000);
    }

    #[test]
    fn empty_start_lsn_falls_back_to_the_beginning() {
        let mut config = parse(MINIMAL);
        config.replication.start_lsn = Some(String::new());
        assert_eq!(config.replication.start_lsn(), DEFAULT_START_LSN);

        config.replication.start_lsn = Some("16/B374D848".to_string());
        assert_eq!(config.replication.start_lsn(), "16/B374D848");
    }

    #[test]
    fn empty_slot_name_is_rejected() {
        let mut config = parse(MINIMAL);
        config.replication.slot_name = "  ".to_string();

        assert_eq!(config.validate(), Err(ValidationError::MissingSlotName));
    }

    #[test]
    fn kafka_without_brokers_is_rejected() {
        let mut config = parse(MINIMAL);
        config.publisher = PublisherConfig::Kafka {
            brokers: vec![],
            topic_suffix: None,
            message_timeout_ms: 1_000,
        };

        assert_eq!(config.validate(), Err(ValidationError::MissingKafkaBrokers));
    }

    #[test]
    fn memory_publisher_needs_no_brokers() {
        let mut config = parse(MINIMAL);
        config.publisher = PublisherConfig::Memory;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn identical_topic_and_payload_columns_are_rejected() {
        let mut config = parse(MINIMAL);
        config.extraction.payload_column = "topic".to_string();

        assert_eq!(
            config.validate(),
            Err(ValidationError::SameTopicAndPayloadColumn("topic".to_string()))
        );
    }
}
