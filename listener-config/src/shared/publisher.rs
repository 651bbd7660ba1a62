use serde::Deserialize;

const DEFAULT_MESSAGE_TIMEOUT_MS: u64 = 30_000;

/// The broker which receives the extracted events.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublisherConfig {
    /// Keeps published events in memory, useful for local runs.
    Memory,
    /// Publishes every event to Kafka and waits for the broker acknowledgment.
    Kafka {
        /// `host:port` addresses used to bootstrap the producer.
        brokers: Vec<String>,
        /// Suffix appended to every topic, e.g. `-staging`.
        #[serde(default)]
        topic_suffix: Option<String>,
        /// How long a single publish may wait for its delivery report.
        #[serde(default = "default_message_timeout_ms")]
        message_timeout_ms: u64,
    },
}

fn default_message_timeout_ms() -> u64 {
    DEFAULT_MESSAGE_TIMEOUT_MS
}
