use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The replication slot name is empty.
    #[error("`replication.slot_name` must be set")]
    MissingSlotName,
    /// The Kafka publisher has no brokers to connect to.
    #[error("`publisher.kafka.brokers` must contain at least one broker")]
    MissingKafkaBrokers,
    /// The topic and payload columns point at the same column.
    #[error("`extraction.topic_column` and `extraction.payload_column` must differ, both are `{0}`")]
    SameTopicAndPayloadColumn(String),
}
